/// Format elapsed milliseconds as `mm:ss.cc`
pub fn format_time(milliseconds: u64) -> String {
    let minutes = milliseconds / 60_000;
    let seconds = (milliseconds % 60_000) / 1_000;
    let centis = (milliseconds % 1_000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

/// Parse `m:ss`, `mm:ss.c`, `mm:ss.cc` or `mm:ss.mmm` back to milliseconds.
///
/// One or two fraction digits are hundredths (as written by [`format_time`]),
/// three digits are milliseconds.
pub fn parse_time(s: &str) -> Option<u64> {
    let s = s.trim();
    let (minutes, rest) = s.split_once(':')?;
    let (seconds, fraction) = match rest.split_once('.') {
        Some((sec, frac)) => (sec, Some(frac)),
        None => (rest, None),
    };

    if !(1..=2).contains(&minutes.len()) || seconds.len() != 2 {
        return None;
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes) || !all_digits(seconds) {
        return None;
    }

    let frac_ms = match fraction {
        None => 0,
        Some(f) if (1..=3).contains(&f.len()) && all_digits(f) => {
            let value: u64 = f.parse().ok()?;
            if f.len() == 3 {
                value
            } else {
                value * 10
            }
        }
        Some(_) => return None,
    };

    let mm: u64 = minutes.parse().ok()?;
    let ss: u64 = seconds.parse().ok()?;
    Some(mm * 60_000 + ss * 1_000 + frac_ms)
}

/// Whether a string looks like a leaderboard time (`m:ss` with optional fraction)
pub fn is_time(s: &str) -> bool {
    parse_time(s).is_some()
}

/// Whether a string looks like an email address
pub fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !local.chars().any(char::is_whitespace)
                && !domain.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
