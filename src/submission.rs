use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use strum_macros::Display;

use crate::anticheat::SessionSummary;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::game::{Game, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Display)]
pub enum Category {
    #[default]
    Primary,
    Secondary,
    NoSchool,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Primary, Category::Secondary, Category::NoSchool];

    /// Label shown in the form
    pub fn form_label(self) -> &'static str {
        match self {
            Category::Primary => "Primary School",
            Category::Secondary => "Secondary School",
            Category::NoSchool => "No School",
        }
    }

    /// Label shown in leaderboards
    pub fn short_label(self) -> &'static str {
        match self {
            Category::NoSchool => "No School",
            Category::Primary => "Primary",
            Category::Secondary => "Secondary",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Category::Primary => Category::Secondary,
            Category::Secondary => Category::NoSchool,
            Category::NoSchool => Category::Primary,
        }
    }

    pub fn order(self) -> usize {
        self as usize
    }

    /// Parse the identifiers used in source file names and config
    pub fn from_id(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "primary" => Some(Category::Primary),
            "secondary" => Some(Category::Secondary),
            "noschool" => Some(Category::NoSchool),
            _ => None,
        }
    }
}

/// Player details collected after an accepted run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub name: String,
    pub school: String,
    pub email: String,
    pub category: Category,
}

impl SubmissionForm {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        Ok(())
    }
}

/// Row sent to the external collector. The `ac_*` names are fixed by the
/// collector and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub school: String,
    pub email: String,
    pub category: String,
    pub grid: String,
    pub time: String,
    pub submitted_at: String,
    pub ac_moves: String,
    pub ac_trusted: String,
    pub ac_untrusted: String,
    #[serde(rename = "ac_avgDeltaMs")]
    pub ac_avg_delta_ms: String,
    #[serde(rename = "ac_stdDeltaMs")]
    pub ac_std_delta_ms: String,
    pub ac_paste: String,
    #[serde(rename = "ac_vkPresses")]
    pub ac_vk_presses: String,
    #[serde(rename = "ac_durationMs")]
    pub ac_duration_ms: String,
}

impl SubmissionPayload {
    pub fn new(
        form: &SubmissionForm,
        summary: &SessionSummary,
        elapsed_ms: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: form.name.trim().to_string(),
            school: form.school.trim().to_string(),
            email: form.email.trim().to_string(),
            category: form.category.to_string(),
            grid: summary.grid.id(),
            time: crate::util::format_time(elapsed_ms),
            submitted_at: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ac_moves: summary.move_count.to_string(),
            ac_trusted: summary.trusted_count.to_string(),
            ac_untrusted: summary.untrusted_count.to_string(),
            ac_avg_delta_ms: summary.avg_delta_ms.to_string(),
            ac_std_delta_ms: summary.std_delta_ms.to_string(),
            ac_paste: if summary.paste_occurred { "1" } else { "0" }.to_string(),
            ac_vk_presses: summary.virtual_key_press_count.to_string(),
            ac_duration_ms: summary.duration_ms.to_string(),
        }
    }

    /// Ordered `(field, value)` pairs as the collector receives them
    pub fn to_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", &self.name),
            ("school", &self.school),
            ("email", &self.email),
            ("category", &self.category),
            ("grid", &self.grid),
            ("time", &self.time),
            ("submitted_at", &self.submitted_at),
            ("ac_moves", &self.ac_moves),
            ("ac_trusted", &self.ac_trusted),
            ("ac_untrusted", &self.ac_untrusted),
            ("ac_avgDeltaMs", &self.ac_avg_delta_ms),
            ("ac_stdDeltaMs", &self.ac_std_delta_ms),
            ("ac_paste", &self.ac_paste),
            ("ac_vkPresses", &self.ac_vk_presses),
            ("ac_durationMs", &self.ac_duration_ms),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.as_str()))
        .collect()
    }
}

/// Validate the form, re-check the run and build the payload.
///
/// The run is classified again here and that verdict wins over the one
/// taken at completion.
pub fn prepare_submission<C: Clock + Clone>(
    game: &Game<C>,
    form: &SubmissionForm,
    now: DateTime<Utc>,
) -> Result<SubmissionPayload> {
    if !matches!(game.state(), GameState::Accepted { .. }) {
        return Err(Error::NotComplete);
    }
    form.validate()?;

    let (summary, verdict) = game.submission_check();
    if verdict.suspicious {
        tracing::warn!(reasons = ?verdict.reasons, "submission blocked");
        return Err(Error::IrregularRun);
    }

    Ok(SubmissionPayload::new(form, &summary, game.elapsed_ms(), now))
}

/// Destination for accepted submissions
pub trait SubmissionSink {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<()>;
}

/// Appends submissions to a local CSV file
#[derive(Debug, Clone)]
pub struct CsvOutbox {
    path: PathBuf,
}

impl CsvOutbox {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all(&self) -> Result<Vec<SubmissionPayload>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<SubmissionPayload>, _>>()?;
        Ok(rows)
    }
}

impl SubmissionSink for CsvOutbox {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // header only on a fresh file
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(payload)?;
        writer.flush()?;

        tracing::info!(path = %self.path.display(), grid = %payload.grid, time = %payload.time, "submission stored");
        Ok(())
    }
}

/// Collects submissions in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub submitted: Vec<SubmissionPayload>,
}

impl SubmissionSink for MemorySink {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<()> {
        self.submitted.push(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::game::{GameInput, Progress};
    use crate::grid::GridPreset;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tempfile::tempdir;

    fn summary() -> SessionSummary {
        SessionSummary {
            grid: GridPreset::FiveByFive,
            duration_ms: 5_000,
            move_count: 25,
            trusted_count: 25,
            untrusted_count: 0,
            avg_delta_ms: 200,
            std_delta_ms: 0,
            paste_occurred: true,
            virtual_key_press_count: 3,
        }
    }

    fn form() -> SubmissionForm {
        SubmissionForm {
            name: " Ada ".into(),
            school: "Hilltop".into(),
            email: String::new(),
            category: Category::Primary,
        }
    }

    #[test]
    fn payload_fields_are_decimal_strings() {
        let payload = SubmissionPayload::new(&form(), &summary(), 4_870, DateTime::<Utc>::UNIX_EPOCH);
        let fields = payload.to_fields();

        let get = |k: &str| fields.iter().find(|(n, _)| *n == k).map(|(_, v)| *v);
        assert_eq!(get("name"), Some("Ada"));
        assert_eq!(get("grid"), Some("5x5"));
        assert_eq!(get("time"), Some("00:04.87"));
        assert_eq!(get("ac_moves"), Some("25"));
        assert_eq!(get("ac_trusted"), Some("25"));
        assert_eq!(get("ac_untrusted"), Some("0"));
        assert_eq!(get("ac_avgDeltaMs"), Some("200"));
        assert_eq!(get("ac_stdDeltaMs"), Some("0"));
        assert_eq!(get("ac_paste"), Some("1"));
        assert_eq!(get("ac_vkPresses"), Some("3"));
        assert_eq!(get("ac_durationMs"), Some("5000"));
    }

    #[test]
    fn payload_serializes_collector_names() {
        let payload = SubmissionPayload::new(&form(), &summary(), 4_870, DateTime::<Utc>::UNIX_EPOCH);
        let json = serde_json::to_value(&payload).unwrap();
        for key in [
            "ac_moves",
            "ac_trusted",
            "ac_untrusted",
            "ac_avgDeltaMs",
            "ac_stdDeltaMs",
            "ac_paste",
            "ac_vkPresses",
            "ac_durationMs",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["ac_paste"], "1");
    }

    #[test]
    fn name_is_required() {
        let mut f = form();
        f.name = "   ".into();
        assert_matches!(f.validate(), Err(Error::MissingField("name")));
    }

    #[test]
    fn outbox_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let mut outbox = CsvOutbox::new(dir.path().join("nested").join("outbox.csv"));
        let payload = SubmissionPayload::new(&form(), &summary(), 4_870, DateTime::<Utc>::UNIX_EPOCH);

        outbox.submit(&payload).unwrap();
        outbox.submit(&payload).unwrap();

        let contents = std::fs::read_to_string(outbox.path()).unwrap();
        assert_eq!(contents.matches("ac_avgDeltaMs").count(), 1);
        let rows = outbox.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], payload);
    }

    #[test]
    fn category_ids_and_labels() {
        assert_eq!(Category::from_id("NoSchool"), Some(Category::NoSchool));
        assert_eq!(Category::from_id("no school"), Some(Category::NoSchool));
        assert_eq!(Category::from_id("primary"), Some(Category::Primary));
        assert_eq!(Category::from_id("college"), None);
        assert_eq!(Category::NoSchool.to_string(), "NoSchool");
        assert_eq!(Category::Secondary.form_label(), "Secondary School");
        assert_eq!(Category::NoSchool.next(), Category::Primary);
    }

    fn solved_game(step_ms: u64) -> (Game<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let mut game = Game::with_clock(GridPreset::FiveByFive, clock.clone());
        let mut last = Progress::Continue;
        for r in 1..=5usize {
            for c in 1..=5usize {
                for d in (r * c).to_string().chars() {
                    clock.advance_ms(step_ms);
                    last = game.handle(GameInput::Digit(d), true);
                }
                if !(r == 5 && c == 5) {
                    clock.advance_ms(step_ms);
                    game.handle(GameInput::Enter, true);
                }
            }
        }
        assert_matches!(last, Progress::Accepted(_));
        (game, clock)
    }

    #[test]
    fn accepted_run_builds_payload() {
        let (game, clock) = solved_game(150);
        let payload = prepare_submission(&game, &form(), clock.wall()).unwrap();

        assert_eq!(payload.name, "Ada");
        assert_eq!(payload.ac_untrusted, "0");
    }

    #[test]
    fn submit_time_verdict_overrides_completion() {
        let (game, clock) = solved_game(150);
        clock.set_wall_back(Duration::from_secs(3_600));

        assert_matches!(
            prepare_submission(&game, &form(), clock.wall()),
            Err(Error::IrregularRun)
        );
    }

    #[test]
    fn unfinished_game_cannot_submit() {
        let clock = ManualClock::default();
        let mut game = Game::with_clock(GridPreset::FiveByFive, clock.clone());
        clock.advance_ms(200);
        game.handle(GameInput::Digit('1'), true);

        assert_matches!(
            prepare_submission(&game, &form(), clock.wall()),
            Err(Error::NotComplete)
        );
    }
}
