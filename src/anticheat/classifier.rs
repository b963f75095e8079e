use serde::Serialize;
use strum_macros::Display;

use super::recorder::SessionSummary;

/// Minimum number of recorded moves regardless of grid size
pub const MIN_MOVES_FLOOR: u32 = 5;
/// Minimum recorded moves as a fraction of the grid's cells, as `NUM / DEN`
const MIN_MOVES_NUM: u64 = 2;
const MIN_MOVES_DEN: u64 = 5;
/// Minimum plausible dwell time per cell
pub const MIN_MS_PER_CELL: u64 = 8;
/// Minimum session length regardless of grid size
pub const MIN_DURATION_FLOOR_MS: u64 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum IrregularReason {
    #[strum(serialize = "untrusted input")]
    UntrustedInput,
    #[strum(serialize = "too few moves")]
    TooFewMoves,
    #[strum(serialize = "completed too fast")]
    TooFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub suspicious: bool,
    pub reasons: Vec<IrregularReason>,
}

/// `max(5, floor(cells * 0.4))`
pub fn min_moves(total_cells: u32) -> u32 {
    let scaled = (total_cells as u64 * MIN_MOVES_NUM / MIN_MOVES_DEN) as u32;
    scaled.max(MIN_MOVES_FLOOR)
}

/// `max(cells * 8ms, 2500ms)`
pub fn min_duration_ms(total_cells: u32) -> u64 {
    (total_cells as u64 * MIN_MS_PER_CELL).max(MIN_DURATION_FLOOR_MS)
}

/// Decide whether a finished session may be submitted.
///
/// Paste attempts and keypad usage are carried in the summary for audit but
/// do not affect the verdict.
pub fn evaluate(summary: &SessionSummary, total_cells: u32) -> Verdict {
    let mut reasons = Vec::new();

    if summary.untrusted_count > 0 {
        reasons.push(IrregularReason::UntrustedInput);
    }
    if summary.move_count < min_moves(total_cells) {
        reasons.push(IrregularReason::TooFewMoves);
    }
    if summary.duration_ms < min_duration_ms(total_cells) {
        reasons.push(IrregularReason::TooFast);
    }

    Verdict {
        suspicious: !reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPreset;

    fn summary(moves: u32, untrusted: u32, duration_ms: u64) -> SessionSummary {
        SessionSummary {
            grid: GridPreset::FiveByFive,
            duration_ms,
            move_count: moves,
            trusted_count: moves - untrusted,
            untrusted_count: untrusted,
            avg_delta_ms: 200,
            std_delta_ms: 0,
            paste_occurred: false,
            virtual_key_press_count: 0,
        }
    }

    #[test]
    fn thresholds_match_policy() {
        assert_eq!(min_moves(25), 10);
        assert_eq!(min_moves(60), 24);
        assert_eq!(min_moves(144), 57);
        assert_eq!(min_moves(225), 90);
        assert_eq!(min_moves(4), 5);
        assert_eq!(min_moves(12), 5);

        assert_eq!(min_duration_ms(25), 2_500);
        assert_eq!(min_duration_ms(144), 2_500);
        assert_eq!(min_duration_ms(225), 2_500);
        assert_eq!(min_duration_ms(400), 3_200);
    }

    #[test]
    fn clean_run_passes() {
        let verdict = evaluate(&summary(25, 0, 5_000), 25);
        assert!(!verdict.suspicious);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn single_untrusted_event_is_enough() {
        let verdict = evaluate(&summary(200, 1, 120_000), 25);
        assert!(verdict.suspicious);
        assert_eq!(verdict.reasons, vec![IrregularReason::UntrustedInput]);
    }

    #[test]
    fn too_few_moves_boundary() {
        assert!(evaluate(&summary(9, 0, 5_000), 25).suspicious);
        assert!(!evaluate(&summary(10, 0, 5_000), 25).suspicious);
    }

    #[test]
    fn too_fast_boundary() {
        assert!(evaluate(&summary(25, 0, 2_499), 25).suspicious);
        assert!(!evaluate(&summary(25, 0, 2_500), 25).suspicious);
    }

    #[test]
    fn bulk_assignment_fails_every_rule() {
        let verdict = evaluate(&summary(1, 1, 50), 25);
        assert!(verdict.suspicious);
        assert_eq!(
            verdict.reasons,
            vec![
                IrregularReason::UntrustedInput,
                IrregularReason::TooFewMoves,
                IrregularReason::TooFast
            ]
        );
    }

    #[test]
    fn paste_alone_does_not_gate() {
        let mut s = summary(25, 0, 5_000);
        s.paste_occurred = true;
        s.virtual_key_press_count = 25;
        assert!(!evaluate(&s, 25).suspicious);
    }

    #[test]
    fn evaluation_is_pure() {
        let s = summary(12, 0, 2_600);
        assert_eq!(evaluate(&s, 25), evaluate(&s, 25));
    }

    #[test]
    fn reason_labels() {
        assert_eq!(IrregularReason::TooFast.to_string(), "completed too fast");
        assert_eq!(
            IrregularReason::UntrustedInput.to_string(),
            "untrusted input"
        );
    }
}
