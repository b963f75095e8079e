//! Input telemetry and irregular-run detection.
//!
//! A [`SessionRecorder`] is fed every tracked interaction with the grid.
//! When the grid is complete, and again right before submission, the
//! recorder's [`SessionSummary`] goes through the single shared
//! [`evaluate`] rule set.

pub mod classifier;
pub mod recorder;

pub use classifier::{evaluate, IrregularReason, Verdict};
pub use recorder::{InputEvent, InputKind, SessionRecorder, SessionSummary};

use crate::clock::Clock;

/// Close out a recorder and classify it in one step
pub fn assess<C: Clock>(recorder: &SessionRecorder<C>) -> (SessionSummary, Verdict) {
    let summary = recorder.finish();
    let verdict = evaluate(&summary, summary.grid.total_cells());
    (summary, verdict)
}
