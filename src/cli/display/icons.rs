//! Status icons for CLI output

use crate::domain::ValidationOutcome;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (artifact accepted)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon (artifact skipped)
    pub const WARNING: &'static str = "⚠";

    /// Error icon (artifact rejected)
    pub const ERROR: &'static str = "✗";

    /// Sleep hint icon
    pub const PENDING: &'static str = "⏳";

    pub fn get_outcome_icon(outcome: &ValidationOutcome) -> &'static str {
        match outcome {
            ValidationOutcome::Passed { .. } => Self::SUCCESS,
            ValidationOutcome::Skipped { .. } => Self::WARNING,
            ValidationOutcome::Failed { .. } => Self::ERROR,
        }
    }

    pub fn get_status_text(outcome: &ValidationOutcome) -> &'static str {
        match outcome {
            ValidationOutcome::Passed { .. } => "Valid",
            ValidationOutcome::Skipped { .. } => "Skipped",
            ValidationOutcome::Failed { .. } => "Invalid",
        }
    }
}
