//! Color theme for CLI output

use crate::domain::{ArtifactKind, ValidationOutcome};
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    pub fn get_outcome_color(&self, outcome: &ValidationOutcome) -> TableColor {
        match outcome {
            ValidationOutcome::Passed { .. } => self.success,
            ValidationOutcome::Skipped { .. } => self.warning,
            ValidationOutcome::Failed { .. } => self.error,
        }
    }

    /// Secret-bearing artifacts stand out in listings.
    pub fn get_kind_color(&self, kind: ArtifactKind) -> TableColor {
        if kind.is_secret_bearing() {
            self.warning
        } else {
            self.info
        }
    }
}
