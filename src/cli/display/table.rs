//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::config::MicroserviceSpec;
use crate::domain::{ArtifactDescriptor, EndpointMap, ValidationOutcome, ValidationReport};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Where a spec comes from, for the specs listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecSource {
    Builtin,
    Inline,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    fn table(&self, header: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                header
                    .iter()
                    .map(|h| Cell::new(h).set_alignment(CellAlignment::Left))
                    .collect::<Vec<_>>(),
            );
        table
    }

    /// Render the artifacts of one microservice in apply order
    pub fn render_artifacts(&self, microservice: &str, artifacts: &[ArtifactDescriptor]) -> String {
        if artifacts.is_empty() {
            return format!("No artifacts rendered for {}", microservice);
        }

        let mut table = self.table(&["#", "ARTIFACT", "TYPE", "DOCS", "SLEEP"]);
        for (index, artifact) in artifacts.iter().enumerate() {
            let docs = artifact
                .documents()
                .map(|d| d.len().to_string())
                .unwrap_or_else(|_| "?".to_string());
            let sleep = artifact
                .sleep
                .map(|s| format!("{} {}s", StatusIcon::PENDING, s))
                .unwrap_or_default();

            table.add_row(vec![
                Cell::new(format!("{:02}", index)),
                Cell::new(&artifact.name),
                Cell::new(artifact.kind.as_str()).fg(self.theme.get_kind_color(artifact.kind)),
                Cell::new(docs).set_alignment(CellAlignment::Right),
                Cell::new(sleep).fg(self.theme.muted),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ {} {} ─╮\n",
            microservice,
            format!("[{} artifacts]", artifacts.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    /// Render a validation report
    pub fn render_validation(&self, report: &ValidationReport) -> String {
        if report.records.is_empty() {
            return "Nothing to validate".to_string();
        }

        let mut table = self.table(&["MICROSERVICE", "ARTIFACT", "STATUS", "DETAIL"]);
        for record in &report.records {
            let detail = match record.outcome {
                ValidationOutcome::Passed { ref path } => path.display().to_string(),
                ValidationOutcome::Skipped { ref reason }
                | ValidationOutcome::Failed { ref reason } => reason.clone(),
            };
            table.add_row(vec![
                Cell::new(&record.microservice),
                Cell::new(&record.artifact),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::get_outcome_icon(&record.outcome),
                    StatusIcon::get_status_text(&record.outcome)
                ))
                .fg(self.theme.get_outcome_color(&record.outcome)),
                Cell::new(detail),
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "Summary: {} {} valid  {} {} skipped  {} {} invalid\n",
            StatusIcon::SUCCESS.green(),
            report.passed(),
            StatusIcon::WARNING.yellow(),
            report.skipped(),
            StatusIcon::ERROR.red(),
            report.failed()
        ));
        output
    }

    /// Render endpoint maps, one row per endpoint
    pub fn render_endpoints(&self, maps: &[EndpointMap]) -> String {
        let mut table = self.table(&["MICROSERVICE", "ENDPOINT", "ADDRESS"]);
        let mut rows = 0;
        for map in maps {
            for (name, address) in &map.endpoints {
                table.add_row(vec![
                    Cell::new(&map.microservice),
                    Cell::new(name),
                    Cell::new(address).fg(self.theme.info),
                ]);
                rows += 1;
            }
        }

        if rows == 0 {
            return "No endpoints exposed".to_string();
        }
        table.to_string()
    }

    /// Render known microservice specs
    pub fn render_specs(&self, specs: &[(SpecSource, MicroserviceSpec)]) -> String {
        if specs.is_empty() {
            return "No microservice specs found".to_string();
        }

        let mut table = self.table(&["SPEC", "SOURCE", "REQUIRED", "OPTIONAL", "ARTIFACTS"]);
        for (source, spec) in specs {
            let source = match source {
                SpecSource::Builtin => Cell::new("builtin").fg(self.theme.muted),
                SpecSource::Inline => Cell::new("inline").fg(self.theme.info),
            };
            table.add_row(vec![
                Cell::new(&spec.name),
                source,
                Cell::new(spec.required.join("\n")),
                Cell::new(spec.optional.join("\n")),
                Cell::new(spec.artifact_names().len()).set_alignment(CellAlignment::Right),
            ]);
        }
        table.to_string()
    }
}
