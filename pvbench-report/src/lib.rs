#![warn(missing_docs)]
//! pvbench Report - Output Formats
//!
//! Turns a `SuiteResult` into something to read:
//! - Human console lines, streamed per case through `ConsoleReporter`
//! - JSON (machine-readable), with run metadata and configuration

mod console;
mod json;
mod report;

pub use console::{
    ConsoleReporter, format_case_line, format_human_output, format_ops, format_summary_lines,
};
pub use json::{generate_json_report, parse_json_report};
pub use report::{
    CaseMetrics, CaseReport, CaseReportStatus, FailureInfo, Report, ReportConfig, ReportMeta,
    ReportSummary, SCHEMA_VERSION, build_report,
};

use serde::{Deserialize, Serialize};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render `report` in `format`
pub fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(format_human_output(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert!("csv".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "human");
    }
}
