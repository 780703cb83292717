//! Console Output
//!
//! One line per case, printed as soon as the case finishes:
//!
//! ```text
//! rpds.Vector x 38,411 ops/sec ±0.84% (12 runs sampled)
//! im.Vector x 9,021 ops/sec ±3.10% (40 runs sampled) [low confidence]
//! broken: FAILED (release protocol) 1 handle(s) still live after the invocation completed
//! array: skipped (20000 pushes exceed the adapter limit of 10000)
//! Fastest is rpds.Vector
//! ```

use crate::report::{CaseReport, CaseReportStatus, Report};
use pvbench_core::{CaseOutcome, Reporter, SuiteResult};
use std::io::Write;

/// Format ops/sec with thousands separators; two decimals below 100
pub fn format_ops(ops: f64) -> String {
    let text = if ops < 100.0 {
        format!("{ops:.2}")
    } else {
        format!("{ops:.0}")
    };
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// The console line for one case
pub fn format_case_line(case: &CaseReport) -> String {
    match case.status {
        CaseReportStatus::Converged | CaseReportStatus::LowConfidence => {
            let (ops, rme, samples) = case
                .metrics
                .as_ref()
                .map(|m| (m.ops_per_sec, m.rme, m.samples))
                .unwrap_or((0.0, None, 0));
            let rme = match rme {
                Some(rme) => format!("{rme:.2}"),
                None => "inf".to_string(),
            };
            let mut line = format!(
                "{} x {} ops/sec ±{}% ({} runs sampled)",
                case.name,
                format_ops(ops),
                rme,
                samples
            );
            if case.status == CaseReportStatus::LowConfidence {
                line.push_str(" [low confidence]");
            }
            line
        }
        CaseReportStatus::Failed => {
            let (kind, message) = case
                .failure
                .as_ref()
                .map(|f| (f.kind.as_str(), f.message.as_str()))
                .unwrap_or(("unknown", ""));
            format!("{}: FAILED ({}) {}", case.name, kind, message)
        }
        CaseReportStatus::Skipped => format!(
            "{}: skipped ({})",
            case.name,
            case.skip_reason.as_deref().unwrap_or("not run")
        ),
    }
}

/// Closing lines: cancellation notice and the fastest case
pub fn format_summary_lines(fastest: Option<&str>, cancelled: bool, ran: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if cancelled {
        lines.push(format!("Cancelled after {ran} case(s)"));
    }
    if let Some(fastest) = fastest {
        lines.push(format!("Fastest is {fastest}"));
    }
    lines
}

/// Format a full report for terminal display or a text file
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();
    for case in &report.results {
        output.push_str(&format_case_line(case));
        output.push('\n');
    }
    for line in format_summary_lines(
        report.fastest.as_deref(),
        report.cancelled,
        report.results.len(),
    ) {
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Writes console lines as the suite progresses
#[derive(Debug)]
pub struct ConsoleReporter<W> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    /// Reporter printing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(%err, "failed to write report line");
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn case_finished(&mut self, outcome: &CaseOutcome) {
        let line = format_case_line(&CaseReport::from(outcome));
        self.emit(&line);
    }

    fn suite_finished(&mut self, result: &SuiteResult) {
        let lines = format_summary_lines(
            result.fastest.as_deref(),
            result.cancelled,
            result.outcomes.len(),
        );
        for line in lines {
            self.emit(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportConfig, build_report, sample_result};
    use pvbench_core::SamplerConfig;

    #[test]
    fn test_format_ops() {
        assert_eq!(format_ops(0.5), "0.50");
        assert_eq!(format_ops(99.994), "99.99");
        assert_eq!(format_ops(100.0), "100");
        assert_eq!(format_ops(1_234.4), "1,234");
        assert_eq!(format_ops(38_411.0), "38,411");
        assert_eq!(format_ops(1_000_000.0), "1,000,000");
    }

    #[test]
    fn test_console_reporter_lines() {
        let result = sample_result();
        let mut reporter = ConsoleReporter::new(Vec::new());
        for outcome in &result.outcomes {
            reporter.case_finished(outcome);
        }
        reporter.suite_finished(&result);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "fast x 1,000,000 ops/sec ±0.00% (5 runs sampled)",
                "slow x 1,000,000 ops/sec ±0.00% (5 runs sampled) [low confidence]",
                "broken: FAILED (release protocol) 1 handle(s) still live after the invocation completed",
                "array: skipped (20000 pushes exceed the adapter limit of 10000)",
                "Fastest is fast",
            ]
        );
    }

    #[test]
    fn test_human_output_matches_live_lines() {
        let result = sample_result();
        let report = build_report(&result, ReportConfig::new(1000, &SamplerConfig::default()));

        let mut reporter = ConsoleReporter::new(Vec::new());
        for outcome in &result.outcomes {
            reporter.case_finished(outcome);
        }
        reporter.suite_finished(&result);

        assert_eq!(
            format_human_output(&report),
            String::from_utf8(reporter.into_inner()).unwrap()
        );
    }

    #[test]
    fn test_cancelled_summary() {
        assert_eq!(
            format_summary_lines(Some("a"), true, 1),
            vec!["Cancelled after 1 case(s)", "Fastest is a"]
        );
        assert!(format_summary_lines(None, false, 0).is_empty());
    }
}
