//! Message sinks for the human-readable update report.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Action,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Action => "action",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

pub trait Reporter {
    fn report(&mut self, msg: &str, severity: Severity);

    /// Summary lines printed after the body of the report.
    fn report_tail(&mut self, msg: &str, severity: Severity) {
        self.report(msg, severity);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, msg: &str, severity: Severity) {
        (**self).report(msg, severity);
    }

    fn report_tail(&mut self, msg: &str, severity: Severity) {
        (**self).report_tail(msg, severity);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _msg: &str, _severity: Severity) {}
}

/// Forwards messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, msg: &str, severity: Severity) {
        match severity {
            Severity::Info => log::debug!("{msg}"),
            Severity::Action => log::info!("{msg}"),
            Severity::Warning => log::warn!("{msg}"),
            Severity::Error => log::error!("{msg}"),
        }
    }

    fn report_tail(&mut self, msg: &str, _severity: Severity) {
        log::info!("{msg}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tail: bool,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Collects every line in order.
#[derive(Debug, Default, Clone)]
pub struct ReportLog {
    pub lines: Vec<ReportLine>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lines.iter().filter(|l| l.severity == severity).count()
    }

    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.severity == severity)
            .map(|l| l.message.as_str())
            .collect()
    }

    pub fn contains(&self, msg: &str) -> bool {
        self.lines.iter().any(|l| l.message == msg)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whole report, one line per message.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("{l}\n"))
            .collect()
    }
}

impl Reporter for ReportLog {
    fn report(&mut self, msg: &str, severity: Severity) {
        self.lines.push(ReportLine {
            severity,
            message: msg.to_string(),
            tail: false,
        });
    }

    fn report_tail(&mut self, msg: &str, severity: Severity) {
        self.lines.push(ReportLine {
            severity,
            message: msg.to_string(),
            tail: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_log_collects_in_order() {
        let mut log = ReportLog::new();
        {
            let mut sink: &mut ReportLog = &mut log;
            sink.report("Add net GND.", Severity::Action);
            sink.report("Multiple footprints found for \"R1\".", Severity::Error);
            sink.report_tail("Total warnings: 0, errors: 1.", Severity::Info);
        }

        assert_eq!(log.count(Severity::Action), 1);
        assert_eq!(log.messages(Severity::Error).len(), 1);
        assert!(log.contains("Add net GND."));
        assert!(log.lines[2].tail);
        assert_eq!(
            log.render(),
            "[action] Add net GND.\n[error] Multiple footprints found for \"R1\".\n[info] Total warnings: 0, errors: 1.\n"
        );
    }
}
