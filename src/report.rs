//! Result summary of a judge run
//!
//! `Summary` tallies the verdicts of one run and renders the per-case listing
//! printed by the CLI:
//!
//! ```text
//! [TC 1] AC (elapsed_time: 12.345ms)
//! [TC 2] RE
//!
//! [Result]
//! - AC: 1/2
//! ...
//! ```

use serde::Serialize;
use std::fmt;

use crate::core::{ExecutionResult, Verdict};
use crate::testcase::default_width;

/// One line of the per-case listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    /// 1-based test case index
    pub index: usize,
    pub status: Verdict,
    pub elapsed_ms: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub accepted: usize,
    pub wrong_answer: usize,
    pub runtime_error: usize,
    pub time_limit_exceeded: usize,
    pub memory_limit_exceeded: usize,
    /// Sum of the elapsed time of every case
    pub total_elapsed_ms: f64,
    pub cases: Vec<CaseSummary>,
}

impl Summary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Default::default()
        };

        for (idx, result) in results.iter().enumerate() {
            match result.status {
                Verdict::Accepted => summary.accepted += 1,
                Verdict::WrongAnswer => summary.wrong_answer += 1,
                Verdict::RuntimeError => summary.runtime_error += 1,
                Verdict::TimeLimitExceeded => summary.time_limit_exceeded += 1,
                Verdict::MemoryLimitExceeded => summary.memory_limit_exceeded += 1,
            }
            summary.total_elapsed_ms += result.elapsed_ms();
            summary.cases.push(CaseSummary {
                index: idx + 1,
                status: result.status,
                elapsed_ms: result.elapsed_ms(),
                message: result.message.clone(),
            });
        }

        summary
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Accepted => self.accepted,
            Verdict::WrongAnswer => self.wrong_answer,
            Verdict::RuntimeError => self.runtime_error,
            Verdict::TimeLimitExceeded => self.time_limit_exceeded,
            Verdict::MemoryLimitExceeded => self.memory_limit_exceeded,
        }
    }

    /// True when there was at least one case and every case passed
    pub fn all_accepted(&self) -> bool {
        self.total > 0 && self.accepted == self.total
    }

    /// Verdict of the whole run: the first non-accepted case decides
    pub fn overall(&self) -> Option<Verdict> {
        if self.total == 0 {
            return None;
        }
        let verdict = self
            .cases
            .iter()
            .map(|case| case.status)
            .find(|status| *status != Verdict::Accepted)
            .unwrap_or(Verdict::Accepted);
        Some(verdict)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = default_width(self.total);

        for case in &self.cases {
            match case.status {
                // Runtime errors have no meaningful timing
                Verdict::RuntimeError => {
                    writeln!(f, "[TC {:0width$}] {}", case.index, case.status, width = width)?
                }
                _ => writeln!(
                    f,
                    "[TC {:0width$}] {} (elapsed_time: {:.3}ms)",
                    case.index,
                    case.status,
                    case.elapsed_ms,
                    width = width
                )?,
            }
        }

        writeln!(f)?;
        writeln!(f, "[Result]")?;
        for verdict in Verdict::ALL {
            writeln!(f, "- {}: {}/{}", verdict, self.count(verdict), self.total)?;
        }
        write!(f, "- total elapsed_time: {:.3}ms", self.total_elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_results() -> Vec<ExecutionResult> {
        vec![
            ExecutionResult::accepted(Duration::from_millis(12), 0),
            ExecutionResult::wrong_answer(Duration::from_millis(8), 0),
            ExecutionResult::runtime_error("boom", Duration::from_millis(3), Some(1)),
            ExecutionResult::time_limit_exceeded(Duration::from_secs(2)),
        ]
    }

    #[test]
    fn test_counts() {
        let summary = Summary::from_results(&sample_results());

        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(Verdict::Accepted), 1);
        assert_eq!(summary.count(Verdict::WrongAnswer), 1);
        assert_eq!(summary.count(Verdict::RuntimeError), 1);
        assert_eq!(summary.count(Verdict::TimeLimitExceeded), 1);
        assert_eq!(summary.count(Verdict::MemoryLimitExceeded), 0);
        assert!(!summary.all_accepted());
        assert_eq!(summary.overall(), Some(Verdict::WrongAnswer));
        assert!((summary.total_elapsed_ms - 2023.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert!(!summary.all_accepted());
        assert_eq!(summary.overall(), None);
    }

    #[test]
    fn test_display() {
        let rendered = Summary::from_results(&sample_results()).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "[TC 1] AC (elapsed_time: 12.000ms)");
        assert_eq!(lines[1], "[TC 2] WA (elapsed_time: 8.000ms)");
        assert_eq!(lines[2], "[TC 3] RE");
        assert_eq!(lines[3], "[TC 4] TLE (elapsed_time: 2000.000ms)");
        assert!(lines.contains(&"[Result]"));
        assert!(lines.contains(&"- AC: 1/4"));
        assert!(lines.contains(&"- MLE: 0/4"));
    }

    #[test]
    fn test_index_padding_follows_case_count() {
        let results: Vec<_> = (0..12)
            .map(|_| ExecutionResult::accepted(Duration::from_millis(1), 0))
            .collect();
        let rendered = Summary::from_results(&results).to_string();

        assert!(rendered.starts_with("[TC 01] AC"));
        assert!(rendered.contains("[TC 12] AC"));
        assert!(rendered.contains("- AC: 12/12"));
    }

    #[test]
    fn test_serialize() {
        let summary = Summary::from_results(&sample_results()[..1]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["accepted"], 1);
        assert_eq!(json["cases"][0]["status"], "AC");
    }
}
