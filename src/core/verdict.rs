use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Final classification of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "MLE")]
    MemoryLimitExceeded,
}

impl Verdict {
    pub const ALL: [Verdict; 5] = [
        Verdict::Accepted,
        Verdict::WrongAnswer,
        Verdict::RuntimeError,
        Verdict::TimeLimitExceeded,
        Verdict::MemoryLimitExceeded,
    ];

    /// Short code used in result records ("AC", "WA", ...)
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::RuntimeError => "RE",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::MemoryLimitExceeded => "MLE",
        }
    }

    /// Human readable name, also the default result message
    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::MemoryLimitExceeded => "Memory Limit Exceeded",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result record of one test case execution.
///
/// Created exactly once per case and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: Verdict,
    pub message: String,
    /// Wall-clock time in seconds
    pub elapsed_time: f64,
    /// Exit code of the child, `-1` when it was killed, absent on internal failure
    pub return_code: Option<i32>,
}

impl ExecutionResult {
    /// Sentinel return code for a forcibly killed child
    pub const KILLED_RETURN_CODE: i32 = -1;

    pub fn new(
        status: Verdict,
        message: impl Into<String>,
        elapsed: Duration,
        return_code: Option<i32>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            elapsed_time: elapsed.as_secs_f64(),
            return_code,
        }
    }

    pub fn accepted(elapsed: Duration, return_code: i32) -> Self {
        Self::new(
            Verdict::Accepted,
            Verdict::Accepted.description(),
            elapsed,
            Some(return_code),
        )
    }

    pub fn wrong_answer(elapsed: Duration, return_code: i32) -> Self {
        Self::new(
            Verdict::WrongAnswer,
            Verdict::WrongAnswer.description(),
            elapsed,
            Some(return_code),
        )
    }

    /// Deadline exceeded; elapsed time is pinned to the configured limit
    pub fn time_limit_exceeded(time_limit: Duration) -> Self {
        Self::new(
            Verdict::TimeLimitExceeded,
            Verdict::TimeLimitExceeded.description(),
            time_limit,
            Some(Self::KILLED_RETURN_CODE),
        )
    }

    /// Memory ceiling exceeded; the peak sample, if any, goes into the message
    pub fn memory_limit_exceeded(elapsed: Duration, peak_bytes: Option<u64>) -> Self {
        let description = Verdict::MemoryLimitExceeded.description();
        let message = match peak_bytes {
            Some(bytes) => format!(
                "{} (peak {:.2} MB)",
                description,
                bytes as f64 / (1024.0 * 1024.0)
            ),
            None => description.to_string(),
        };
        Self::new(
            Verdict::MemoryLimitExceeded,
            message,
            elapsed,
            Some(Self::KILLED_RETURN_CODE),
        )
    }

    pub fn runtime_error(detail: &str, elapsed: Duration, return_code: Option<i32>) -> Self {
        Self::new(
            Verdict::RuntimeError,
            format!("{}: {}", Verdict::RuntimeError.description(), detail),
            elapsed,
            return_code,
        )
    }

    /// Catch-all for failures of the pipeline itself
    pub fn internal_error(kind: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            Verdict::RuntimeError,
            format!("{}: {}: {}", Verdict::RuntimeError.description(), kind, detail),
            Duration::ZERO,
            None,
        )
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_time * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Accepted.to_string(), "AC");
        assert_eq!(Verdict::MemoryLimitExceeded.to_string(), "MLE");
        assert_eq!(
            Verdict::TimeLimitExceeded.description(),
            "Time Limit Exceeded"
        );
    }

    #[test]
    fn test_result_record_field_names() {
        let result = ExecutionResult::time_limit_exceeded(Duration::from_millis(1500));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "TLE");
        assert_eq!(json["message"], "Time Limit Exceeded");
        assert_eq!(json["elapsed_time"], 1.5);
        assert_eq!(json["return_code"], -1);
    }

    #[test]
    fn test_memory_limit_message_carries_peak() {
        let result =
            ExecutionResult::memory_limit_exceeded(Duration::from_millis(30), Some(300 << 20));
        assert_eq!(result.message, "Memory Limit Exceeded (peak 300.00 MB)");
        assert_eq!(result.return_code, Some(-1));

        let result = ExecutionResult::memory_limit_exceeded(Duration::from_millis(30), None);
        assert_eq!(result.message, "Memory Limit Exceeded");
    }

    #[test]
    fn test_internal_error_has_no_return_code() {
        let result = ExecutionResult::internal_error("Io", "broken pipe");

        assert_eq!(result.status, Verdict::RuntimeError);
        assert_eq!(result.message, "Runtime Error: Io: broken pipe");
        assert_eq!(result.elapsed_time, 0.0);
        assert_eq!(result.return_code, None);
    }
}
