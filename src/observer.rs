//! Pipeline hooks
//!
//! The judger and the launcher report what they do through a `JudgeObserver`.
//! Logging verbosity is decided by the observer, not by the pipeline.

use tracing::{debug, info, warn};

use crate::core::{ExecutionResult, Verdict};
use crate::runner::CommandSpec;
use crate::testcase::TestCase;

/// Why the judge killed a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    TimeLimit,
    MemoryLimit,
}

/// Hooks invoked at fixed points of the single-case pipeline.
///
/// Case indices are 1-based.
pub trait JudgeObserver: Send + Sync {
    fn case_started(&self, _index: usize, _case: &TestCase) {}

    fn process_started(&self, _pid: u32, _command: &CommandSpec) {}

    fn process_killed(&self, _pid: u32, _reason: KillReason) {}

    /// Decoded stdout of a submission that exited cleanly, before it is judged
    fn output_captured(&self, _index: usize, _output: &str) {}

    fn verdict_assigned(&self, _index: usize, _result: &ExecutionResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl JudgeObserver for SilentObserver {}

/// Logs pipeline events through `tracing`.
///
/// With `verbose` set, test inputs, expected outputs and actual outputs are
/// logged as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver {
    verbose: bool,
}

impl TracingObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl JudgeObserver for TracingObserver {
    fn case_started(&self, index: usize, case: &TestCase) {
        debug!("Running TC #{}", index);
        if self.verbose {
            info!("TC #{} input: {:?}", index, case.input);
            if let Some(expected) = &case.expected_output {
                info!("TC #{} expected output: {:?}", index, expected);
            }
        }
    }

    fn process_started(&self, pid: u32, command: &CommandSpec) {
        debug!("Started process {}: {}", pid, command);
    }

    fn process_killed(&self, pid: u32, reason: KillReason) {
        match reason {
            KillReason::TimeLimit => warn!("Killed process {}: time limit exceeded", pid),
            KillReason::MemoryLimit => warn!("Killed process {}: memory limit exceeded", pid),
        }
    }

    fn output_captured(&self, index: usize, output: &str) {
        if self.verbose {
            info!("TC #{} actual output: {:?}", index, output);
        }
    }

    fn verdict_assigned(&self, index: usize, result: &ExecutionResult) {
        match result.status {
            Verdict::Accepted | Verdict::WrongAnswer => info!(
                "TC #{}: {} ({:.3}ms)",
                index,
                result.status,
                result.elapsed_ms()
            ),
            _ => info!("TC #{}: {} - {}", index, result.status, result.message),
        }
    }
}
