//! Runner module - Process execution layer
//!
//! This module starts programs and enforces resource limits:
//! - `ProcessLauncher`: spawns one child per call, feeds stdin, waits with a deadline
//! - `MemoryWatchdog`: samples the child's resident memory and kills it on breach
//! - `MemoryProbe`: where the memory samples come from (`/proc` by default)
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about test cases or checkers

pub mod launcher;
pub mod memory;
pub mod watchdog;

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::Duration;

/// Program and arguments of a child process
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by a signal nobody in the judge sent
    Signaled(i32),
    /// Killed after the deadline passed
    TimeLimitExceeded,
    /// Killed by the memory watchdog
    MemoryLimitExceeded,
}

impl RunStatus {
    pub fn from_exit_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => RunStatus::Exited(code),
            (None, Some(signal)) => RunStatus::Signaled(signal),
            (None, None) => RunStatus::Exited(-1),
        }
    }

    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }

    /// Exit code as reported in result records.
    ///
    /// Signals are reported negated, killed runs as `-1`.
    pub fn return_code(&self) -> i32 {
        match self {
            RunStatus::Exited(code) => *code,
            RunStatus::Signaled(signal) => -signal,
            RunStatus::TimeLimitExceeded | RunStatus::MemoryLimitExceeded => -1,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Exited(code) => write!(f, "exit code {}", code),
            RunStatus::Signaled(signal) => write!(f, "killed by signal {}", signal),
            RunStatus::TimeLimitExceeded => write!(f, "time limit exceeded"),
            RunStatus::MemoryLimitExceeded => write!(f, "memory limit exceeded"),
        }
    }
}

/// Outcome of running a program
#[derive(Debug)]
pub struct RunOutcome {
    /// Execution status
    pub status: RunStatus,
    /// Wall-clock time from spawn to completion
    pub elapsed: Duration,
    /// Raw stdout bytes
    pub stdout: Vec<u8>,
    /// Raw stderr bytes
    pub stderr: Vec<u8>,
    /// Highest resident memory the watchdog saw, in bytes
    pub peak_memory_bytes: Option<u64>,
}

impl RunOutcome {
    /// Outcome of a child the judge killed; its output is discarded
    pub fn killed(status: RunStatus, elapsed: Duration, peak_memory_bytes: Option<u64>) -> Self {
        Self {
            status,
            elapsed,
            stdout: Vec::new(),
            stderr: Vec::new(),
            peak_memory_bytes,
        }
    }

    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Stderr as text, for messages
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

// Re-exports
pub use launcher::ProcessLauncher;
pub use memory::{MemoryProbe, ProcStatusProbe};
pub use watchdog::{MemoryWatchdog, StopSignal, WatchdogHandle, WatchdogReport};
