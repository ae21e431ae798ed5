//! Error types
//!
//! `JudgeError` covers configuration mistakes and is returned before any process
//! starts. `ExecError` covers unexpected failures while a test case is running;
//! the judger turns those into a runtime error verdict instead of aborting.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("time_limit must be over 0 (got {0})")]
    InvalidTimeLimit(f64),

    #[error("memory_limit must be over 0 (got {0})")]
    InvalidMemoryLimit(u64),

    #[error("tc_count must be over 0")]
    InvalidTestcaseCount,

    #[error("testcase file {path:?} could not be read: {source}")]
    MissingTestcase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} not found at {path:?}")]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("command must not be empty")]
    EmptyCommand,

    #[error("no submission loaded")]
    SubmissionNotLoaded,
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("output is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("test case has no expected output")]
    MissingExpectedOutput,

    #[error("watchdog task failed: {0}")]
    Watchdog(#[from] tokio::task::JoinError),
}

impl ExecError {
    /// Short name of the failure, carried into the verdict message
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::Spawn { .. } => "SpawnError",
            ExecError::Io(_) => "IoError",
            ExecError::Decode(_) => "DecodeError",
            ExecError::MissingExpectedOutput => "MissingExpectedOutput",
            ExecError::Watchdog(_) => "WatchdogError",
        }
    }
}
