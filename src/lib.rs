//! openjudge - local judge for single-program submissions
//!
//! Runs a submission once per test case under a wall-clock limit and a
//! resident-memory ceiling, and classifies every run as AC, WA, RE, TLE or MLE.
//! Outputs are either compared directly with the expected output or handed to
//! an external checker.

pub mod checker;
pub mod config;
pub mod core;
pub mod error;
pub mod judger;
pub mod observer;
pub mod report;
pub mod runner;
pub mod submission;
pub mod testcase;

pub use checker::Checker;
pub use config::{JudgeConfig, JudgeMode};
pub use crate::core::{ExecutionResult, ResourceLimits, Verdict};
pub use error::{ExecError, JudgeError};
pub use judger::Judge;
pub use report::Summary;
pub use submission::Submission;
pub use testcase::TestCase;
