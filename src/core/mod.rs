//! Core data types shared by the runner and the judger
//!
//! - `ResourceLimits`: time and memory limits of a run
//! - `Verdict` / `ExecutionResult`: per-test-case outcome
//! - output normalization used by every verdict strategy

pub mod limits;
pub mod normalize;
pub mod verdict;

pub use limits::ResourceLimits;
pub use normalize::{compare_output, normalize_output};
pub use verdict::{ExecutionResult, Verdict};
