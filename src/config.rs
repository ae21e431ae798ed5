//! Judge configuration
//!
//! A run is described by a TOML file:
//!
//! ```toml
//! mode = "direct"            # or "checker"
//! submission = "solution.py"
//! testcase_dir = "testcases"
//! testcase_count = 10
//! time_limit = 2.0           # seconds
//! memory_limit = 256         # MB
//! ```
//!
//! A few values can be overridden from the environment (`JUDGE_TIME_LIMIT`,
//! `JUDGE_MEMORY_LIMIT`, `JUDGE_VERBOSE`).

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::checker::{Checker, DEFAULT_CHECKER_TIMEOUT};
use crate::core::limits::{DEFAULT_MEMORY_LIMIT_MB, DEFAULT_TIME_LIMIT_SECS};
use crate::core::ResourceLimits;
use crate::judger::Judge;
use crate::observer::TracingObserver;
use crate::runner::watchdog::DEFAULT_SAMPLE_INTERVAL;
use crate::submission::{Submission, DEFAULT_INTERPRETER};

/// How submissions are judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMode {
    /// Compare against `test{i}.out`
    #[default]
    Direct,
    /// Ask an external checker
    Checker,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JudgeConfig {
    #[serde(default)]
    pub mode: JudgeMode,
    /// Script run with `interpreter`
    pub submission: PathBuf,
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    pub testcase_dir: PathBuf,
    pub testcase_count: usize,
    /// Zero-padding width of test case file names (default: digits of the count)
    #[serde(default)]
    pub testcase_format: Option<usize>,
    /// Seconds
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// MB; `None` disables the watchdog
    #[serde(default = "default_memory_limit")]
    pub memory_limit: Option<u64>,
    /// Checker script, required in checker mode
    #[serde(default)]
    pub checker: Option<PathBuf>,
    /// Seconds
    #[serde(default = "default_checker_timeout")]
    pub checker_timeout: f64,
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
    /// Log test inputs and expected outputs
    #[serde(default)]
    pub verbose: bool,
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

fn default_time_limit() -> f64 {
    DEFAULT_TIME_LIMIT_SECS
}

fn default_memory_limit() -> Option<u64> {
    Some(DEFAULT_MEMORY_LIMIT_MB)
}

fn default_checker_timeout() -> f64 {
    DEFAULT_CHECKER_TIMEOUT.as_secs_f64()
}

fn default_watchdog_interval_ms() -> u64 {
    DEFAULT_SAMPLE_INTERVAL.as_millis() as u64
}

impl JudgeConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: JudgeConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load from a TOML file; relative paths inside are resolved against its directory
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read judge config {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse judge config {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.submission);
        resolve(&mut self.testcase_dir);
        if let Some(checker) = self.checker.as_mut() {
            resolve(checker);
        }
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("JUDGE_TIME_LIMIT") {
            self.time_limit = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid JUDGE_TIME_LIMIT: {}", value))?;
        }
        if let Some(value) = lookup("JUDGE_MEMORY_LIMIT") {
            let value = value.trim();
            self.memory_limit = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid JUDGE_MEMORY_LIMIT: {}", value))?,
                )
            };
        }
        if let Some(value) = lookup("JUDGE_VERBOSE") {
            self.verbose = matches!(value.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Validate everything and build a judge with its test cases loaded
    pub async fn build_judge(&self) -> anyhow::Result<Judge> {
        let limits = ResourceLimits::new(self.time_limit, self.memory_limit)
            .context("Invalid resource limits")?;
        let submission = Submission::script(&self.interpreter, &self.submission)?;

        let mut judge = match self.mode {
            JudgeMode::Direct => Judge::direct(),
            JudgeMode::Checker => {
                let path = self
                    .checker
                    .as_ref()
                    .context("Checker mode requires a `checker` path")?;
                let checker = Checker::script(&self.interpreter, path)?
                    .with_timeout(self.checker_timeout)
                    .context("Invalid checker timeout")?;
                Judge::with_checker(checker)
            }
        };

        if self.watchdog_interval_ms == 0 {
            anyhow::bail!("watchdog_interval_ms must be over 0");
        }
        judge.set_watchdog_interval(Duration::from_millis(self.watchdog_interval_ms));
        judge.set_observer(Arc::new(TracingObserver::new(self.verbose)));
        judge.set_limits(limits);
        judge.load_submission(submission);
        judge
            .load_testcases(&self.testcase_dir, self.testcase_count, self.testcase_format)
            .await
            .with_context(|| {
                format!("Failed to load test cases from {}", self.testcase_dir.display())
            })?;

        Ok(judge)
    }
}
