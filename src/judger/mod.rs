//! Judger module for running a submission against its test cases
//!
//! `Judge` owns the loaded test cases, the submission, the limits and the
//! results of one run. Test cases run one after another; each gets a fresh
//! child process and a fresh memory watchdog.

pub mod strategy;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::checker::Checker;
use crate::core::{ExecutionResult, ResourceLimits};
use crate::error::{ExecError, JudgeError};
use crate::observer::{JudgeObserver, TracingObserver};
use crate::report::Summary;
use crate::runner::watchdog::DEFAULT_SAMPLE_INTERVAL;
use crate::runner::{MemoryProbe, ProcStatusProbe, ProcessLauncher, RunStatus};
use crate::submission::Submission;
use crate::testcase::{self, TestCase};

pub use strategy::{CheckerInvoke, DirectCompare, Judgement, VerdictStrategy};

/// Batch runner for one submission
pub struct Judge {
    strategy: Box<dyn VerdictStrategy>,
    testcases: Vec<TestCase>,
    submission: Option<Submission>,
    limits: ResourceLimits,
    sample_interval: Duration,
    probe: Arc<dyn MemoryProbe>,
    observer: Arc<dyn JudgeObserver>,
    results: Vec<ExecutionResult>,
}

impl Judge {
    pub fn new(strategy: Box<dyn VerdictStrategy>) -> Self {
        Self {
            strategy,
            testcases: Vec::new(),
            submission: None,
            limits: ResourceLimits::default(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            probe: Arc::new(ProcStatusProbe),
            observer: Arc::new(TracingObserver::default()),
            results: Vec::new(),
        }
    }

    /// Judge by comparing outputs with `test{i}.out`
    pub fn direct() -> Self {
        Self::new(Box::new(DirectCompare))
    }

    /// Judge through an external checker
    pub fn with_checker(checker: Checker) -> Self {
        Self::new(Box::new(CheckerInvoke::new(checker)))
    }

    /// Load `count` test cases from `dir`, laid out the way the strategy expects.
    ///
    /// Appends to already loaded cases; on failure nothing is added.
    pub async fn load_testcases(
        &mut self,
        dir: impl AsRef<Path>,
        count: usize,
        width: Option<usize>,
    ) -> Result<(), JudgeError> {
        let loaded = testcase::load_testcases(dir, count, width, self.strategy.layout()).await?;
        info!("Loaded {} test cases", loaded.len());
        self.testcases.extend(loaded);
        Ok(())
    }

    pub fn add_testcase(&mut self, case: TestCase) {
        self.testcases.push(case);
    }

    pub fn load_submission(&mut self, submission: Submission) {
        debug!("Loaded submission: {}", submission.command());
        self.submission = Some(submission);
    }

    pub fn set_time_limit(&mut self, time_limit_secs: f64) -> Result<(), JudgeError> {
        self.limits = self.limits.with_time_limit(time_limit_secs)?;
        Ok(())
    }

    pub fn set_memory_limit(&mut self, memory_limit_mb: u64) -> Result<(), JudgeError> {
        self.limits = self.limits.with_memory_limit(memory_limit_mb)?;
        Ok(())
    }

    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.limits = limits;
    }

    pub fn set_watchdog_interval(&mut self, interval: Duration) {
        self.sample_interval = interval;
    }

    /// Replace where memory samples come from
    pub fn set_memory_probe(&mut self, probe: Arc<dyn MemoryProbe>) {
        self.probe = probe;
    }

    pub fn set_observer(&mut self, observer: Arc<dyn JudgeObserver>) {
        self.observer = observer;
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn testcases(&self) -> &[TestCase] {
        &self.testcases
    }

    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// Run every loaded test case in order.
    ///
    /// Prior results are discarded. A case that fails unexpectedly becomes a
    /// runtime error; only configuration problems abort the run, and they do so
    /// before any process is started.
    pub async fn run(&mut self) -> Result<&[ExecutionResult], JudgeError> {
        self.results.clear();
        if self.testcases.is_empty() {
            return Ok(&self.results);
        }
        let submission = self
            .submission
            .as_ref()
            .ok_or(JudgeError::SubmissionNotLoaded)?;

        let launcher = ProcessLauncher::new()
            .with_probe(self.probe.clone())
            .with_sample_interval(self.sample_interval)
            .with_observer(self.observer.clone());

        info!(
            "Running {} test cases (time_limit={:?}, memory_limit_mb={:?})",
            self.testcases.len(),
            self.limits.time_limit(),
            self.limits.memory_limit_mb()
        );

        let mut results = Vec::with_capacity(self.testcases.len());
        for (idx, case) in self.testcases.iter().enumerate() {
            let index = idx + 1;
            self.observer.case_started(index, case);

            let result = match self.run_case(&launcher, submission, index, case).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("TC #{} failed unexpectedly: {}", index, e);
                    ExecutionResult::internal_error(e.kind(), &e)
                }
            };

            self.observer.verdict_assigned(index, &result);
            results.push(result);
        }
        self.results = results;

        Ok(&self.results)
    }

    /// Launch, watch and judge a single test case
    async fn run_case(
        &self,
        launcher: &ProcessLauncher,
        submission: &Submission,
        index: usize,
        case: &TestCase,
    ) -> Result<ExecutionResult, ExecError> {
        let outcome = launcher
            .launch(submission.command(), case.input.as_bytes(), &self.limits)
            .await?;
        let elapsed = outcome.elapsed;

        let return_code = match outcome.status {
            RunStatus::TimeLimitExceeded => {
                return Ok(ExecutionResult::time_limit_exceeded(self.limits.time_limit()))
            }
            RunStatus::MemoryLimitExceeded => {
                return Ok(ExecutionResult::memory_limit_exceeded(
                    elapsed,
                    outcome.peak_memory_bytes,
                ))
            }
            // Anything on stderr counts as a failure, even with exit code 0
            status if !status.is_success() || !outcome.stderr.is_empty() => {
                let stderr = outcome.stderr_text();
                let detail = if stderr.trim().is_empty() {
                    status.to_string()
                } else {
                    stderr.trim_end().to_string()
                };
                return Ok(ExecutionResult::runtime_error(
                    &detail,
                    elapsed,
                    Some(status.return_code()),
                ));
            }
            status => status.return_code(),
        };

        let output = String::from_utf8(outcome.stdout)?;
        self.observer.output_captured(index, &output);

        let result = match self.strategy.judge(case, &output, launcher).await? {
            Judgement::Accepted => ExecutionResult::accepted(elapsed, return_code),
            Judgement::WrongAnswer => ExecutionResult::wrong_answer(elapsed, return_code),
            Judgement::Failed(reason) => {
                ExecutionResult::runtime_error(&reason, elapsed, Some(return_code))
            }
        };
        Ok(result)
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Back to the freshly constructed state; the strategy is kept
    pub fn reset(&mut self) {
        self.testcases.clear();
        self.submission = None;
        self.limits = ResourceLimits::default();
        self.results.clear();
    }

    pub fn summary(&self) -> Summary {
        Summary::from_results(&self.results)
    }
}
