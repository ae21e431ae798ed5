//! Process launcher
//!
//! Spawns exactly one child per call with piped stdio, writes the input,
//! drains stdout/stderr while waiting, and races the child against the
//! deadline and the memory watchdog.

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::memory::{MemoryProbe, ProcStatusProbe};
use super::watchdog::{MemoryWatchdog, WatchdogHandle, WatchdogReport, DEFAULT_SAMPLE_INTERVAL};
use super::{CommandSpec, RunOutcome, RunStatus};
use crate::core::ResourceLimits;
use crate::error::ExecError;
use crate::observer::{JudgeObserver, KillReason, SilentObserver};

/// Deadline used when the time limit does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// How the race between child, deadline and watchdog ended
enum Completion {
    Finished(Result<(RunStatus, Vec<u8>, Vec<u8>), ExecError>),
    MemoryBreach,
    TimedOut,
}

/// Starts programs under a time limit and an optional memory ceiling
#[derive(Clone)]
pub struct ProcessLauncher {
    probe: Arc<dyn MemoryProbe>,
    sample_interval: Duration,
    observer: Arc<dyn JudgeObserver>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(ProcStatusProbe),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            observer: Arc::new(SilentObserver),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn JudgeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run `cmd` once, feeding `input` on stdin
    pub async fn launch(
        &self,
        cmd: &CommandSpec,
        input: &[u8],
        limits: &ResourceLimits,
    ) -> Result<RunOutcome, ExecError> {
        debug!(
            "Launching {} (time_limit={:?}, memory_limit_mb={:?})",
            cmd,
            limits.time_limit(),
            limits.memory_limit_mb()
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let deadline = start
            .checked_add(limits.time_limit())
            .unwrap_or_else(|| start + FAR_FUTURE);

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;
        let pid = child.id();
        if let Some(pid) = pid {
            self.observer.process_started(pid, cmd);
        }

        let mut watchdog = match (pid, limits.memory_limit_bytes()) {
            (Some(pid), Some(limit)) => Some(
                MemoryWatchdog::new(pid, limit, self.sample_interval, self.probe.clone()).spawn(),
            ),
            _ => None,
        };

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stop_signal = watchdog.as_mut().and_then(|handle| handle.stop_signal());

        let completion = {
            // Stop sampling as soon as the child is reaped; its pid is free for reuse
            // from then on
            let reaped = async {
                let status = child.wait().await;
                if let Some(signal) = stop_signal {
                    signal.send();
                }
                status
            };
            let finished = async {
                let (written, status, out, err) = tokio::join!(
                    write_input(stdin, input),
                    reaped,
                    read_pipe(stdout),
                    read_pipe(stderr)
                );
                written?;
                Ok::<_, ExecError>((RunStatus::from_exit_status(status?), out?, err?))
            };
            let breach = async {
                match watchdog.as_mut() {
                    Some(handle) => handle.breached_signal().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                result = finished => Completion::Finished(result),
                _ = breach => Completion::MemoryBreach,
                _ = sleep_until(deadline) => Completion::TimedOut,
            }
        };
        let elapsed = start.elapsed();

        if !matches!(completion, Completion::Finished(Ok(_))) {
            self.terminate(&mut child).await;
        }

        // The breach flag is only trustworthy once the watchdog has been joined
        let report = stop_watchdog(watchdog).await?;
        let peak_memory_bytes = (report.samples > 0).then_some(report.peak_bytes);

        if report.breached {
            if let Some(pid) = pid {
                self.observer.process_killed(pid, KillReason::MemoryLimit);
            }
            return Ok(RunOutcome::killed(
                RunStatus::MemoryLimitExceeded,
                elapsed,
                peak_memory_bytes,
            ));
        }

        match completion {
            Completion::Finished(Ok((status, stdout, stderr))) => {
                debug!("Process {:?} finished with {} in {:?}", pid, status, elapsed);
                Ok(RunOutcome {
                    status,
                    elapsed,
                    stdout,
                    stderr,
                    peak_memory_bytes,
                })
            }
            Completion::Finished(Err(e)) => Err(e),
            Completion::TimedOut => {
                if let Some(pid) = pid {
                    self.observer.process_killed(pid, KillReason::TimeLimit);
                }
                Ok(RunOutcome::killed(
                    RunStatus::TimeLimitExceeded,
                    limits.time_limit(),
                    peak_memory_bytes,
                ))
            }
            // The flag is set before the signal fires, so this is only reached
            // if the watchdog task itself was lost
            Completion::MemoryBreach => Ok(RunOutcome::killed(
                RunStatus::MemoryLimitExceeded,
                elapsed,
                peak_memory_bytes,
            )),
        }
    }

    /// Kill the child if it is still running and reap it
    async fn terminate(&self, child: &mut Child) {
        if let Err(e) = child.kill().await {
            debug!("Kill of process {:?} reported: {}", child.id(), e);
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

async fn stop_watchdog(watchdog: Option<WatchdogHandle>) -> Result<WatchdogReport, ExecError> {
    match watchdog {
        Some(handle) => Ok(handle.stop().await?),
        None => Ok(WatchdogReport::default()),
    }
}

/// Write the whole input and close stdin.
///
/// A child that exits without reading its input is not an error.
async fn write_input(stdin: Option<ChildStdin>, input: &[u8]) -> Result<(), ExecError> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(input).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
        Err(e) => return Err(e.into()),
    }
    match stdin.shutdown().await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Result<Vec<u8>, ExecError> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
