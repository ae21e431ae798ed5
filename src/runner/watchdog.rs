//! Memory watchdog
//!
//! Runs next to the launcher's wait for the lifetime of one child. Every tick it
//! samples the child's resident memory; the first sample above the ceiling sets
//! the breach flag, kills the child and ends the watch.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::memory::MemoryProbe;

/// Default sampling interval
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// What the watchdog observed during its watch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatchdogReport {
    pub breached: bool,
    pub peak_bytes: u64,
    pub samples: u64,
}

pub struct MemoryWatchdog {
    pid: u32,
    limit_bytes: u64,
    interval: Duration,
    probe: Arc<dyn MemoryProbe>,
}

impl MemoryWatchdog {
    pub fn new(
        pid: u32,
        limit_bytes: u64,
        interval: Duration,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        Self {
            pid,
            limit_bytes,
            interval,
            probe,
        }
    }

    /// Start sampling on the runtime
    pub fn spawn(self) -> WatchdogHandle {
        let breached = Arc::new(AtomicBool::new(false));
        let (breach_tx, breach_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(self.watch(breached.clone(), breach_tx, stop_rx));

        WatchdogHandle {
            breached,
            breach_rx: Some(breach_rx),
            stop_tx: Some(stop_tx),
            task,
        }
    }

    async fn watch(
        self,
        breached: Arc<AtomicBool>,
        breach_tx: oneshot::Sender<()>,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> WatchdogReport {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut breach_tx = Some(breach_tx);
        let mut report = WatchdogReport::default();

        loop {
            tokio::select! {
                biased;
                // Stop requested, or the handle is gone
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            let rss = match self.probe.resident_bytes(self.pid).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!("Process {} is gone, watchdog stopping", self.pid);
                    break;
                }
                Err(e) => {
                    warn!("Failed to sample memory of process {}: {}", self.pid, e);
                    break;
                }
            };

            report.samples += 1;
            report.peak_bytes = report.peak_bytes.max(rss);

            if rss > self.limit_bytes {
                breached.store(true, Ordering::SeqCst);
                report.breached = true;
                debug!(
                    "Process {} exceeded memory limit: {:.2} MB > {:.2} MB",
                    self.pid,
                    to_mb(rss),
                    to_mb(self.limit_bytes)
                );
                kill_process(self.pid);
                if let Some(tx) = breach_tx.take() {
                    let _ = tx.send(());
                }
                break;
            }
        }

        report
    }
}

/// Launcher side of a running watchdog
pub struct WatchdogHandle {
    breached: Arc<AtomicBool>,
    breach_rx: Option<oneshot::Receiver<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<WatchdogReport>,
}

impl WatchdogHandle {
    pub fn is_breached(&self) -> bool {
        self.breached.load(Ordering::SeqCst)
    }

    /// Resolves once the watchdog has killed the child for exceeding the limit.
    ///
    /// Never resolves if the watch ends without a breach.
    pub async fn breached_signal(&mut self) {
        let fired = match self.breach_rx.as_mut() {
            Some(rx) => rx.await.is_ok(),
            None => false,
        };
        self.breach_rx = None;
        if !fired {
            std::future::pending::<()>().await;
        }
    }

    /// Detach the stop signal, to end sampling before the handle is joined.
    ///
    /// Dropping the returned signal also stops the watch.
    pub fn stop_signal(&mut self) -> Option<StopSignal> {
        self.stop_tx.take().map(StopSignal)
    }

    /// Stop sampling and wait for the watch to end
    pub async fn stop(mut self) -> Result<WatchdogReport, JoinError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let mut report = self.task.await?;
        report.breached |= self.breached.load(Ordering::SeqCst);
        Ok(report)
    }
}

/// Ends a watch without waiting for it
pub struct StopSignal(oneshot::Sender<()>);

impl StopSignal {
    pub fn send(self) {
        let _ = self.0.send(());
    }
}

fn kill_process(pid: u32) {
    match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => debug!("Process {} exited before it could be killed", pid),
        Err(e) => warn!("Failed to kill process {}: {}", pid, e),
    }
}

fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Stdio;
    use std::sync::atomic::AtomicU64;
    use tokio::process::Command;

    /// Reports a fixed resident size, or a vanished process
    struct FixedProbe {
        bytes: Option<u64>,
        calls: AtomicU64,
    }

    impl FixedProbe {
        fn new(bytes: Option<u64>) -> Arc<Self> {
            Arc::new(Self {
                bytes,
                calls: AtomicU64::new(0),
            })
        }
    }

    #[async_trait]
    impl MemoryProbe for FixedProbe {
        async fn resident_bytes(&self, _pid: u32) -> io::Result<Option<u64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes)
        }
    }

    fn spawn_sleeper() -> tokio::process::Child {
        Command::new("sleep")
            .arg("10")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_breach_kills_child() {
        let mut child = spawn_sleeper();
        let pid = child.id().unwrap();

        let probe = FixedProbe::new(Some(64 * 1024 * 1024));
        let mut handle =
            MemoryWatchdog::new(pid, 32 * 1024 * 1024, Duration::from_millis(5), probe).spawn();

        tokio::time::timeout(Duration::from_secs(5), handle.breached_signal())
            .await
            .expect("watchdog should report the breach");
        assert!(handle.is_breached());

        let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .expect("child should be dead")
            .unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));

        let report = handle.stop().await.unwrap();
        assert!(report.breached);
        assert_eq!(report.samples, 1);
        assert_eq!(report.peak_bytes, 64 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_under_limit_keeps_sampling_until_stopped() {
        let mut child = spawn_sleeper();
        let pid = child.id().unwrap();

        let probe = FixedProbe::new(Some(1024));
        let handle =
            MemoryWatchdog::new(pid, 1024 * 1024, Duration::from_millis(5), probe.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let report = handle.stop().await.unwrap();

        assert!(!report.breached);
        assert!(report.samples >= 2);
        assert!(probe.calls.load(Ordering::SeqCst) >= 2);
        assert!(child.try_wait().unwrap().is_none(), "child must survive");
        child.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_signal_ends_sampling_before_join() {
        let mut child = spawn_sleeper();
        let pid = child.id().unwrap();

        let probe = FixedProbe::new(Some(1024));
        let mut handle =
            MemoryWatchdog::new(pid, 1024 * 1024, Duration::from_millis(5), probe.clone()).spawn();
        tokio::time::sleep(Duration::from_millis(20)).await;

        handle.stop_signal().unwrap().send();
        assert!(handle.stop_signal().is_none());
        tokio::time::sleep(Duration::from_millis(20)).await;
        let calls = probe.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), calls);

        let report = handle.stop().await.unwrap();
        assert!(!report.breached);
        child.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_vanished_process_ends_watch_quietly() {
        let probe = FixedProbe::new(None);
        let mut handle =
            MemoryWatchdog::new(u32::MAX - 1, 1024, Duration::from_millis(5), probe).spawn();

        // Ending without a breach must not fire the breach signal
        let fired = tokio::time::timeout(Duration::from_millis(100), handle.breached_signal()).await;
        assert!(fired.is_err());

        let report = handle.stop().await.unwrap();
        assert!(!report.breached);
        assert_eq!(report.samples, 0);
    }
}
