//! Resident memory sampling

use async_trait::async_trait;
use nix::errno::Errno;
use std::io;
use tokio::fs;

/// Source of resident memory samples for a process
#[async_trait]
pub trait MemoryProbe: Send + Sync {
    /// Resident set size of `pid` in bytes.
    ///
    /// Returns `Ok(None)` once the process is gone (or is a zombie without a
    /// resident set); that is an expected condition, not an error.
    async fn resident_bytes(&self, pid: u32) -> io::Result<Option<u64>>;
}

/// Reads `VmRSS` from `/proc/<pid>/status`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatusProbe;

#[async_trait]
impl MemoryProbe for ProcStatusProbe {
    async fn resident_bytes(&self, pid: u32) -> io::Result<Option<u64>> {
        let path = format!("/proc/{}/status", pid);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(parse_vm_rss(&content)),
            Err(e) if is_vanished(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_vanished(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(Errno::ESRCH as i32)
}

/// Parse the `VmRSS:` line of a proc status file into bytes
pub fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    let multiplier = match fields.next() {
        Some("kB") | None => 1024,
        Some("mB") | Some("MB") => 1024 * 1024,
        Some("B") => 1,
        Some(_) => return None,
    };
    Some(value * multiplier)
}
