use std::time::Duration;

use crate::error::JudgeError;

/// Default wall-clock limit in seconds
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 2.0;
/// Default resident memory ceiling in MB
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Resource limits applied to every test case of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
    time_limit: Duration,
    memory_limit_mb: Option<u64>,
}

impl ResourceLimits {
    /// Create limits from a time limit in seconds and an optional memory limit in MB
    pub fn new(time_limit_secs: f64, memory_limit_mb: Option<u64>) -> Result<Self, JudgeError> {
        let limits = Self::unconstrained(time_limit_secs)?;
        match memory_limit_mb {
            Some(mb) => limits.with_memory_limit(mb),
            None => Ok(limits),
        }
    }

    /// Time limit only, no memory ceiling
    pub fn unconstrained(time_limit_secs: f64) -> Result<Self, JudgeError> {
        if !time_limit_secs.is_finite() || time_limit_secs <= 0.0 {
            return Err(JudgeError::InvalidTimeLimit(time_limit_secs));
        }
        let time_limit = Duration::try_from_secs_f64(time_limit_secs)
            .map_err(|_| JudgeError::InvalidTimeLimit(time_limit_secs))?;
        Ok(Self {
            time_limit,
            memory_limit_mb: None,
        })
    }

    /// Time limit only, from an already valid duration
    pub(crate) fn wall_clock(time_limit: Duration) -> Self {
        Self {
            time_limit,
            memory_limit_mb: None,
        }
    }

    pub fn with_time_limit(self, time_limit_secs: f64) -> Result<Self, JudgeError> {
        let time_limit = Self::unconstrained(time_limit_secs)?.time_limit;
        Ok(Self { time_limit, ..self })
    }

    pub fn with_memory_limit(self, memory_limit_mb: u64) -> Result<Self, JudgeError> {
        if memory_limit_mb == 0 || memory_limit_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(JudgeError::InvalidMemoryLimit(memory_limit_mb));
        }
        Ok(Self {
            memory_limit_mb: Some(memory_limit_mb),
            ..self
        })
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn memory_limit_mb(&self) -> Option<u64> {
        self.memory_limit_mb
    }

    /// Memory ceiling in bytes, if any
    pub fn memory_limit_bytes(&self) -> Option<u64> {
        self.memory_limit_mb.map(|mb| mb.saturating_mul(BYTES_PER_MB))
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs_f64(DEFAULT_TIME_LIMIT_SECS),
            memory_limit_mb: Some(DEFAULT_MEMORY_LIMIT_MB),
        }
    }
}
