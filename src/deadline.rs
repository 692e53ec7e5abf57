//! Overall cutoff for a login attempt.

use crate::error::ConfigError;
use std::time::Duration;
use tokio::time::Instant;

/// An absolute point in time after which waiting for the login prompt stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now() + duration)
    }

    /// Validate an end time given in seconds and turn it into a deadline.
    pub fn from_secs(secs: f64) -> Result<Self, ConfigError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::EndTime(secs));
        }
        Ok(Self::after(Duration::from_secs_f64(secs)))
    }

    pub fn has_passed(&self) -> bool {
        Instant::now() >= self.0
    }
}
