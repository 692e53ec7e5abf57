//! Timed reads over a [`Transport`].
//!
//! Two disciplines:
//! - [`TimedReader::drain`] collects whatever arrives during a fixed window.
//! - [`TimedReader::read_until`] scans for a marker, byte by byte, until an
//!   optional [`Deadline`].
//!
//! Carriage returns are dropped before anything is accumulated, so markers
//! match regardless of the line endings the remote uses.

use crate::config::Verbosity;
use crate::deadline::Deadline;
use crate::matcher;
use crate::transport::Transport;
use log::debug;
use std::io;
use std::time::Duration;
use tokio::time::Instant;

/// Result of [`TimedReader::read_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadUntil {
    /// Whether the target appeared before the deadline.
    pub found: bool,
    /// Everything accumulated, up to and including the target when found.
    pub data: Vec<u8>,
}

/// Reads with the two timing disciplines the login handshake needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedReader {
    verbosity: Verbosity,
}

impl TimedReader {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Read for `duration`, regardless of content.
    ///
    /// The transport timeout is narrowed to the remaining window before every
    /// read and restored afterwards, even when a read fails. Never returns
    /// early because data stopped or a marker appeared; an empty result is
    /// normal.
    pub async fn drain<T>(&self, transport: &mut T, duration: Duration) -> io::Result<Vec<u8>>
    where
        T: Transport + ?Sized,
    {
        let prior = transport.timeout();
        let result = self.drain_window(transport, duration).await;
        transport.set_timeout(prior)?;
        result
    }

    async fn drain_window<T>(&self, transport: &mut T, duration: Duration) -> io::Result<Vec<u8>>
    where
        T: Transport + ?Sized,
    {
        let start = Instant::now();
        let mut buffer = Vec::new();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= duration {
                break;
            }
            transport.set_timeout(duration - elapsed)?;
            let chunk = transport.read(None).await?;
            self.trace(&chunk);
            buffer.extend(chunk.into_iter().filter(|&b| b != b'\r'));
        }
        debug!("drained {} bytes in {:?}", buffer.len(), start.elapsed());
        Ok(buffer)
    }

    /// Read one byte at a time until `target` appears or `deadline` passes.
    ///
    /// Stops at the first match and leaves anything after it on the line.
    /// The deadline is checked before every read, so the overshoot is at most
    /// one read timeout. Without a deadline this waits for as long as it takes.
    pub async fn read_until<T>(
        &self,
        transport: &mut T,
        deadline: Option<Deadline>,
        target: &str,
    ) -> io::Result<ReadUntil>
    where
        T: Transport + ?Sized,
    {
        let mut buffer = Vec::new();
        loop {
            if deadline.is_some_and(|d| d.has_passed()) {
                debug!("deadline passed waiting for {target:?}");
                return Ok(ReadUntil {
                    found: false,
                    data: buffer,
                });
            }

            let chunk = transport.read(Some(1)).await?;
            self.trace(&chunk);
            let Some(&byte) = chunk.first() else {
                continue;
            };
            if byte == b'\r' {
                continue;
            }
            buffer.push(byte);

            if matcher::contains(&buffer, target) {
                return Ok(ReadUntil {
                    found: true,
                    data: buffer,
                });
            }
        }
    }

    fn trace(&self, chunk: &[u8]) {
        if self.verbosity.traces_traffic() && !chunk.is_empty() {
            debug!("rx {}", chunk.escape_ascii());
        }
    }
}
