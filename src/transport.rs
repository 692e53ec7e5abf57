//! The [`Transport`] trait: the byte channel the login controller drives.

use async_trait::async_trait;
use std::io;
use std::time::Duration;

/// An opened, configured byte-duplex channel to a remote console.
///
/// Implemented by [`crate::SerialTransport`] for real lines. The controller
/// and the timed reader only ever use this trait.
#[async_trait(?Send)]
pub trait Transport {
    /// Send bytes. A failure here ends the run.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Return bytes that arrive within the current [`timeout`](Self::timeout),
    /// at most `max` of them when given.
    ///
    /// An empty vector means nothing arrived in time; that is not an error.
    async fn read(&mut self, max: Option<usize>) -> io::Result<Vec<u8>>;

    /// How long a single [`read`](Self::read) may block.
    fn timeout(&self) -> Duration;

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Discard received bytes that have not been read yet.
    fn flush_input(&mut self) -> io::Result<()>;

    /// Discard written bytes that have not been sent yet.
    fn flush_output(&mut self) -> io::Result<()>;

    /// Re-apply the line settings; `force` resets the line first.
    fn reconfigure(&mut self, force: bool) -> io::Result<()>;
}
