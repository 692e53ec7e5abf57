use log::debug;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Chunks read off the line, or the error that stopped the reader.
pub(crate) type Chunk = io::Result<Vec<u8>>;

/// Spawns a background thread that reads from the line until `stop` is set,
/// the receiver is dropped, or the device fails.
///
/// The reader must block for a bounded time per call (serial ports are
/// opened with a short timeout) so that `stop` is noticed.
pub(crate) fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    stop: Arc<AtomicBool>,
) -> (UnboundedReceiver<Chunk>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        while !stop.load(Ordering::Relaxed) {
            match reader.read(&mut buffer) {
                // No data, not EOF: a tty in non-canonical mode returns 0 on timeout.
                Ok(0) => thread::sleep(Duration::from_millis(10)),
                Ok(n) => {
                    if tx.send(Ok(buffer[..n].to_vec())).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    debug!("serial reader stopped: {e}");
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });

    (rx, handle)
}

/// The receiving end of [`spawn_reader`], with bytes left over from chunks
/// that were only partly read.
pub(crate) struct ChunkQueue {
    rx: UnboundedReceiver<Chunk>,
    pending: VecDeque<u8>,
}

impl ChunkQueue {
    pub(crate) fn new(rx: UnboundedReceiver<Chunk>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
        }
    }

    /// Wait up to `timeout` for bytes and return at most `max` of them.
    ///
    /// Nothing arriving in time yields an empty vector. A reader that has
    /// stopped yields `BrokenPipe` once its queued bytes are consumed.
    pub(crate) async fn read(
        &mut self,
        timeout: Duration,
        max: Option<usize>,
    ) -> io::Result<Vec<u8>> {
        if self.pending.is_empty() {
            match tokio::time::timeout(timeout, self.rx.recv()).await {
                Ok(Some(chunk)) => self.pending.extend(chunk?),
                Ok(None) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "serial reader stopped",
                    ));
                }
                Err(_) => return Ok(Vec::new()),
            }
        }
        // Pick up anything else that is already here.
        while let Ok(chunk) = self.rx.try_recv() {
            self.pending.extend(chunk?);
        }
        let n = max.map_or(self.pending.len(), |m| m.min(self.pending.len()));
        Ok(self.pending.drain(..n).collect())
    }

    /// Drop everything received but not yet read.
    pub(crate) fn clear(&mut self) -> io::Result<()> {
        self.pending.clear();
        while let Ok(chunk) = self.rx.try_recv() {
            chunk?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    /// Hands out scripted results, then reports a timeout forever.
    struct ScriptedLine(VecDeque<io::Result<Vec<u8>>>);

    impl Read for ScriptedLine {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => {
                    thread::sleep(Duration::from_millis(5));
                    Err(io::ErrorKind::TimedOut.into())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_forwards_chunks_and_skips_timeouts() {
        let line = ScriptedLine(VecDeque::from([
            Ok(b"login".to_vec()),
            Err(io::ErrorKind::TimedOut.into()),
            Ok(b": ".to_vec()),
        ]));
        let stop = Arc::new(AtomicBool::new(false));
        let (mut rx, handle) = spawn_reader(line, stop.clone());

        assert_eq!(rx.recv().await.unwrap().unwrap(), b"login");
        assert_eq!(rx.recv().await.unwrap().unwrap(), b": ");

        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_forwards_device_error() {
        let line = ScriptedLine(VecDeque::from([Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))]));
        let (mut rx, handle) = spawn_reader(line, Arc::new(AtomicBool::new(false)));

        let err = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(rx.recv().await.is_none());
        handle.join().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_read_times_out_empty() {
        let (_tx, rx) = mpsc::unbounded_channel::<Chunk>();
        let mut queue = ChunkQueue::new(rx);
        let start = Instant::now();

        let data = queue.read(Duration::from_secs(1), None).await.unwrap();

        assert!(data.is_empty());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1010), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_keeps_unread_bytes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut queue = ChunkQueue::new(rx);
        tx.send(Ok(b"lo".to_vec())).unwrap();
        tx.send(Ok(b"gin:".to_vec())).unwrap();

        let first = queue.read(Duration::from_secs(1), Some(1)).await.unwrap();
        assert_eq!(first, b"l");

        let rest = queue.read(Duration::from_secs(1), None).await.unwrap();
        assert_eq!(rest, b"ogin:");
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_stopped_reader_is_broken_pipe() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut queue = ChunkQueue::new(rx);
        tx.send(Ok(b"bye".to_vec())).unwrap();
        drop(tx);

        let data = queue.read(Duration::from_secs(1), None).await.unwrap();
        assert_eq!(data, b"bye");

        let err = queue.read(Duration::from_secs(1), None).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_forwards_device_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut queue = ChunkQueue::new(rx);
        tx.send(Err(io::Error::new(io::ErrorKind::PermissionDenied, "revoked")))
            .unwrap();

        let err = queue.read(Duration::from_secs(1), None).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_clear_discards_queued_chunks() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut queue = ChunkQueue::new(rx);
        tx.send(Ok(b"stale output".to_vec())).unwrap();
        queue.clear().unwrap();

        let data = queue.read(Duration::from_millis(200), None).await.unwrap();
        assert!(data.is_empty());

        tx.send(Ok(b"fresh".to_vec())).unwrap();
        let data = queue.read(Duration::from_millis(200), None).await.unwrap();
        assert_eq!(data, b"fresh");
    }
}
