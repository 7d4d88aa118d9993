//! Debounced output capture channel
//!
//! A command's output is written into a [`CaptureWriter`] and delivered to a
//! [`CaptureReader`] in batches. Bytes accumulate until no write has happened
//! for the quiet period, or until the writer is flushed or closed, which keeps
//! the redraw rate bounded under high-frequency output.
//!
//! ```text
//!   router ──write──▶ CaptureWriter ──▶ debouncer task ──chunk──▶ CaptureReader
//!                       (clone-able)     (owns buffer +            (single reader)
//!                                          one timer)
//! ```
//!
//! Every byte written before [`CaptureWriter::close`] is delivered exactly
//! once and in order.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Events sent from writers to the debouncer task
enum CaptureEvent {
    Data(Vec<u8>),
    Flush,
    Close,
}

struct WriterState {
    tx: mpsc::UnboundedSender<CaptureEvent>,
    closed: Mutex<bool>,
}

/// Write half of a capture channel
///
/// Cloning the writer shares the same channel. Dropping every clone has the
/// same effect as [`close`](Self::close).
#[derive(Clone)]
pub struct CaptureWriter {
    state: Arc<WriterState>,
}

/// Read half of a capture channel
pub struct CaptureReader {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Create a capture channel with the given quiet period
///
/// Must be called from within a tokio runtime, as the debouncer runs on its
/// own task.
#[must_use]
pub fn capture_channel(quiet_period: Duration) -> (CaptureWriter, CaptureReader) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();

    tokio::spawn(debounce(event_rx, chunk_tx, quiet_period));

    let writer = CaptureWriter {
        state: Arc::new(WriterState {
            tx: event_tx,
            closed: Mutex::new(false),
        }),
    };
    (writer, CaptureReader { rx: chunk_rx })
}

impl CaptureWriter {
    /// Append bytes and restart the quiet period
    ///
    /// # Errors
    /// Returns `BrokenPipe` once the writer has been closed
    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<usize> {
        let closed = self.state.closed.lock();
        if *closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "capture channel closed",
            ));
        }
        if bytes.is_empty() {
            return Ok(0);
        }

        self.state
            .tx
            .send(CaptureEvent::Data(bytes.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "capture channel closed"))?;
        Ok(bytes.len())
    }

    /// Deliver whatever is buffered without waiting for the quiet period
    pub fn flush_now(&self) {
        let closed = self.state.closed.lock();
        if !*closed {
            let _ = self.state.tx.send(CaptureEvent::Flush);
        }
    }

    /// Flush the remaining bytes and close the channel permanently
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut closed = self.state.closed.lock();
        if *closed {
            return;
        }
        *closed = true;
        let _ = self.state.tx.send(CaptureEvent::Close);
    }

    /// Returns true once [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.state.closed.lock()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_now();
        Ok(())
    }
}

impl std::fmt::Debug for CaptureWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureWriter")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CaptureReader {
    /// Receive the next chunk, or `None` once the channel is closed and drained
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Collect every remaining chunk until the channel closes
    pub async fn read_to_end(mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.rx.recv().await {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// Debouncer task: owns the pending buffer and the single quiet-period timer
async fn debounce(
    mut events: mpsc::UnboundedReceiver<CaptureEvent>,
    chunks: mpsc::UnboundedSender<Vec<u8>>,
    quiet_period: Duration,
) {
    let mut buffer: Vec<u8> = Vec::new();
    let timer = tokio::time::sleep(quiet_period);
    tokio::pin!(timer);
    let mut armed = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(CaptureEvent::Data(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    timer.as_mut().reset(Instant::now() + quiet_period);
                    armed = true;
                }
                Some(CaptureEvent::Flush) => {
                    deliver(&mut buffer, &chunks);
                    armed = false;
                }
                Some(CaptureEvent::Close) | None => {
                    deliver(&mut buffer, &chunks);
                    break;
                }
            },
            () = &mut timer, if armed => {
                deliver(&mut buffer, &chunks);
                armed = false;
            }
        }
    }
}

fn deliver(buffer: &mut Vec<u8>, chunks: &mpsc::UnboundedSender<Vec<u8>>) {
    if buffer.is_empty() {
        return;
    }
    if chunks.send(std::mem::take(buffer)).is_err() {
        log::debug!("Capture reader dropped, discarding output chunk");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn burst_is_delivered_as_one_chunk() {
        let (mut writer, mut reader) = capture_channel(Duration::from_millis(50));
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();

        let chunk = tokio::time::timeout(Duration::from_secs(2), reader.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunk, b"hello world");
    }

    #[tokio::test]
    async fn close_flushes_and_rejects_writes() {
        let (mut writer, reader) = capture_channel(Duration::from_secs(60));
        writer.write_all(b"pending").unwrap();
        writer.close();
        writer.close();

        assert!(writer.write_all(b"late").is_err());
        assert!(writer.is_closed());
        assert_eq!(reader.read_to_end().await, b"pending");
    }

    #[tokio::test]
    async fn explicit_flush_skips_the_quiet_period() {
        let (mut writer, mut reader) = capture_channel(Duration::from_secs(60));
        writer.write_all(b"now").unwrap();
        writer.flush().unwrap();

        let chunk = tokio::time::timeout(Duration::from_secs(2), reader.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunk, b"now");
    }

    #[tokio::test]
    async fn dropping_writers_closes_the_channel() {
        let (writer, reader) = capture_channel(Duration::from_secs(60));
        let clone = writer.clone();
        clone.write_bytes(b"a").unwrap();
        writer.write_bytes(b"b").unwrap();
        drop(clone);
        drop(writer);

        assert_eq!(reader.read_to_end().await, b"ab");
    }
}
