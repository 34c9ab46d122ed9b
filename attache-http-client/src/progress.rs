//! Upload progress tracking.
//!
//! Request bodies are wrapped in a counting stream: every chunk handed to
//! the connection advances a [`ProgressTracker`], which reports an
//! [`UploadProgress`] whenever the rounded percentage increases.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Chunk size used when streaming in-memory payloads.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A single progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Rounded completion percentage, `0..=100`.
    pub percent: u8,
    /// Bytes handed to the connection so far.
    pub bytes_sent: u64,
    /// Total bytes to send.
    pub bytes_total: u64,
}

/// Progress observer callback.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Bridge progress notifications to an async receiver.
///
/// The returned callback never blocks; events are dropped once the
/// receiver is gone.
pub fn progress_channel() -> (ProgressFn, mpsc::UnboundedReceiver<UploadProgress>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer: ProgressFn = Arc::new(move |progress| {
        let _ = tx.send(progress);
    });
    (observer, rx)
}

/// Converts byte counts into strictly increasing percentages.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    sent: u64,
    total: Option<u64>,
    last_percent: Option<u8>,
}

impl ProgressTracker {
    /// Create a tracker. Without a known, non-zero total nothing is reported.
    pub fn new(total: Option<u64>) -> Self {
        Self {
            sent: 0,
            total: total.filter(|t| *t > 0),
            last_percent: None,
        }
    }

    /// Record `bytes` more sent. Returns a notification only when the
    /// rounded percentage moved forward.
    pub fn advance(&mut self, bytes: u64) -> Option<UploadProgress> {
        let total = self.total?;
        self.sent = self.sent.saturating_add(bytes).min(total);

        let percent = ((self.sent as f64 / total as f64) * 100.0).round() as u8;
        if self.last_percent.is_some_and(|last| percent <= last) {
            return None;
        }
        self.last_percent = Some(percent);

        Some(UploadProgress {
            percent,
            bytes_sent: self.sent,
            bytes_total: total,
        })
    }
}

/// Split an in-memory payload into a stream of chunks.
pub fn chunked(data: Bytes, chunk_size: usize) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    let len = data.len();
    let chunks: Vec<io::Result<Bytes>> = (0..len)
        .step_by(chunk_size)
        .map(|start| Ok(data.slice(start..(start + chunk_size).min(len))))
        .collect();
    futures::stream::iter(chunks)
}

/// Wrap a body stream so each chunk reports progress to `observer`.
pub fn track<S>(
    stream: S,
    total: Option<u64>,
    observer: ProgressFn,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let mut tracker = ProgressTracker::new(total);
    stream.map(move |chunk| {
        if let Ok(bytes) = &chunk
            && let Some(progress) = tracker.advance(bytes.len() as u64)
        {
            observer(progress);
        }
        chunk
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_tracker_rounds_and_never_repeats() {
        let mut tracker = ProgressTracker::new(Some(1000));

        assert_eq!(tracker.advance(4).map(|p| p.percent), Some(0));
        assert_eq!(tracker.advance(1), None);
        let half = tracker.advance(495).unwrap();
        assert_eq!(half.percent, 50);
        assert_eq!(half.bytes_sent, 500);
        assert_eq!(tracker.advance(2), None);
        let done = tracker.advance(498).unwrap();
        assert_eq!(done.percent, 100);
        assert_eq!(done.bytes_total, 1000);
        assert_eq!(tracker.advance(10), None);
    }

    #[test]
    fn test_tracker_without_total_is_silent() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.advance(10), None);

        let mut empty = ProgressTracker::new(Some(0));
        assert_eq!(empty.advance(0), None);
    }

    #[tokio::test]
    async fn test_track_reports_strictly_increasing_percentages() {
        let data = Bytes::from(vec![7u8; 10 * 1024]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p.percent));

        let stream = track(chunked(data, 1024), Some(10 * 1024), observer);
        let chunks: Vec<_> = stream.collect().await;

        assert_eq!(chunks.len(), 10);
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[tokio::test]
    async fn test_progress_channel() {
        let (observer, mut rx) = progress_channel();
        observer(UploadProgress {
            percent: 42,
            bytes_sent: 42,
            bytes_total: 100,
        });
        drop(observer);

        assert_eq!(rx.recv().await.map(|p| p.percent), Some(42));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_chunked_covers_all_bytes() {
        let data = Bytes::from_static(b"abcdefghij");
        let chunks: Vec<_> = futures::executor::block_on(chunked(data, 4).collect::<Vec<_>>());
        let lens: Vec<_> = chunks.into_iter().map(|c| c.unwrap().len()).collect();
        assert_eq!(lens, vec![4, 4, 2]);
    }
}
