use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::GalleryFull;
use crate::frame::Frame;
use crate::tapestry::Vec2;

/// One captured data point: the photo plus what the visitor did since the
/// previous capture.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) index: usize,
    pub(crate) captured_at: DateTime<Utc>,
    pub(crate) photo: Frame,
    pub(crate) mean_pointer: Option<Vec2>,
    pub(crate) clicks: u32,
    pub(crate) keys: u32,
    pub(crate) mic_level: f32,
}

impl Snapshot {
    /// Zero-based position in the session.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// ISO-8601 with milliseconds and a `Z` suffix.
    pub fn timestamp(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn photo(&self) -> &Frame {
        &self.photo
    }

    /// Average pointer position over the interval; `None` when the pointer
    /// was never sampled.
    pub fn mean_pointer(&self) -> Option<Vec2> {
        self.mean_pointer
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn keys(&self) -> u32 {
        self.keys
    }

    pub fn mic_level(&self) -> f32 {
        self.mic_level
    }
}

/// Snapshots of one session in capture order, plus the browse cursor.
#[derive(Debug, Clone)]
pub struct SnapshotGallery {
    snapshots: Vec<Snapshot>,
    capacity: usize,
    cursor: usize,
}

impl SnapshotGallery {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) -> Result<usize, GalleryFull> {
        if self.is_full() {
            return Err(GalleryFull {
                capacity: self.capacity,
            });
        }
        self.snapshots.push(snapshot);
        Ok(self.snapshots.len() - 1)
    }

    pub fn is_full(&self) -> bool {
        self.snapshots.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor one step, wrapping at the end.
    pub fn advance(&mut self) -> Option<&Snapshot> {
        if self.snapshots.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.snapshots.len();
        self.current()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
