use std::path::PathBuf;

use thiserror::Error;

/// Failures from the camera/microphone collaborators.
///
/// None of these stop the session: the viewer logs them, shows a notice and
/// keeps weaving from the placeholder with a silent microphone.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No camera could be opened.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// No microphone could be opened.
    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    /// An image file used as a frame source could not be decoded.
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Returned when a snapshot is pushed into a gallery that already holds the
/// whole session.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("snapshot gallery is full ({capacity} snapshots)")]
pub struct GalleryFull {
    pub capacity: usize,
}
