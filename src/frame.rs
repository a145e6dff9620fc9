use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::error::MediaError;

/// Immutable RGBA pixel buffer shared between the camera, the session and
/// the renderer.
///
/// Cloning is cheap: the pixel data sits behind an `Arc`. Frames are never
/// written after construction; whoever wants a different picture builds a
/// new frame and replaces the old one.
#[derive(Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Frame {
    /// Wraps raw RGBA bytes. The length is not checked against the
    /// dimensions; readers bound every access themselves.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A frame without pixel data.
    pub fn empty() -> Self {
        Self::from_rgba(0, 0, Vec::new())
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        RgbaImage::from_pixel(width, height, Rgba(rgba)).into()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| MediaError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(img.to_rgba8().into())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// True when there is nothing to sample.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Whether both frames point at the same pixel allocation.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl From<RgbaImage> for Frame {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

const PLACEHOLDER_SIZE: u32 = 200;
const PLACEHOLDER_BACKGROUND: u8 = 240;
const PLACEHOLDER_STRIPE_PITCH: u32 = 10;
const PLACEHOLDER_STRIPE_WIDTH: u32 = 6;

/// Striped gray card woven until the first photo is taken.
pub fn placeholder() -> Frame {
    RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, _| {
        let stripe_start = x - x % PLACEHOLDER_STRIPE_PITCH;
        let v = if x % PLACEHOLDER_STRIPE_PITCH < PLACEHOLDER_STRIPE_WIDTH {
            (200 - stripe_start % 30) as u8
        } else {
            PLACEHOLDER_BACKGROUND
        };
        Rgba([v, v, v, 255])
    })
    .into()
}
