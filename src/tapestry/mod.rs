//! Procedural woven background.
//!
//! The source picture is never drawn directly. Instead a grid of warp
//! (vertical) and weft (horizontal) threads is laid over the canvas; each
//! crossing samples the picture and decides by luminance which thread shows
//! on top.

pub mod noise;
pub mod pan;
pub mod renderer;
pub mod sampler;

pub use noise::{Axis, NoiseField, value_noise};
pub use pan::{PanOffset, Vec2};
pub use renderer::{Crossing, TapestryRenderer};
pub use sampler::PixelSampler;
