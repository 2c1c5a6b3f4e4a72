//! RVG Render Library
//!
//! Raster backends for RVG scenes. The default backend draws into a Vello
//! scene and measures glyphs with Parley.

mod decode;
mod paint;

#[cfg(feature = "vello-renderer")]
mod fonts;
#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use decode::{decode_image, image_data};
pub use paint::{parse_color, PaintSource, PaintState};

#[cfg(feature = "vello-renderer")]
pub use fonts::TextEngine;
#[cfg(feature = "vello-renderer")]
pub use vello_impl::{VelloBackend, VelloCanvas};
