//! The raster backend seam.
//!
//! A backend answers glyph metric queries while the scene is compiled, then
//! creates canvases and renders primitive streams onto them.

use crate::emit::Primitive;
use crate::error::{BackendResult, Result, RvgError};
use crate::node::{Description, RasterImage};
use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Font selection mirrored from the font styles in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Explicit font name or file, from the `font` style.
    pub font: Option<String>,
    pub family: Option<String>,
    pub size: f64,
    pub style: Option<String>,
    pub weight: Option<String>,
    pub stretch: Option<String>,
}

impl FontSpec {
    pub const DEFAULT_SIZE: f64 = 12.0;
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            font: None,
            family: None,
            size: Self::DEFAULT_SIZE,
            style: None,
            weight: None,
            stretch: None,
        }
    }
}

/// Metrics of a probe string under a font and transform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlyphMetrics {
    pub width: f64,
    pub ascent: f64,
    /// Negative below the baseline.
    pub descent: f64,
}

/// Source of glyph metrics.
pub trait GlyphMetricsSource {
    fn glyph_metrics(&mut self, probe: &str, font: &FontSpec, affine: Affine) -> BackendResult<GlyphMetrics>;
}

/// A raster backend.
pub trait Backend: GlyphMetricsSource {
    type Canvas;

    fn create_canvas(&mut self, spec: &CanvasSpec) -> BackendResult<Self::Canvas>;

    /// Render a balanced primitive stream onto `canvas`.
    fn render(&mut self, canvas: &mut Self::Canvas, primitives: &[Primitive]) -> BackendResult<()>;
}

/// How a background image covers the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPosition {
    #[default]
    Scaled,
    Tiled,
    /// Fit inside, centred over the background colour.
    Fit,
}

impl FromStr for BackgroundPosition {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "scaled" => Ok(BackgroundPosition::Scaled),
            "tiled" => Ok(BackgroundPosition::Tiled),
            "fit" => Ok(BackgroundPosition::Fit),
            other => Err(RvgError::validation(format!(
                "unsupported background position `{other}` (expected scaled, tiled or fit)"
            ))),
        }
    }
}

/// A solid background colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub color: String,
    pub opacity: f64,
}

/// The initial canvas content.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasFill {
    Texture(Arc<RasterImage>),
    Image {
        image: Arc<RasterImage>,
        position: BackgroundPosition,
        backdrop: Option<Backdrop>,
    },
    Color(Backdrop),
    Transparent,
}

impl CanvasFill {
    /// Whether the background image repeats at its natural size.
    pub fn is_tiled(&self) -> bool {
        match self {
            CanvasFill::Texture(_) => true,
            CanvasFill::Image { position, .. } => *position == BackgroundPosition::Tiled,
            CanvasFill::Color(_) | CanvasFill::Transparent => false,
        }
    }

    /// Rectangles the background image is drawn into on a canvas of the
    /// given size. A tiled fill yields its origin tile only; backends repeat
    /// it across the canvas.
    pub fn image_rects(&self, width: f64, height: f64) -> Vec<Rect> {
        match self {
            CanvasFill::Texture(image) => vec![origin_tile(image)],
            CanvasFill::Image { image, position, .. } => {
                let (iw, ih) = image_size(image);
                if iw == width && ih == height {
                    return vec![Rect::new(0.0, 0.0, width, height)];
                }
                match position {
                    BackgroundPosition::Scaled => vec![Rect::new(0.0, 0.0, width, height)],
                    BackgroundPosition::Tiled => vec![origin_tile(image)],
                    BackgroundPosition::Fit => {
                        let scale = (width / iw).min(height / ih);
                        let (w, h) = (iw * scale, ih * scale);
                        let (x, y) = ((width - w) / 2.0, (height - h) / 2.0);
                        vec![Rect::new(x, y, x + w, y + h)]
                    }
                }
            }
            CanvasFill::Color(_) | CanvasFill::Transparent => Vec::new(),
        }
    }
}

fn image_size(image: &RasterImage) -> (f64, f64) {
    (f64::from(image.width()), f64::from(image.height()))
}

fn origin_tile(image: &RasterImage) -> Rect {
    let (iw, ih) = image_size(image);
    Rect::new(0.0, 0.0, iw, ih)
}

/// Everything a backend needs to create a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub fill: CanvasFill,
    pub description: Description,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> Arc<RasterImage> {
        Arc::new(RasterImage::solid(w, h, [0, 0, 0, 255]).unwrap())
    }

    #[test]
    fn test_scaled_covers_canvas() {
        let fill = CanvasFill::Image {
            image: image(10, 10),
            position: BackgroundPosition::Scaled,
            backdrop: None,
        };
        assert_eq!(fill.image_rects(40.0, 20.0), vec![Rect::new(0.0, 0.0, 40.0, 20.0)]);
    }

    #[test]
    fn test_tiled_repeats() {
        let fill = CanvasFill::Image {
            image: image(10, 10),
            position: BackgroundPosition::Tiled,
            backdrop: None,
        };
        assert!(fill.is_tiled());
        assert_eq!(fill.image_rects(25.0, 10.0), vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_small_texture_on_large_canvas_is_one_tile() {
        let fill = CanvasFill::Texture(image(1, 1));
        assert!(fill.is_tiled());
        assert_eq!(fill.image_rects(3000.0, 3000.0), vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
    }

    #[test]
    fn test_fit_centres() {
        let fill = CanvasFill::Image {
            image: image(10, 20),
            position: BackgroundPosition::Fit,
            backdrop: Some(Backdrop {
                color: "white".into(),
                opacity: 1.0,
            }),
        };
        assert_eq!(fill.image_rects(40.0, 40.0), vec![Rect::new(10.0, 0.0, 30.0, 40.0)]);
    }

    #[test]
    fn test_position_keywords() {
        assert_eq!("tiled".parse::<BackgroundPosition>().unwrap(), BackgroundPosition::Tiled);
        assert!("stretched".parse::<BackgroundPosition>().is_err());
    }
}
