//! Raster image placement.

use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::{EmitContext, Primitive};
use crate::error::{Result, RvgError};
use crate::node::NodeId;
use crate::transform::TransformOp;
use crate::units::{finite, non_negative};
use crate::viewport::{emit_viewport, Align, PreserveAspectRatio, ViewBox, ViewportSettings};
use std::sync::Arc;

/// Decoded RGBA8 pixels, row-major, unpremultiplied.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RvgError::validation(format!(
                "raster image must not be empty ({width}x{height} given)"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RvgError::validation(format!(
                "raster image {width}x{height} needs {expected} RGBA bytes ({} given)",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// A single-colour image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgba.repeat(count))
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
}

impl DeepCopy for RasterImage {
    fn deep_copy_with(&self, _cx: &mut CopyContext) -> Self {
        self.clone()
    }
}

/// An image placed in a rectangle of the current user space.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    image: Arc<RasterImage>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    aspect: PreserveAspectRatio,
}

impl ImagePlacement {
    /// Width and height default to the image's own size.
    pub fn new(image: Arc<RasterImage>, width: Option<f64>, height: Option<f64>, x: f64, y: f64) -> Result<Self> {
        let width = match width {
            Some(w) => non_negative("image width", w)?,
            None => f64::from(image.width()),
        };
        let height = match height {
            Some(h) => non_negative("image height", h)?,
            None => f64::from(image.height()),
        };
        Ok(Self {
            image,
            x: finite("image x", x)?,
            y: finite("image y", y)?,
            width,
            height,
            aspect: PreserveAspectRatio::default(),
        })
    }

    pub fn image(&self) -> &Arc<RasterImage> {
        &self.image
    }

    pub(crate) fn preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<()> {
        self.aspect = PreserveAspectRatio::parse(align, meet_or_slice)?;
        Ok(())
    }

    pub(crate) fn place(&mut self, x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> Result<()> {
        self.x = finite("image x", x)?;
        self.y = finite("image y", y)?;
        if let Some(w) = width {
            self.width = non_negative("image width", w)?;
        }
        if let Some(h) = height {
            self.height = non_negative("image height", h)?;
        }
        Ok(())
    }

    pub(crate) fn emit_content(&self, ctx: &mut EmitContext<'_>, id: NodeId) {
        if self.width == 0.0 || self.height == 0.0 {
            return;
        }
        if self.aspect.align == Align::None {
            ctx.primitive(Primitive::Image {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                image: Arc::clone(&self.image),
            });
            return;
        }

        let (iw, ih) = (f64::from(self.image.width()), f64::from(self.image.height()));
        if self.x != 0.0 || self.y != 0.0 {
            ctx.transform(TransformOp::Translate { tx: self.x, ty: self.y });
        }
        let settings = ViewportSettings {
            view_box: Some(ViewBox {
                x: 0.0,
                y: 0.0,
                width: iw,
                height: ih,
            }),
            aspect: self.aspect,
        };
        emit_viewport(ctx, &format!("image-{id}"), self.width, self.height, &settings);
        ctx.primitive(Primitive::Image {
            x: 0.0,
            y: 0.0,
            width: iw,
            height: ih,
            image: Arc::clone(&self.image),
        });
    }
}

impl DeepCopy for ImagePlacement {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        ImagePlacement {
            image: cx.shared(&self.image),
            ..self.clone()
        }
    }
}
