//! Viewport containers: the payload of the scene root and of nested scenes.

use super::{Build, Node, NodeId};
use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::EmitContext;
use crate::error::Result;
use crate::transform::TransformOp;
use crate::units::{finite, non_negative};
use crate::viewport::{emit_viewport, ViewportSettings};

/// A container that establishes a new viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    settings: ViewportSettings,
    children: Vec<Node>,
}

impl Viewport {
    pub fn new(width: f64, height: f64, x: f64, y: f64) -> Result<Self> {
        Ok(Self {
            x: finite("rvg x", x)?,
            y: finite("rvg y", y)?,
            width: non_negative("rvg width", width)?,
            height: non_negative("rvg height", height)?,
            settings: ViewportSettings::default(),
            children: Vec::new(),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn viewbox(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<&mut Self> {
        self.settings.set_viewbox(x, y, width, height)?;
        Ok(self)
    }

    pub fn preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<&mut Self> {
        self.settings.set_preserve_aspect_ratio(align, meet_or_slice)?;
        Ok(self)
    }

    pub(crate) fn resize(&mut self, width: Option<f64>, height: Option<f64>) -> Result<()> {
        if let Some(w) = width {
            self.width = non_negative("rvg width", w)?;
        }
        if let Some(h) = height {
            self.height = non_negative("rvg height", h)?;
        }
        Ok(())
    }

    /// Translate to the origin, establish the viewport, then draw children.
    /// A zero-sized viewport draws nothing.
    pub(crate) fn emit_content(&self, ctx: &mut EmitContext<'_>, id: NodeId) -> Result<()> {
        if self.x != 0.0 || self.y != 0.0 {
            ctx.transform(TransformOp::Translate { tx: self.x, ty: self.y });
        }
        if self.width == 0.0 || self.height == 0.0 {
            return Ok(());
        }
        emit_viewport(ctx, &format!("viewport-{id}"), self.width, self.height, &self.settings);
        for child in &self.children {
            child.emit(ctx)?;
        }
        Ok(())
    }
}

impl Build for Viewport {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

impl DeepCopy for Viewport {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Viewport {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            settings: self.settings,
            children: self.children.deep_copy_with(cx),
        }
    }
}
