//! Named paint and clip resources.
//!
//! Patterns and clip paths are never drawn in place. Their content is
//! emitted as a definition right before the style entry that references
//! them, once per reference.

use super::{Build, Node, NodeId};
use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::{EmitContext, Primitive};
use crate::error::{Result, RvgError};
use crate::units::{finite, non_negative};
use crate::viewport::{emit_viewport, ViewportSettings};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// A tile of content used as fill or stroke paint.
#[derive(Debug, Clone)]
pub struct Pattern {
    id: NodeId,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    settings: ViewportSettings,
    children: Vec<Node>,
}

impl Pattern {
    pub fn new(width: f64, height: f64, x: f64, y: f64) -> Result<Self> {
        Ok(Self {
            id: NodeId::new(),
            x: finite("pattern x", x)?,
            y: finite("pattern y", y)?,
            width: non_negative("pattern width", width)?,
            height: non_negative("pattern height", height)?,
            settings: ViewportSettings::default(),
            children: Vec::new(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Resource name used by the backend.
    pub fn name(&self) -> String {
        format!("pattern-{}", self.id)
    }

    pub fn viewbox(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<&mut Self> {
        self.settings.set_viewbox(x, y, width, height)?;
        Ok(self)
    }

    pub fn preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<&mut Self> {
        self.settings.set_preserve_aspect_ratio(align, meet_or_slice)?;
        Ok(self)
    }

    pub(crate) fn emit_definition(&self, ctx: &mut EmitContext<'_>) -> Result<()> {
        let name = self.name();
        ctx.begin_pattern(Primitive::BeginPattern {
            name: name.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        });
        if self.width > 0.0 && self.height > 0.0 {
            emit_viewport(ctx, &format!("{name}-clip"), self.width, self.height, &self.settings);
            for child in &self.children {
                child.emit(ctx)?;
            }
        }
        ctx.end_pattern();
        Ok(())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
            && self.settings == other.settings
            && self.children == other.children
    }
}

impl Build for Pattern {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

impl DeepCopy for Pattern {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Pattern {
            id: cx.remap(self.id),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            settings: self.settings,
            children: self.children.deep_copy_with(cx),
        }
    }
}

/// Shared, immutable handle to a finished pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRef(Arc<Pattern>);

impl PatternRef {
    pub fn new(pattern: Pattern) -> Self {
        PatternRef(Arc::new(pattern))
    }

    pub fn ptr_eq(&self, other: &PatternRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for PatternRef {
    type Target = Pattern;

    fn deref(&self) -> &Pattern {
        &self.0
    }
}

impl DeepCopy for PatternRef {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        PatternRef(cx.shared(&self.0))
    }
}

/// Coordinate system of clip path content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipUnits {
    #[default]
    UserSpaceOnUse,
    ObjectBoundingBox,
}

impl FromStr for ClipUnits {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "userSpaceOnUse" => Ok(ClipUnits::UserSpaceOnUse),
            "objectBoundingBox" => Ok(ClipUnits::ObjectBoundingBox),
            other => Err(RvgError::validation(format!(
                "unsupported clip path units `{other}` (expected userSpaceOnUse or objectBoundingBox)"
            ))),
        }
    }
}

impl fmt::Display for ClipUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipUnits::UserSpaceOnUse => f.write_str("userSpaceOnUse"),
            ClipUnits::ObjectBoundingBox => f.write_str("objectBoundingBox"),
        }
    }
}

/// Content whose union is used as a clip region.
#[derive(Debug, Clone)]
pub struct ClipPath {
    id: NodeId,
    units: ClipUnits,
    children: Vec<Node>,
}

impl ClipPath {
    pub fn new(units: ClipUnits) -> Self {
        Self {
            id: NodeId::new(),
            units,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn units(&self) -> ClipUnits {
        self.units
    }

    pub fn name(&self) -> String {
        format!("clip-{}", self.id)
    }

    pub(crate) fn emit_definition(&self, ctx: &mut EmitContext<'_>) -> Result<()> {
        ctx.primitive(Primitive::BeginClipPath { name: self.name() });
        ctx.primitive(Primitive::ClipUnits(self.units));
        for child in &self.children {
            child.emit(ctx)?;
        }
        ctx.primitive(Primitive::EndClipPath);
        Ok(())
    }
}

impl PartialEq for ClipPath {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units && self.children == other.children
    }
}

impl Build for ClipPath {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

impl DeepCopy for ClipPath {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        ClipPath {
            id: cx.remap(self.id),
            units: self.units,
            children: self.children.deep_copy_with(cx),
        }
    }
}

/// Shared, immutable handle to a finished clip path.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPathRef(Arc<ClipPath>);

impl ClipPathRef {
    pub fn new(clip_path: ClipPath) -> Self {
        ClipPathRef(Arc::new(clip_path))
    }

    pub fn ptr_eq(&self, other: &ClipPathRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ClipPathRef {
    type Target = ClipPath;

    fn deref(&self) -> &ClipPath {
        &self.0
    }
}

impl DeepCopy for ClipPathRef {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        ClipPathRef(cx.shared(&self.0))
    }
}
