//! Scene nodes.
//!
//! A [`Node`] is a [`NodeCore`] (identity, transforms, styles, description,
//! frozen flag) plus a closed [`NodeKind`] payload. The capabilities shared
//! by every node and by the scene root live on the core and are reached
//! through the [`Transformable`], [`Stylable`] and [`Describable`] traits.

mod build;
mod group;
mod image;
mod nested;
mod resource;
mod shapes;
mod text;

pub use build::Build;
pub use group::{Group, Use};
pub use image::{ImagePlacement, RasterImage};
pub use nested::Viewport;
pub use resource::{ClipPath, ClipPathRef, ClipUnits, Pattern, PatternRef};
pub use shapes::Shape;
pub use text::{TextBody, TextRun, Tref, Tspan};

use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::EmitContext;
use crate::error::{Result, RvgError};
use crate::style::{StyleTable, Value};
use crate::transform::TransformList;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Optional title, description and metadata strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub metadata: Option<String>,
}

/// State shared by every node.
#[derive(Debug, Clone, Default)]
pub struct NodeCore {
    id: NodeId,
    transforms: TransformList,
    styles: StyleTable,
    description: Description,
    frozen: bool,
}

impl NodeCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn transforms(&self) -> &TransformList {
        &self.transforms
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// Identity is not part of equality: a copy equals its original.
impl PartialEq for NodeCore {
    fn eq(&self, other: &Self) -> bool {
        self.transforms == other.transforms
            && self.styles == other.styles
            && self.description == other.description
            && self.frozen == other.frozen
    }
}

impl DeepCopy for NodeCore {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        NodeCore {
            id: cx.remap(self.id),
            transforms: self.transforms.clone(),
            styles: self.styles.deep_copy_with(cx),
            description: self.description.clone(),
            frozen: self.frozen,
        }
    }
}

/// Access to a node record.
pub trait HasCore {
    fn core(&self) -> &NodeCore;
    fn core_mut(&mut self) -> &mut NodeCore;
    /// Name used in error messages.
    fn kind_name(&self) -> &'static str;

    /// The core, or a validation error if the node is frozen.
    fn mutable_core(&mut self) -> Result<&mut NodeCore> {
        if self.core().frozen {
            return Err(RvgError::validation(format!("can't modify frozen {}", self.kind_name())));
        }
        Ok(self.core_mut())
    }
}

/// Transform setters, appended in call order.
pub trait Transformable: HasCore + Sized {
    fn translate(&mut self, tx: f64, ty: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.translate(tx, ty)?;
        Ok(self)
    }

    fn scale(&mut self, sx: f64, sy: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.scale(sx, sy)?;
        Ok(self)
    }

    fn rotate(&mut self, degrees: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.rotate(degrees)?;
        Ok(self)
    }

    fn rotate_about(&mut self, degrees: f64, cx: f64, cy: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.rotate_about(degrees, cx, cy)?;
        Ok(self)
    }

    fn skew_x(&mut self, degrees: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.skew_x(degrees)?;
        Ok(self)
    }

    fn skew_y(&mut self, degrees: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.skew_y(degrees)?;
        Ok(self)
    }

    fn matrix(&mut self, sx: f64, rx: f64, ry: f64, sy: f64, tx: f64, ty: f64) -> Result<&mut Self> {
        self.mutable_core()?.transforms.matrix(sx, rx, ry, sy, tx, ty)?;
        Ok(self)
    }
}

/// Style setters.
pub trait Stylable: HasCore + Sized {
    /// Set several styles atomically.
    fn styles<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.mutable_core()?.styles.set_all(entries)?;
        Ok(self)
    }

    fn style(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.mutable_core()?.styles.set(name, value)?;
        Ok(self)
    }
}

pub trait Describable: HasCore + Sized {
    fn title(&mut self, title: impl Into<String>) -> Result<&mut Self> {
        self.mutable_core()?.description.title = Some(title.into());
        Ok(self)
    }

    fn desc(&mut self, desc: impl Into<String>) -> Result<&mut Self> {
        self.mutable_core()?.description.desc = Some(desc.into());
        Ok(self)
    }

    fn metadata(&mut self, metadata: impl Into<String>) -> Result<&mut Self> {
        self.mutable_core()?.description.metadata = Some(metadata.into());
        Ok(self)
    }
}

impl<T: HasCore> Transformable for T {}
impl<T: HasCore> Stylable for T {}
impl<T: HasCore> Describable for T {}

/// The closed set of node payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Shape(Shape),
    Text(TextRun),
    Tspan(Tspan),
    Tref(Tref),
    Image(ImagePlacement),
    Group(Group),
    Use(Use),
    Viewport(Viewport),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Shape(shape) => shape.name(),
            NodeKind::Text(_) => "text",
            NodeKind::Tspan(_) => "tspan",
            NodeKind::Tref(_) => "tref",
            NodeKind::Image(_) => "image",
            NodeKind::Group(_) => "group",
            NodeKind::Use(_) => "use",
            NodeKind::Viewport(_) => "rvg",
        }
    }

    fn children(&self) -> &[Node] {
        match self {
            NodeKind::Shape(_) | NodeKind::Image(_) => &[],
            NodeKind::Text(run) => &run.body.spans,
            NodeKind::Tspan(span) => &span.body.spans,
            NodeKind::Tref(tref) => std::slice::from_ref(tref.element()),
            NodeKind::Group(group) => group.child_nodes(),
            NodeKind::Use(placed) => std::slice::from_ref(placed.element()),
            NodeKind::Viewport(viewport) => viewport.child_nodes(),
        }
    }

    fn children_mut(&mut self) -> &mut [Node] {
        match self {
            NodeKind::Shape(_) | NodeKind::Image(_) => &mut [],
            NodeKind::Text(run) => &mut run.body.spans,
            NodeKind::Tspan(span) => &mut span.body.spans,
            NodeKind::Tref(tref) => std::slice::from_mut(tref.element_mut()),
            NodeKind::Group(group) => group.children_vec(),
            NodeKind::Use(placed) => std::slice::from_mut(placed.element_mut()),
            NodeKind::Viewport(viewport) => viewport.children_vec(),
        }
    }
}

impl DeepCopy for NodeKind {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        match self {
            NodeKind::Shape(shape) => NodeKind::Shape(shape.clone()),
            NodeKind::Text(run) => NodeKind::Text(run.deep_copy_with(cx)),
            NodeKind::Tspan(span) => NodeKind::Tspan(span.deep_copy_with(cx)),
            NodeKind::Tref(tref) => NodeKind::Tref(tref.deep_copy_with(cx)),
            NodeKind::Image(image) => NodeKind::Image(image.deep_copy_with(cx)),
            NodeKind::Group(group) => NodeKind::Group(group.deep_copy_with(cx)),
            NodeKind::Use(placed) => NodeKind::Use(placed.deep_copy_with(cx)),
            NodeKind::Viewport(viewport) => NodeKind::Viewport(viewport.deep_copy_with(cx)),
        }
    }
}

macro_rules! kind_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for NodeKind {
                fn from(payload: $ty) -> Self {
                    NodeKind::$variant(payload)
                }
            }
        )*
    };
}

kind_from!(
    Shape(Shape),
    Text(TextRun),
    Tspan(Tspan),
    Tref(Tref),
    Image(ImagePlacement),
    Group(Group),
    Use(Use),
    Viewport(Viewport),
);

/// A scene node.
///
/// `clone()` keeps the node's identity; [`DeepCopy::deep_copy`] produces an
/// independent copy with fresh ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    core: NodeCore,
    kind: NodeKind,
}

impl HasCore for Node {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

impl DeepCopy for Node {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Node {
            core: self.core.deep_copy_with(cx),
            kind: self.kind.deep_copy_with(cx),
        }
    }
}

impl Node {
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Node {
            core: NodeCore::new(),
            kind: kind.into(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.core.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The payload, unless the node is frozen.
    pub fn kind_mut(&mut self) -> Result<&mut NodeKind> {
        self.mutable_core()?;
        Ok(&mut self.kind)
    }

    pub fn is_frozen(&self) -> bool {
        self.core.frozen
    }

    /// Make this node and its subtree immutable.
    pub fn freeze(&mut self) -> &mut Self {
        self.core.frozen = true;
        for child in self.kind.children_mut() {
            child.freeze();
        }
        self
    }

    /// Direct children (spans for text, the placed copy for `use`).
    pub fn children(&self) -> &[Node] {
        self.kind.children()
    }

    /// Depth-first search of this node and its subtree.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.core.id == id {
            return Some(self);
        }
        self.kind.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.core.id == id {
            return Some(self);
        }
        self.kind
            .children_mut()
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Round the corners of a rect.
    pub fn round(&mut self, rx: f64, ry: f64) -> Result<&mut Self> {
        let kind = self.kind_name();
        match self.kind_mut()? {
            NodeKind::Shape(shape) => shape.round(rx, ry)?,
            _ => return Err(RvgError::validation(format!("round applies to rect, not {kind}"))),
        }
        Ok(self)
    }

    /// Set the viewbox of a nested scene.
    pub fn viewbox(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<&mut Self> {
        self.viewport_mut()?.viewbox(x, y, width, height)?;
        Ok(self)
    }

    /// Set the aspect handling of a nested scene or image.
    pub fn preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<&mut Self> {
        let kind = self.kind_name();
        match self.kind_mut()? {
            NodeKind::Viewport(viewport) => {
                viewport.preserve_aspect_ratio(align, meet_or_slice)?;
            }
            NodeKind::Image(image) => image.preserve_aspect_ratio(align, meet_or_slice)?,
            _ => {
                return Err(RvgError::validation(format!(
                    "preserve_aspect_ratio applies to rvg or image, not {kind}"
                )));
            }
        }
        Ok(self)
    }

    /// Append a span continuing at the pen position.
    pub fn tspan(&mut self, content: &str) -> Result<&mut Node> {
        self.add_span(Node::new(Tspan::new(content, None, None)?))
    }

    /// Append a span starting at an absolute position.
    pub fn tspan_at(&mut self, content: &str, x: f64, y: f64) -> Result<&mut Node> {
        self.add_span(Node::new(Tspan::new(content, Some(x), Some(y))?))
    }

    /// Append a span re-rendering a copy of `referent`'s text.
    pub fn tref(&mut self, referent: &Node, x: Option<f64>, y: Option<f64>) -> Result<&mut Node> {
        self.add_span(Node::new(Tref::new(referent, x, y)?))
    }

    /// Relative offset for a text or span.
    pub fn d(&mut self, dx: f64, dy: f64) -> Result<&mut Self> {
        let kind = self.kind_name();
        match self.kind_mut()? {
            NodeKind::Text(run) => run.set_offset(dx, dy)?,
            NodeKind::Tspan(span) => span.set_offset(dx, dy)?,
            _ => return Err(RvgError::validation(format!("d applies to text or tspan, not {kind}"))),
        }
        Ok(self)
    }

    pub fn group_mut(&mut self) -> Result<&mut Group> {
        let kind = self.kind_name();
        match self.kind_mut()? {
            NodeKind::Group(group) => Ok(group),
            _ => Err(RvgError::validation(format!("expected a group, found {kind}"))),
        }
    }

    pub fn viewport_mut(&mut self) -> Result<&mut Viewport> {
        let kind = self.kind_name();
        match self.kind_mut()? {
            NodeKind::Viewport(viewport) => Ok(viewport),
            _ => Err(RvgError::validation(format!("expected an rvg, found {kind}"))),
        }
    }

    fn add_span(&mut self, span: Node) -> Result<&mut Node> {
        let kind = self.kind_name();
        let spans = match self.kind_mut()? {
            NodeKind::Text(run) => &mut run.body.spans,
            NodeKind::Tspan(parent) => &mut parent.body.spans,
            _ => return Err(RvgError::validation(format!("spans can only be added to text, not {kind}"))),
        };
        let index = spans.len();
        spans.push(span);
        Ok(&mut spans[index])
    }

    /// Apply the position and size overrides of a `use` to a fresh copy.
    /// Runs before the copy is attached, so frozen copies are accepted.
    pub(crate) fn place(&mut self, x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> Result<()> {
        match &mut self.kind {
            NodeKind::Viewport(viewport) => {
                viewport.resize(width, height)?;
                if x != 0.0 || y != 0.0 {
                    self.core.transforms.translate(x, y)?;
                }
            }
            NodeKind::Image(image) => image.place(x, y, width, height)?,
            _ => {
                if x != 0.0 || y != 0.0 {
                    self.core.transforms.translate(x, y)?;
                }
            }
        }
        Ok(())
    }

    /// Emit this node inside its own scope.
    pub(crate) fn emit(&self, ctx: &mut EmitContext<'_>) -> Result<()> {
        log::trace!("emit {} {}", self.kind_name(), self.core.id);
        let id = self.core.id;
        ctx.scoped(&self.core, |ctx| match &self.kind {
            NodeKind::Shape(shape) => {
                ctx.primitive(shape.primitive());
                Ok(())
            }
            NodeKind::Text(run) => run.emit_content(ctx).map(|_| ()),
            NodeKind::Tspan(span) => span.emit_content(ctx, Point::ZERO).map(|_| ()),
            NodeKind::Tref(tref) => tref.element().emit_span(ctx, Point::ZERO).map(|_| ()),
            NodeKind::Image(image) => {
                image.emit_content(ctx, id);
                Ok(())
            }
            NodeKind::Group(group) => group.emit_children(ctx),
            NodeKind::Use(placed) => placed.element().emit(ctx),
            NodeKind::Viewport(viewport) => viewport.emit_content(ctx, id),
        })
    }

    /// Emit a span, returning the pen position after it.
    pub(crate) fn emit_span(&self, ctx: &mut EmitContext<'_>, pen: Point) -> Result<Point> {
        match &self.kind {
            NodeKind::Tspan(span) => ctx.scoped(&self.core, |ctx| span.emit_content(ctx, pen)),
            NodeKind::Tref(tref) => ctx.scoped(&self.core, |ctx| tref.element().emit_span(ctx, pen)),
            _ => {
                self.emit(ctx)?;
                Ok(pen)
            }
        }
    }
}
