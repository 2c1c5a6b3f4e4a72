//! Builder verbs shared by every container.

use super::{
    ClipPath, ClipPathRef, ClipUnits, Group, ImagePlacement, Node, NodeId, Pattern, PatternRef, RasterImage, Shape,
    TextRun, Use, Viewport,
};
use crate::error::{Result, RvgError};
use crate::units::Length;
use std::sync::Arc;

/// Containers that accept children.
///
/// Each verb validates its arguments, appends the new node and returns it
/// for chaining. A failing verb appends nothing. Closure-scoped verbs
/// (`g`, `rvg`, `pattern`, `clip_path`) build the whole payload first, so
/// an error inside the closure leaves the receiver untouched.
pub trait Build {
    #[doc(hidden)]
    fn children_vec(&mut self) -> &mut Vec<Node>;

    /// Children in paint order.
    fn child_nodes(&self) -> &[Node];

    /// Append an already built node.
    fn add(&mut self, node: Node) -> &mut Node {
        let children = self.children_vec();
        let index = children.len();
        children.push(node);
        &mut children[index]
    }

    fn circle(&mut self, r: f64, cx: f64, cy: f64) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::circle(r, cx, cy)?)))
    }

    fn ellipse(&mut self, rx: f64, ry: f64, cx: f64, cy: f64) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::ellipse(rx, ry, cx, cy)?)))
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::line(x1, y1, x2, y2)?)))
    }

    fn path(&mut self, data: &str) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::path(data)?)))
    }

    fn rect(&mut self, width: f64, height: f64, x: f64, y: f64) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::rect(width, height, x, y)?)))
    }

    fn polygon(&mut self, coords: &[f64]) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::polygon(coords)?)))
    }

    fn polyline(&mut self, coords: &[f64]) -> Result<&mut Node> {
        Ok(self.add(Node::new(Shape::polyline(coords)?)))
    }

    fn text(&mut self, x: f64, y: f64, content: &str) -> Result<&mut Node> {
        Ok(self.add(Node::new(TextRun::new(x, y, content)?)))
    }

    fn image(
        &mut self,
        image: &Arc<RasterImage>,
        width: Option<f64>,
        height: Option<f64>,
        x: f64,
        y: f64,
    ) -> Result<&mut Node> {
        let placement = ImagePlacement::new(Arc::clone(image), width, height, x, y)?;
        Ok(self.add(Node::new(placement)))
    }

    /// Place an independent copy of `referent`.
    fn use_node(
        &mut self,
        referent: &Node,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<&mut Node> {
        let placed = Use::new(referent, x, y, width, height)?;
        Ok(self.add(Node::new(placed)))
    }

    /// Place a copy of a node found in this container's subtree.
    fn use_id(&mut self, id: NodeId, x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> Result<&mut Node> {
        let placed = match self.find(id) {
            Some(referent) => Use::new(referent, x, y, width, height)?,
            None => return Err(RvgError::validation(format!("no node with id {id}"))),
        };
        Ok(self.add(Node::new(placed)))
    }

    /// A group built by `f`.
    fn g<F>(&mut self, f: F) -> Result<&mut Node>
    where
        F: FnOnce(&mut Group) -> Result<()>,
    {
        let mut group = Group::new();
        f(&mut group)?;
        Ok(self.add(Node::new(group)))
    }

    /// A nested scene of `width` x `height` at `(x, y)` built by `f`.
    fn rvg<F>(&mut self, width: impl Into<Length>, height: impl Into<Length>, x: f64, y: f64, f: F) -> Result<&mut Node>
    where
        F: FnOnce(&mut Viewport) -> Result<()>,
    {
        let mut viewport = Viewport::new(width.into().to_px()?, height.into().to_px()?, x, y)?;
        f(&mut viewport)?;
        Ok(self.add(Node::new(viewport)))
    }

    /// A pattern built by `f`, for use as `fill` or `stroke` paint. The
    /// pattern is not a child of this container.
    fn pattern<F>(&mut self, width: f64, height: f64, x: f64, y: f64, f: F) -> Result<PatternRef>
    where
        F: FnOnce(&mut Pattern) -> Result<()>,
    {
        let mut pattern = Pattern::new(width, height, x, y)?;
        f(&mut pattern)?;
        Ok(PatternRef::new(pattern))
    }

    /// A clip path built by `f`, for use as the `clip_path` style.
    fn clip_path<F>(&mut self, units: &str, f: F) -> Result<ClipPathRef>
    where
        F: FnOnce(&mut ClipPath) -> Result<()>,
    {
        let mut clip_path = ClipPath::new(units.parse::<ClipUnits>()?);
        f(&mut clip_path)?;
        Ok(ClipPathRef::new(clip_path))
    }

    fn find(&self, id: NodeId) -> Option<&Node> {
        self.child_nodes().iter().find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.children_vec()
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }
}
