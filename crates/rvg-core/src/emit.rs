//! Primitive stream and the traversal context that produces it.

use crate::backend::{GlyphMetrics, GlyphMetricsSource};
use crate::error::Result;
use crate::node::{ClipUnits, NodeCore, RasterImage};
use crate::style::{Paint, StyleArg, StyleName, StyleTable, StyleValue};
use crate::text::{self, TextState};
use crate::transform::TransformOp;
use kurbo::{BezPath, Point, Vec2};
use std::sync::Arc;

/// One backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Save graphics state.
    Push,
    /// Restore the state saved by the matching `Push`.
    Pop,
    Transform(TransformOp),
    Style {
        name: StyleName,
        arg: StyleArg,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Path(BezPath),
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    RoundRectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Polygon(Vec<Point>),
    Polyline(Vec<Point>),
    /// Text drawn at the pen with the backend's current anchor.
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    /// Composite a raster image into a rectangle.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: Arc<RasterImage>,
    },
    /// Start recording a clip region; content until `EndClipPath` is
    /// geometry only.
    BeginClipPath {
        name: String,
    },
    EndClipPath,
    ClipUnits(ClipUnits),
    /// Start recording a pattern tile. Acts as a state save.
    BeginPattern {
        name: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Finish the pattern tile and restore state.
    EndPattern,
}

/// The compiled, linear output of one traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    primitives: Vec<Primitive>,
}

impl DrawList {
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.primitives.iter()
    }

    pub fn count(&self, pred: impl Fn(&Primitive) -> bool) -> usize {
        self.primitives.iter().filter(|p| pred(p)).count()
    }

    /// Every prefix has at least as many pushes as pops, and the totals
    /// match.
    pub fn is_balanced(&self) -> bool {
        let mut depth: i64 = 0;
        for p in &self.primitives {
            match p {
                Primitive::Push => depth += 1,
                Primitive::Pop => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }

    pub fn into_vec(self) -> Vec<Primitive> {
        self.primitives
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a Primitive;
    type IntoIter = std::slice::Iter<'a, Primitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.primitives.iter()
    }
}

/// Traversal state: the output stream, the scope depth and the text
/// attribute stack that mirrors push/pop.
pub struct EmitContext<'m> {
    metrics: &'m mut dyn GlyphMetricsSource,
    primitives: Vec<Primitive>,
    text: Vec<TextState>,
}

impl<'m> EmitContext<'m> {
    pub fn new(metrics: &'m mut dyn GlyphMetricsSource) -> Self {
        Self {
            metrics,
            primitives: Vec::new(),
            text: vec![TextState::default()],
        }
    }

    pub fn primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn push(&mut self) {
        self.primitives.push(Primitive::Push);
        let top = self.text_state().clone();
        self.text.push(top);
    }

    pub fn pop(&mut self) {
        self.primitives.push(Primitive::Pop);
        if self.text.len() > 1 {
            self.text.pop();
        }
    }

    /// Emit a transform and fold it into the text accumulator.
    pub fn transform(&mut self, op: TransformOp) {
        self.primitives.push(Primitive::Transform(op));
        let state = self.text_state_mut();
        state.affine = state.affine * op.to_affine();
    }

    /// Emit one style entry and mirror it into the text attributes.
    pub fn style(&mut self, name: StyleName, value: &StyleValue) {
        self.text_state_mut().apply(name, value);
        self.primitives.push(Primitive::Style {
            name,
            arg: value.to_arg(),
        });
    }

    /// Emit a style call that has no stored value, such as the forced
    /// anchor of a laid-out run.
    pub(crate) fn style_arg(&mut self, name: StyleName, arg: StyleArg) {
        self.primitives.push(Primitive::Style { name, arg });
    }

    /// Emit a table in canonical order, defining referenced resources first.
    pub fn apply_styles(&mut self, table: &StyleTable) -> Result<()> {
        for (name, value) in table.iter() {
            match value {
                StyleValue::Paint(Paint::Pattern(pattern)) => pattern.emit_definition(self)?,
                StyleValue::ClipPath(clip_path) => clip_path.emit_definition(self)?,
                _ => {}
            }
            self.style(name, value);
        }
        Ok(())
    }

    /// Push, emit the node's transforms and styles, run `action`, pop.
    pub(crate) fn scoped<T>(
        &mut self,
        core: &NodeCore,
        action: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.push();
        for op in core.transforms().ops() {
            self.transform(*op);
        }
        self.apply_styles(core.styles())?;
        let out = action(self)?;
        self.pop();
        Ok(out)
    }

    pub(crate) fn begin_pattern(&mut self, begin: Primitive) {
        self.primitives.push(begin);
        let top = self.text_state().clone();
        self.text.push(top);
    }

    pub(crate) fn end_pattern(&mut self) {
        self.primitives.push(Primitive::EndPattern);
        if self.text.len() > 1 {
            self.text.pop();
        }
    }

    /// Lay out a text run at `pen`, returning its advance.
    pub fn layout_text(&mut self, pen: Point, content: &str) -> Result<Vec2> {
        text::layout(self, pen, content)
    }

    /// Query metrics for `probe` with the font and transform in scope.
    pub fn glyph_metrics(&mut self, probe: &str) -> Result<GlyphMetrics> {
        let state = self.text_state().clone();
        Ok(self.metrics.glyph_metrics(probe, &state.font, state.affine)?)
    }

    /// The text attributes in scope.
    pub fn text_state(&self) -> &TextState {
        // The stack is never emptied below its root entry.
        &self.text[self.text.len() - 1]
    }

    fn text_state_mut(&mut self) -> &mut TextState {
        let last = self.text.len() - 1;
        &mut self.text[last]
    }

    /// Current scope depth.
    pub fn depth(&self) -> usize {
        self.text.len() - 1
    }

    pub fn finish(self) -> DrawList {
        DrawList {
            primitives: self.primitives,
        }
    }
}
