//! Text runs and their spans.
//!
//! The pen position flows from the run's own content through each span in
//! order; every span hands the pen on to its next sibling.

use super::{HasCore, Node, NodeKind};
use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::EmitContext;
use crate::error::{Result, RvgError};
use crate::units::finite;
use kurbo::{Point, Vec2};

/// Content shared by runs and spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    pub(crate) content: String,
    pub(crate) spans: Vec<Node>,
}

impl TextBody {
    fn new(content: &str) -> Self {
        TextBody {
            content: content.to_string(),
            spans: Vec::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn spans(&self) -> &[Node] {
        &self.spans
    }

    fn emit(&self, ctx: &mut EmitContext<'_>, start: Point) -> Result<Point> {
        let mut pen = start;
        if !self.content.is_empty() {
            let advance: Vec2 = ctx.layout_text(pen, &self.content)?;
            pen += advance;
        }
        for span in &self.spans {
            pen = span.emit_span(ctx, pen)?;
        }
        Ok(pen)
    }
}

impl DeepCopy for TextBody {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        TextBody {
            content: self.content.clone(),
            spans: self.spans.deep_copy_with(cx),
        }
    }
}

/// A text run at an absolute position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    pub(crate) body: TextBody,
}

impl TextRun {
    pub fn new(x: f64, y: f64, content: &str) -> Result<Self> {
        Ok(TextRun {
            x: finite("text x", x)?,
            y: finite("text y", y)?,
            dx: 0.0,
            dy: 0.0,
            body: TextBody::new(content),
        })
    }

    pub fn body(&self) -> &TextBody {
        &self.body
    }

    pub(crate) fn set_offset(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.dx = finite("text dx", dx)?;
        self.dy = finite("text dy", dy)?;
        Ok(())
    }

    pub(crate) fn emit_content(&self, ctx: &mut EmitContext<'_>) -> Result<Point> {
        self.body
            .emit(ctx, Point::new(self.x + self.dx, self.y + self.dy))
    }
}

impl DeepCopy for TextRun {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        TextRun {
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            body: self.body.deep_copy_with(cx),
        }
    }
}

/// A span that continues at the pen unless given an absolute position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tspan {
    x: Option<f64>,
    y: Option<f64>,
    dx: f64,
    dy: f64,
    pub(crate) body: TextBody,
}

impl Tspan {
    pub fn new(content: &str, x: Option<f64>, y: Option<f64>) -> Result<Self> {
        Ok(Tspan {
            x: x.map(|x| finite("tspan x", x)).transpose()?,
            y: y.map(|y| finite("tspan y", y)).transpose()?,
            dx: 0.0,
            dy: 0.0,
            body: TextBody::new(content),
        })
    }

    pub fn body(&self) -> &TextBody {
        &self.body
    }

    pub(crate) fn set_offset(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.dx = finite("tspan dx", dx)?;
        self.dy = finite("tspan dy", dy)?;
        Ok(())
    }

    /// Where this span starts given the incoming pen.
    pub fn start(&self, pen: Point) -> Point {
        Point::new(self.x.unwrap_or(pen.x) + self.dx, self.y.unwrap_or(pen.y) + self.dy)
    }

    pub(crate) fn emit_content(&self, ctx: &mut EmitContext<'_>, pen: Point) -> Result<Point> {
        self.body.emit(ctx, self.start(pen))
    }
}

impl DeepCopy for Tspan {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Tspan {
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            body: self.body.deep_copy_with(cx),
        }
    }
}

/// A copy of another run's text, rendered at the tref's position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tref {
    /// Always a tspan node; a referenced run is converted on copy.
    element: Box<Node>,
}

impl Tref {
    pub fn new(referent: &Node, x: Option<f64>, y: Option<f64>) -> Result<Self> {
        let x = x.map(|x| finite("tref x", x)).transpose()?;
        let y = y.map(|y| finite("tref y", y)).transpose()?;
        let mut copy = referent.deep_copy();
        let span = match &copy.kind {
            NodeKind::Text(run) => Tspan {
                x,
                y,
                dx: run.dx,
                dy: run.dy,
                body: run.body.clone(),
            },
            NodeKind::Tspan(span) => Tspan {
                x: x.or(span.x),
                y: y.or(span.y),
                dx: span.dx,
                dy: span.dy,
                body: span.body.clone(),
            },
            _ => {
                return Err(RvgError::validation(format!(
                    "tref requires a text or tspan ({} given)",
                    referent.kind_name()
                )));
            }
        };
        copy.kind = NodeKind::Tspan(span);
        Ok(Tref {
            element: Box::new(copy),
        })
    }

    pub fn element(&self) -> &Node {
        &self.element
    }

    pub(crate) fn element_mut(&mut self) -> &mut Node {
        &mut self.element
    }
}

impl DeepCopy for Tref {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Tref {
            element: self.element.deep_copy_with(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Shape;

    #[test]
    fn test_tspan_start() {
        let span = Tspan::new("x", None, Some(50.0)).unwrap();
        assert_eq!(span.start(Point::new(10.0, 20.0)), Point::new(10.0, 50.0));

        let mut span = Tspan::new("x", None, None).unwrap();
        span.set_offset(2.0, -3.0).unwrap();
        assert_eq!(span.start(Point::new(10.0, 20.0)), Point::new(12.0, 17.0));
    }

    #[test]
    fn test_tref_converts_run_to_span() {
        let mut run = Node::new(TextRun::new(5.0, 5.0, "hello").unwrap());
        run.tspan(" world").unwrap();
        let tref = Tref::new(&run, Some(1.0), None).unwrap();
        match tref.element().kind() {
            NodeKind::Tspan(span) => {
                assert_eq!(span.body().content(), "hello");
                assert_eq!(span.body().spans().len(), 1);
                assert_eq!(span.start(Point::new(0.0, 9.0)), Point::new(1.0, 9.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_ne!(tref.element().id(), run.id());
    }

    #[test]
    fn test_tref_rejects_non_text() {
        let circle = Node::new(Shape::circle(1.0, 0.0, 0.0).unwrap());
        let err = Tref::new(&circle, None, None).unwrap_err();
        assert!(err.to_string().contains("circle"));
    }
}
