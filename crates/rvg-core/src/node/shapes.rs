//! Basic shapes.

use crate::emit::Primitive;
use crate::error::{Result, RvgError};
use crate::units::{finite, non_negative};
use kurbo::{BezPath, Point};

/// A shape leaf. Sizes and radii are validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
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
    Path {
        data: String,
        path: BezPath,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// Corner radii once `round` was called.
        corner: Option<(f64, f64)>,
    },
    Polygon(Vec<Point>),
    Polyline(Vec<Point>),
}

impl Shape {
    pub fn circle(r: f64, cx: f64, cy: f64) -> Result<Self> {
        Ok(Shape::Circle {
            cx: finite("circle cx", cx)?,
            cy: finite("circle cy", cy)?,
            r: non_negative("circle radius", r)?,
        })
    }

    pub fn ellipse(rx: f64, ry: f64, cx: f64, cy: f64) -> Result<Self> {
        Ok(Shape::Ellipse {
            cx: finite("ellipse cx", cx)?,
            cy: finite("ellipse cy", cy)?,
            rx: non_negative("ellipse rx", rx)?,
            ry: non_negative("ellipse ry", ry)?,
        })
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        Ok(Shape::Line {
            x1: finite("line x1", x1)?,
            y1: finite("line y1", y1)?,
            x2: finite("line x2", x2)?,
            y2: finite("line y2", y2)?,
        })
    }

    /// Parse SVG path data.
    pub fn path(data: &str) -> Result<Self> {
        let path = BezPath::from_svg(data)
            .map_err(|e| RvgError::validation(format!("invalid path data {data:?}: {e}")))?;
        Ok(Shape::Path {
            data: data.to_string(),
            path,
        })
    }

    pub fn rect(width: f64, height: f64, x: f64, y: f64) -> Result<Self> {
        Ok(Shape::Rect {
            x: finite("rect x", x)?,
            y: finite("rect y", y)?,
            width: non_negative("rect width", width)?,
            height: non_negative("rect height", height)?,
            corner: None,
        })
    }

    /// Closed polygon from a flat `[x0, y0, x1, y1, ...]` list.
    pub fn polygon(coords: &[f64]) -> Result<Self> {
        Ok(Shape::Polygon(points("polygon", coords)?))
    }

    /// Open polyline from a flat `[x0, y0, x1, y1, ...]` list.
    pub fn polyline(coords: &[f64]) -> Result<Self> {
        Ok(Shape::Polyline(points("polyline", coords)?))
    }

    pub(crate) fn round(&mut self, rx: f64, ry: f64) -> Result<()> {
        let name = self.name();
        match self {
            Shape::Rect { corner, .. } => {
                *corner = Some((non_negative("round rx", rx)?, non_negative("round ry", ry)?));
                Ok(())
            }
            _ => Err(RvgError::validation(format!("round applies to rect, not {name}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Line { .. } => "line",
            Shape::Path { .. } => "path",
            Shape::Rect { .. } => "rect",
            Shape::Polygon(_) => "polygon",
            Shape::Polyline(_) => "polyline",
        }
    }

    pub(crate) fn primitive(&self) -> Primitive {
        match self {
            Shape::Circle { cx, cy, r } => Primitive::Circle { cx: *cx, cy: *cy, r: *r },
            Shape::Ellipse { cx, cy, rx, ry } => Primitive::Ellipse {
                cx: *cx,
                cy: *cy,
                rx: *rx,
                ry: *ry,
            },
            Shape::Line { x1, y1, x2, y2 } => Primitive::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            },
            Shape::Path { path, .. } => Primitive::Path(path.clone()),
            Shape::Rect {
                x,
                y,
                width,
                height,
                corner: None,
            } => Primitive::Rectangle {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            },
            Shape::Rect {
                x,
                y,
                width,
                height,
                corner: Some((rx, ry)),
            } => Primitive::RoundRectangle {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                rx: *rx,
                ry: *ry,
            },
            Shape::Polygon(points) => Primitive::Polygon(points.clone()),
            Shape::Polyline(points) => Primitive::Polyline(points.clone()),
        }
    }
}

fn points(what: &str, coords: &[f64]) -> Result<Vec<Point>> {
    if coords.len() % 2 != 0 || coords.len() < 4 {
        return Err(RvgError::validation(format!(
            "{what}: insufficient or odd number of coordinates ({} given)",
            coords.len()
        )));
    }
    coords
        .chunks_exact(2)
        .map(|pair| Ok(Point::new(finite(what, pair[0])?, finite(what, pair[1])?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_sizes_rejected() {
        assert!(Shape::circle(-1.0, 0.0, 0.0).unwrap_err().is_validation());
        assert!(Shape::ellipse(1.0, -1.0, 0.0, 0.0).is_err());
        assert!(Shape::rect(-5.0, 5.0, 0.0, 0.0).is_err());
        assert!(Shape::circle(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_point_lists() {
        assert!(Shape::polygon(&[0.0, 0.0, 10.0]).is_err());
        assert!(Shape::polyline(&[0.0, 0.0]).is_err());
        let shape = Shape::polygon(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0]).unwrap();
        assert_eq!(
            shape.primitive(),
            Primitive::Polygon(vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0)
            ])
        );
    }

    #[test]
    fn test_path_data() {
        let shape = Shape::path("M0 0 L10 10 Z").unwrap();
        match shape.primitive() {
            Primitive::Path(path) => assert_eq!(path.elements().len(), 3),
            other => panic!("unexpected primitive {other:?}"),
        }
        assert!(Shape::path("X10 10").is_err());
    }

    #[test]
    fn test_round_rect_primitive() {
        let mut shape = Shape::rect(20.0, 10.0, 1.0, 2.0).unwrap();
        shape.round(3.0, 4.0).unwrap();
        assert_eq!(
            shape.primitive(),
            Primitive::RoundRectangle {
                x: 1.0,
                y: 2.0,
                width: 20.0,
                height: 10.0,
                rx: 3.0,
                ry: 4.0
            }
        );
    }
}
