//! Ordered transform lists.
//!
//! A node records its transform calls as a list of operations and replays
//! them in call order when it is emitted. Nothing is multiplied together at
//! build time; [`TransformOp::to_affine`] only feeds the text layout
//! accumulator.

use crate::error::Result;
use crate::units::finite;
use kurbo::Affine;
use serde::{Deserialize, Serialize};

/// One transform call. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformOp {
    Translate { tx: f64, ty: f64 },
    Scale { sx: f64, sy: f64 },
    Rotate { degrees: f64 },
    SkewX { degrees: f64 },
    SkewY { degrees: f64 },
    /// Column-major `[sx, rx, ry, sy, tx, ty]`, i.e. `x' = sx*x + ry*y + tx`.
    Matrix([f64; 6]),
}

impl TransformOp {
    /// The affine this op contributes when post-multiplied onto the current
    /// transform.
    pub fn to_affine(&self) -> Affine {
        match *self {
            TransformOp::Translate { tx, ty } => Affine::translate((tx, ty)),
            TransformOp::Scale { sx, sy } => Affine::scale_non_uniform(sx, sy),
            TransformOp::Rotate { degrees } => Affine::rotate(degrees.to_radians()),
            TransformOp::SkewX { degrees } => Affine::skew(degrees.to_radians().tan(), 0.0),
            TransformOp::SkewY { degrees } => Affine::skew(0.0, degrees.to_radians().tan()),
            TransformOp::Matrix(coeffs) => Affine::new(coeffs),
        }
    }
}

/// Append-only list of transform ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformList {
    ops: Vec<TransformOp>,
}

impl TransformList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> Result<()> {
        let op = TransformOp::Translate {
            tx: finite("translate tx", tx)?,
            ty: finite("translate ty", ty)?,
        };
        self.ops.push(op);
        Ok(())
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<()> {
        let op = TransformOp::Scale {
            sx: finite("scale sx", sx)?,
            sy: finite("scale sy", sy)?,
        };
        self.ops.push(op);
        Ok(())
    }

    pub fn rotate(&mut self, degrees: f64) -> Result<()> {
        let degrees = finite("rotate angle", degrees)?;
        self.ops.push(TransformOp::Rotate { degrees });
        Ok(())
    }

    /// Rotate around `(cx, cy)`: translate, rotate, translate back.
    pub fn rotate_about(&mut self, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        let degrees = finite("rotate angle", degrees)?;
        let cx = finite("rotate cx", cx)?;
        let cy = finite("rotate cy", cy)?;
        self.ops.extend([
            TransformOp::Translate { tx: cx, ty: cy },
            TransformOp::Rotate { degrees },
            TransformOp::Translate { tx: -cx, ty: -cy },
        ]);
        Ok(())
    }

    pub fn skew_x(&mut self, degrees: f64) -> Result<()> {
        let degrees = finite("skewX angle", degrees)?;
        self.ops.push(TransformOp::SkewX { degrees });
        Ok(())
    }

    pub fn skew_y(&mut self, degrees: f64) -> Result<()> {
        let degrees = finite("skewY angle", degrees)?;
        self.ops.push(TransformOp::SkewY { degrees });
        Ok(())
    }

    pub fn matrix(&mut self, sx: f64, rx: f64, ry: f64, sy: f64, tx: f64, ty: f64) -> Result<()> {
        let mut coeffs = [sx, rx, ry, sy, tx, ty];
        for c in &mut coeffs {
            *c = finite("matrix coefficient", *c)?;
        }
        self.ops.push(TransformOp::Matrix(coeffs));
        Ok(())
    }

    /// Compose the whole list in call order.
    pub fn to_affine(&self) -> Affine {
        self.ops
            .iter()
            .fold(Affine::IDENTITY, |acc, op| acc * op.to_affine())
    }
}
