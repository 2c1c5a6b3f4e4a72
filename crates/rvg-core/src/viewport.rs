//! Viewbox and preserve-aspect-ratio resolution.
//!
//! A viewport maps a virtual box onto an available rectangle. The mapping is
//! always emitted in the same order: clip to the viewport bounds, translate by
//! the alignment offset, scale, then translate by the negated virtual origin.

use crate::emit::{EmitContext, Primitive};
use crate::error::{Result, RvgError};
use crate::style::{StyleArg, StyleName};
use crate::transform::TransformOp;
use crate::units::finite;
use kurbo::Affine;
use std::str::FromStr;

/// Offsets smaller than this are not emitted.
const NEGLIGIBLE: f64 = 1e-10;

/// Placement of the scaled box along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisAlign {
    Min,
    #[default]
    Mid,
    Max,
}

impl AxisAlign {
    fn offset(self, available: f64, scaled: f64) -> f64 {
        match self {
            AxisAlign::Min => 0.0,
            AxisAlign::Mid => (available - scaled) / 2.0,
            AxisAlign::Max => available - scaled,
        }
    }
}

/// Alignment keyword: `none` or one of the nine `xM..YM..` combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Aligned { x: AxisAlign, y: AxisAlign },
}

impl Default for Align {
    fn default() -> Self {
        Align::Aligned {
            x: AxisAlign::Mid,
            y: AxisAlign::Mid,
        }
    }
}

impl FromStr for Align {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "none" {
            return Ok(Align::None);
        }
        let axis = |part: &str| match part {
            "Min" => Some(AxisAlign::Min),
            "Mid" => Some(AxisAlign::Mid),
            "Max" => Some(AxisAlign::Max),
            _ => None,
        };
        let parsed = s
            .strip_prefix('x')
            .filter(|rest| rest.len() == 7 && rest.is_char_boundary(3))
            .and_then(|rest| {
                let (x, y) = rest.split_at(3);
                Some(Align::Aligned {
                    x: axis(x)?,
                    y: axis(y.strip_prefix('Y')?)?,
                })
            });
        parsed.ok_or_else(|| RvgError::validation(format!("unsupported alignment keyword `{s}`")))
    }
}

/// `meet` or `slice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetOrSlice {
    #[default]
    Meet,
    Slice,
}

impl FromStr for MeetOrSlice {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "meet" => Ok(MeetOrSlice::Meet),
            "slice" => Ok(MeetOrSlice::Slice),
            other => Err(RvgError::validation(format!(
                "unsupported meet-or-slice keyword `{other}` (expected meet or slice)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreserveAspectRatio {
    pub align: Align,
    pub mode: MeetOrSlice,
}

impl PreserveAspectRatio {
    pub fn parse(align: &str, meet_or_slice: &str) -> Result<Self> {
        Ok(Self {
            align: align.parse()?,
            mode: meet_or_slice.parse()?,
        })
    }
}

/// The virtual coordinate box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        let x = finite("viewbox x", x)?;
        let y = finite("viewbox y", y)?;
        let width = finite("viewbox width", width)?;
        let height = finite("viewbox height", height)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(RvgError::validation(format!(
                "viewbox width and height must be > 0 ({width}x{height} given)"
            )));
        }
        Ok(Self { x, y, width, height })
    }
}

/// Viewbox plus aspect handling attached to a viewport-bearing node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSettings {
    pub view_box: Option<ViewBox>,
    pub aspect: PreserveAspectRatio,
}

impl ViewportSettings {
    pub fn set_viewbox(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.view_box = Some(ViewBox::new(x, y, width, height)?);
        Ok(())
    }

    pub fn set_preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<()> {
        self.aspect = PreserveAspectRatio::parse(align, meet_or_slice)?;
        Ok(())
    }

    /// Resolve against the available rectangle.
    pub fn resolve(&self, width: f64, height: f64) -> ViewportTransform {
        resolve(width, height, self.view_box, self.aspect)
    }
}

/// Scale and offsets mapping a virtual box into an available rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
    /// Virtual origin.
    pub vbx: f64,
    pub vby: f64,
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
        vbx: 0.0,
        vby: 0.0,
    };

    /// The ops in emission order, with negligible steps left out.
    pub fn ops(&self) -> Vec<TransformOp> {
        let mut ops = Vec::with_capacity(3);
        if self.tx.abs() > NEGLIGIBLE || self.ty.abs() > NEGLIGIBLE {
            ops.push(TransformOp::Translate {
                tx: self.tx,
                ty: self.ty,
            });
        }
        if self.sx != 1.0 || self.sy != 1.0 {
            ops.push(TransformOp::Scale {
                sx: self.sx,
                sy: self.sy,
            });
        }
        if self.vbx != 0.0 || self.vby != 0.0 {
            ops.push(TransformOp::Translate {
                tx: -self.vbx,
                ty: -self.vby,
            });
        }
        ops
    }

    pub fn to_affine(&self) -> Affine {
        self.ops()
            .iter()
            .fold(Affine::IDENTITY, |acc, op| acc * op.to_affine())
    }
}

/// Compute the mapping of `view_box` into a `width` x `height` viewport.
pub fn resolve(
    width: f64,
    height: f64,
    view_box: Option<ViewBox>,
    aspect: PreserveAspectRatio,
) -> ViewportTransform {
    let Some(vb) = view_box else {
        return ViewportTransform::IDENTITY;
    };
    let (sx, sy) = (width / vb.width, height / vb.height);
    match aspect.align {
        Align::None => ViewportTransform {
            sx,
            sy,
            tx: 0.0,
            ty: 0.0,
            vbx: vb.x,
            vby: vb.y,
        },
        Align::Aligned { x, y } => {
            let scale = match aspect.mode {
                MeetOrSlice::Meet => sx.min(sy),
                MeetOrSlice::Slice => sx.max(sy),
            };
            ViewportTransform {
                sx: scale,
                sy: scale,
                tx: x.offset(width, vb.width * scale),
                ty: y.offset(height, vb.height * scale),
                vbx: vb.x,
                vby: vb.y,
            }
        }
    }
}

/// Emit the clip and mapping for a viewport of `width` x `height` at the
/// current origin. `clip_name` must be unique per viewport-bearing node.
pub(crate) fn emit_viewport(
    ctx: &mut EmitContext<'_>,
    clip_name: &str,
    width: f64,
    height: f64,
    settings: &ViewportSettings,
) {
    ctx.primitive(Primitive::BeginClipPath {
        name: clip_name.to_string(),
    });
    ctx.primitive(Primitive::Rectangle {
        x: 0.0,
        y: 0.0,
        width,
        height,
    });
    ctx.primitive(Primitive::EndClipPath);
    ctx.primitive(Primitive::Style {
        name: StyleName::ClipPath,
        arg: StyleArg::Url(clip_name.to_string()),
    });
    for op in settings.resolve(width, height).ops() {
        ctx.transform(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vb100() -> Option<ViewBox> {
        Some(ViewBox::new(0.0, 0.0, 100.0, 100.0).unwrap())
    }

    #[test]
    fn test_meet_uses_smaller_scale() {
        let t = resolve(50.0, 200.0, vb100(), PreserveAspectRatio::default());
        assert!((t.sx - 0.5).abs() < f64::EPSILON);
        assert!((t.sy - 0.5).abs() < f64::EPSILON);
        assert!(t.tx.abs() < f64::EPSILON);
        assert!((t.ty - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_slice_uses_larger_scale() {
        let aspect = PreserveAspectRatio::parse("xMidYMid", "slice").unwrap();
        let t = resolve(50.0, 200.0, vb100(), aspect);
        assert!((t.sx - 2.0).abs() < f64::EPSILON);
        assert!((t.tx + 75.0).abs() < f64::EPSILON);
        assert!(t.ty.abs() < f64::EPSILON);
    }

    #[test]
    fn test_none_scales_axes_independently() {
        let aspect = PreserveAspectRatio::parse("none", "meet").unwrap();
        let t = resolve(50.0, 200.0, vb100(), aspect);
        assert!((t.sx - 0.5).abs() < f64::EPSILON);
        assert!((t.sy - 2.0).abs() < f64::EPSILON);
        assert_eq!(t.ops(), vec![TransformOp::Scale { sx: 0.5, sy: 2.0 }]);
    }

    #[test]
    fn test_min_and_max_alignment() {
        let min = PreserveAspectRatio::parse("xMinYMin", "meet").unwrap();
        let t = resolve(50.0, 200.0, vb100(), min);
        assert!(t.ty.abs() < f64::EPSILON);

        let max = PreserveAspectRatio::parse("xMaxYMax", "meet").unwrap();
        let t = resolve(50.0, 200.0, vb100(), max);
        assert!((t.ty - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ops_order_and_virtual_origin() {
        let vb = ViewBox::new(10.0, 20.0, 100.0, 100.0).unwrap();
        let t = resolve(50.0, 200.0, Some(vb), PreserveAspectRatio::default());
        assert_eq!(
            t.ops(),
            vec![
                TransformOp::Translate { tx: 0.0, ty: 75.0 },
                TransformOp::Scale { sx: 0.5, sy: 0.5 },
                TransformOp::Translate { tx: -10.0, ty: -20.0 },
            ]
        );
    }

    #[test]
    fn test_no_viewbox_is_identity() {
        let t = resolve(50.0, 200.0, None, PreserveAspectRatio::default());
        assert!(t.ops().is_empty());
    }

    #[test]
    fn test_bad_keywords_and_sizes() {
        assert!("xMidYmid".parse::<Align>().is_err());
        assert!("center".parse::<Align>().is_err());
        assert_eq!(
            "xMaxYMin".parse::<Align>().unwrap(),
            Align::Aligned {
                x: AxisAlign::Max,
                y: AxisAlign::Min
            }
        );
        assert!("fit".parse::<MeetOrSlice>().is_err());
        assert!(ViewBox::new(0.0, 0.0, 0.0, 10.0).unwrap_err().is_validation());
        assert!(ViewBox::new(0.0, 0.0, 10.0, -1.0).is_err());
    }
}
