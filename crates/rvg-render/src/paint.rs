//! Paint state tracked while a primitive stream is rendered.

use kurbo::{Cap, Join, Stroke};
use peniko::color::{parse_color as parse_css_color, Srgb};
use peniko::{Color, Fill};
use rvg_core::{BackendError, BackendResult, StyleArg, StyleName};

/// Parse a CSS colour string (names, hex, `rgb()`, `hsl()`, ...).
pub fn parse_color(text: &str) -> BackendResult<Color> {
    parse_css_color(text.trim())
        .map(|color| color.to_alpha_color::<Srgb>())
        .map_err(|_| BackendError::UnknownColor(text.to_string()))
}

/// Where fill or stroke paint comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintSource {
    None,
    Solid(Color),
    /// A pattern defined earlier in the stream, by name.
    Pattern(String),
}

/// Fill, stroke and decoration settings of one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintState {
    pub fill: PaintSource,
    pub stroke: PaintSource,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub opacity: f64,
    pub stroke_width: f64,
    pub cap: Cap,
    pub join: Join,
    pub miter_limit: f64,
    pub dashes: Vec<f64>,
    pub dash_offset: f64,
    pub fill_rule: Fill,
    pub clip_rule: Fill,
    pub decoration: Option<String>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill: PaintSource::Solid(Color::BLACK),
            stroke: PaintSource::None,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
            stroke_width: 1.0,
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 4.0,
            dashes: Vec::new(),
            dash_offset: 0.0,
            fill_rule: Fill::NonZero,
            clip_rule: Fill::NonZero,
            decoration: None,
        }
    }
}

impl PaintState {
    /// Apply a paint-related style. Returns `false` for names that are not
    /// paint settings.
    pub fn apply(&mut self, name: StyleName, arg: &StyleArg) -> BackendResult<bool> {
        match name {
            StyleName::Fill => self.fill = paint_source(arg)?,
            StyleName::Stroke => self.stroke = paint_source(arg)?,
            StyleName::FillOpacity => self.fill_opacity = number(name, arg)?,
            StyleName::StrokeOpacity => self.stroke_opacity = number(name, arg)?,
            // Group opacity compounds with the inherited value.
            StyleName::Opacity => self.opacity *= number(name, arg)?,
            StyleName::StrokeWidth => self.stroke_width = number(name, arg)?,
            StyleName::StrokeMiterlimit => self.miter_limit = number(name, arg)?,
            StyleName::StrokeDashoffset => self.dash_offset = number(name, arg)?,
            StyleName::StrokeDasharray => {
                self.dashes = match arg {
                    StyleArg::None => Vec::new(),
                    StyleArg::Numbers(values) if values.len() % 2 == 1 => values.repeat(2),
                    StyleArg::Numbers(values) => values.clone(),
                    other => return Err(unexpected(name, other)),
                }
            }
            StyleName::StrokeLinecap => {
                self.cap = match keyword(name, arg)? {
                    "butt" => Cap::Butt,
                    "round" => Cap::Round,
                    "square" => Cap::Square,
                    _ => return Err(unexpected(name, arg)),
                }
            }
            StyleName::StrokeLinejoin => {
                self.join = match keyword(name, arg)? {
                    "miter" => Join::Miter,
                    "round" => Join::Round,
                    "bevel" => Join::Bevel,
                    _ => return Err(unexpected(name, arg)),
                }
            }
            StyleName::FillRule => self.fill_rule = fill_rule(name, arg)?,
            StyleName::ClipRule => self.clip_rule = fill_rule(name, arg)?,
            StyleName::TextDecoration => {
                self.decoration = match keyword(name, arg)? {
                    "none" => None,
                    other => Some(other.to_string()),
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn fill_alpha(&self) -> f32 {
        (self.opacity * self.fill_opacity) as f32
    }

    pub fn stroke_alpha(&self) -> f32 {
        (self.opacity * self.stroke_opacity) as f32
    }

    /// The stroke style, or `None` when strokes draw nothing.
    pub fn stroke_style(&self) -> Option<Stroke> {
        if self.stroke == PaintSource::None || self.stroke_width <= 0.0 {
            return None;
        }
        let stroke = Stroke::new(self.stroke_width)
            .with_caps(self.cap)
            .with_join(self.join)
            .with_miter_limit(self.miter_limit);
        // An all-zero dash array draws a solid line.
        if self.dashes.iter().any(|d| *d > 0.0) {
            Some(stroke.with_dashes(self.dash_offset, self.dashes.iter().copied()))
        } else {
            Some(stroke)
        }
    }
}

fn paint_source(arg: &StyleArg) -> BackendResult<PaintSource> {
    match arg {
        StyleArg::None => Ok(PaintSource::None),
        StyleArg::Color(text) => Ok(PaintSource::Solid(parse_color(text)?)),
        StyleArg::Url(name) => Ok(PaintSource::Pattern(name.clone())),
        other => Err(BackendError::RenderFailed(format!("paint can't be {other:?}"))),
    }
}

fn number(name: StyleName, arg: &StyleArg) -> BackendResult<f64> {
    match arg {
        StyleArg::Number(n) => Ok(*n),
        other => Err(unexpected(name, other)),
    }
}

fn keyword(name: StyleName, arg: &StyleArg) -> BackendResult<&str> {
    match arg {
        StyleArg::Keyword(k) => Ok(k.as_str()),
        other => Err(unexpected(name, other)),
    }
}

fn fill_rule(name: StyleName, arg: &StyleArg) -> BackendResult<Fill> {
    match keyword(name, arg)? {
        "evenodd" => Ok(Fill::EvenOdd),
        "nonzero" => Ok(Fill::NonZero),
        _ => Err(unexpected(name, arg)),
    }
}

fn unexpected(name: StyleName, arg: &StyleArg) -> BackendError {
    BackendError::RenderFailed(format!("unexpected {name} argument {arg:?}"))
}
