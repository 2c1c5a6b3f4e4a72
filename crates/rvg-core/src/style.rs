//! Sparse style tables over a closed vocabulary.
//!
//! Only entries that were explicitly set are stored and emitted. Emission
//! walks the table in the canonical order of [`StyleName`], which is the
//! declaration order below, never insertion order.

use crate::duplicate::{CopyContext, DeepCopy};
use crate::error::{Result, RvgError};
use crate::node::{ClipPathRef, PatternRef};
use crate::units::{finite, parse_float, Angle, Length};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed style vocabulary, in canonical emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleName {
    BaselineShift,
    ClipPath,
    ClipRule,
    Fill,
    FillOpacity,
    FillRule,
    Font,
    FontFamily,
    FontSize,
    FontStretch,
    FontStyle,
    FontWeight,
    GlyphOrientationHorizontal,
    GlyphOrientationVertical,
    LetterSpacing,
    Opacity,
    Stroke,
    StrokeDasharray,
    StrokeDashoffset,
    StrokeLinecap,
    StrokeLinejoin,
    StrokeMiterlimit,
    StrokeOpacity,
    StrokeWidth,
    TextAnchor,
    TextDecoration,
    WordSpacing,
    WritingMode,
}

impl StyleName {
    pub const ALL: [StyleName; 28] = [
        StyleName::BaselineShift,
        StyleName::ClipPath,
        StyleName::ClipRule,
        StyleName::Fill,
        StyleName::FillOpacity,
        StyleName::FillRule,
        StyleName::Font,
        StyleName::FontFamily,
        StyleName::FontSize,
        StyleName::FontStretch,
        StyleName::FontStyle,
        StyleName::FontWeight,
        StyleName::GlyphOrientationHorizontal,
        StyleName::GlyphOrientationVertical,
        StyleName::LetterSpacing,
        StyleName::Opacity,
        StyleName::Stroke,
        StyleName::StrokeDasharray,
        StyleName::StrokeDashoffset,
        StyleName::StrokeLinecap,
        StyleName::StrokeLinejoin,
        StyleName::StrokeMiterlimit,
        StyleName::StrokeOpacity,
        StyleName::StrokeWidth,
        StyleName::TextAnchor,
        StyleName::TextDecoration,
        StyleName::WordSpacing,
        StyleName::WritingMode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleName::BaselineShift => "baseline_shift",
            StyleName::ClipPath => "clip_path",
            StyleName::ClipRule => "clip_rule",
            StyleName::Fill => "fill",
            StyleName::FillOpacity => "fill_opacity",
            StyleName::FillRule => "fill_rule",
            StyleName::Font => "font",
            StyleName::FontFamily => "font_family",
            StyleName::FontSize => "font_size",
            StyleName::FontStretch => "font_stretch",
            StyleName::FontStyle => "font_style",
            StyleName::FontWeight => "font_weight",
            StyleName::GlyphOrientationHorizontal => "glyph_orientation_horizontal",
            StyleName::GlyphOrientationVertical => "glyph_orientation_vertical",
            StyleName::LetterSpacing => "letter_spacing",
            StyleName::Opacity => "opacity",
            StyleName::Stroke => "stroke",
            StyleName::StrokeDasharray => "stroke_dasharray",
            StyleName::StrokeDashoffset => "stroke_dashoffset",
            StyleName::StrokeLinecap => "stroke_linecap",
            StyleName::StrokeLinejoin => "stroke_linejoin",
            StyleName::StrokeMiterlimit => "stroke_miterlimit",
            StyleName::StrokeOpacity => "stroke_opacity",
            StyleName::StrokeWidth => "stroke_width",
            StyleName::TextAnchor => "text_anchor",
            StyleName::TextDecoration => "text_decoration",
            StyleName::WordSpacing => "word_spacing",
            StyleName::WritingMode => "writing_mode",
        }
    }

    /// Coerce a caller-supplied value into the stored form for this name.
    pub fn coerce(self, value: Value) -> Result<StyleValue> {
        use StyleName::*;
        match self {
            Fill | Stroke => match value {
                Value::Pattern(p) => Ok(StyleValue::Paint(Paint::Pattern(p))),
                Value::Str(s) if s.trim().eq_ignore_ascii_case("none") => Ok(StyleValue::Paint(Paint::None)),
                Value::Str(s) if !s.trim().is_empty() => Ok(StyleValue::Paint(Paint::Color(s.trim().to_string()))),
                other => Err(self.type_error(&other, "a color String or Pattern")),
            },
            ClipPath => match value {
                Value::ClipPath(c) => Ok(StyleValue::ClipPath(c)),
                other => Err(self.type_error(&other, "ClipPath")),
            },
            ClipRule | FillRule => self.keyword(value, &["evenodd", "nonzero"]),
            Font | FontFamily => match value {
                Value::Str(s) if !s.trim().is_empty() => Ok(StyleValue::Keyword(s.trim().to_string())),
                other => Err(self.type_error(&other, "String")),
            },
            FontStretch => self.keyword(
                value,
                &[
                    "normal",
                    "ultra-condensed",
                    "extra-condensed",
                    "condensed",
                    "semi-condensed",
                    "semi-expanded",
                    "expanded",
                    "extra-expanded",
                    "ultra-expanded",
                ],
            ),
            FontStyle => self.keyword(value, &["normal", "italic", "oblique"]),
            FontWeight => match value {
                Value::Number(n) => font_weight_number(self, n),
                Value::Str(s) => match s.trim().parse::<f64>() {
                    Ok(n) => font_weight_number(self, n),
                    Err(_) => self.keyword(Value::Str(s), &["normal", "bold", "bolder", "lighter"]),
                },
                other => Err(self.type_error(&other, "String or Float")),
            },
            GlyphOrientationHorizontal | GlyphOrientationVertical => {
                let degrees = match value {
                    Value::Number(n) => finite(self.as_str(), n)?,
                    Value::Str(s) => s.parse::<Angle>()?.to_degrees(),
                    other => return Err(self.type_error(&other, "Float")),
                };
                if [0.0, 90.0, 180.0, 270.0].contains(&degrees) {
                    Ok(StyleValue::Number(degrees))
                } else {
                    Err(RvgError::validation(format!(
                        "{} must be 0, 90, 180 or 270 ({degrees} given)",
                        self.as_str()
                    )))
                }
            }
            FillOpacity | StrokeOpacity | Opacity => {
                let n = self.number(value)?;
                if !(0.0..=1.0).contains(&n) {
                    return Err(RvgError::validation(format!(
                        "{} must be in 0.0..=1.0 ({n} given)",
                        self.as_str()
                    )));
                }
                Ok(StyleValue::Number(n))
            }
            FontSize | StrokeWidth => {
                let n = self.number(value)?;
                if n < 0.0 {
                    return Err(RvgError::validation(format!("{} must be >= 0 ({n} given)", self.as_str())));
                }
                Ok(StyleValue::Number(n))
            }
            StrokeMiterlimit => {
                let n = self.number(value)?;
                if n < 1.0 {
                    return Err(RvgError::validation(format!("stroke_miterlimit must be >= 1 ({n} given)")));
                }
                Ok(StyleValue::Number(n))
            }
            StrokeDashoffset | LetterSpacing | WordSpacing => Ok(StyleValue::Number(self.number(value)?)),
            StrokeDasharray => {
                let dashes = match value {
                    Value::List(list) => list,
                    Value::Number(n) => vec![n],
                    Value::Str(s) if s.trim().eq_ignore_ascii_case("none") => Vec::new(),
                    Value::Str(s) => s
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|part| !part.is_empty())
                        .map(|part| Ok(part.parse::<Length>()?.to_px()?))
                        .collect::<Result<Vec<f64>>>()?,
                    other => return Err(self.type_error(&other, "Array of Float")),
                };
                for d in &dashes {
                    let d = finite("stroke_dasharray", *d)?;
                    if d < 0.0 {
                        return Err(RvgError::validation(format!("stroke_dasharray values must be >= 0 ({d} given)")));
                    }
                }
                Ok(StyleValue::Dashes(dashes))
            }
            StrokeLinecap => self.keyword(value, &["butt", "round", "square"]),
            StrokeLinejoin => self.keyword(value, &["miter", "round", "bevel"]),
            TextAnchor => match value {
                Value::Str(s) => Ok(StyleValue::Anchor(s.parse()?)),
                other => Err(self.type_error(&other, "String")),
            },
            TextDecoration => self.keyword(value, &["none", "underline", "overline", "line-through"]),
            WritingMode => match value {
                Value::Str(s) => Ok(StyleValue::WritingMode(s.parse()?)),
                other => Err(self.type_error(&other, "String")),
            },
            BaselineShift => match value {
                Value::Number(n) => Ok(StyleValue::BaselineShift(self::BaselineShift::Length(finite(
                    "baseline_shift",
                    n,
                )?))),
                Value::Str(s) => Ok(StyleValue::BaselineShift(s.parse()?)),
                other => Err(self.type_error(&other, "String or Float")),
            },
        }
    }

    fn number(self, value: Value) -> Result<f64> {
        match value {
            Value::Number(n) => finite(self.as_str(), n),
            Value::Str(s) => s
                .parse::<Length>()
                .map_err(|_| RvgError::validation(format!("{}: can't convert String {s:?} into Float", self.as_str())))?
                .to_px(),
            other => Err(self.type_error(&other, "Float")),
        }
    }

    fn keyword(self, value: Value, allowed: &[&str]) -> Result<StyleValue> {
        let Value::Str(s) = value else {
            return Err(self.type_error(&value, "String"));
        };
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        if allowed.contains(&normalized.as_str()) {
            Ok(StyleValue::Keyword(normalized))
        } else {
            Err(RvgError::validation(format!(
                "unsupported {} value {s:?} (expected one of {})",
                self.as_str(),
                allowed.join(", ")
            )))
        }
    }

    fn type_error(self, value: &Value, expected: &str) -> RvgError {
        RvgError::validation(format!(
            "{}: can't convert {} into {expected}",
            self.as_str(),
            value.type_name()
        ))
    }
}

fn font_weight_number(name: StyleName, n: f64) -> Result<StyleValue> {
    let n = finite(name.as_str(), n)?;
    if (100.0..=900.0).contains(&n) && n % 100.0 == 0.0 {
        Ok(StyleValue::Keyword(format!("{n}")))
    } else {
        Err(RvgError::validation(format!("font_weight must be a multiple of 100 in 100..=900 ({n} given)")))
    }
}

impl FromStr for StyleName {
    type Err = RvgError;

    /// Accepts `stroke_width` and `stroke-width` alike.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_");
        StyleName::ALL
            .into_iter()
            .find(|name| name.as_str() == normalized)
            .ok_or_else(|| RvgError::validation(format!("unknown style `{s}`")))
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-supplied style value before coercion.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Number(f64),
    List(Vec<f64>),
    Pattern(PatternRef),
    ClipPath(ClipPathRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "String",
            Value::Number(_) => "Float",
            Value::List(_) => "Array",
            Value::Pattern(_) => "Pattern",
            Value::ClipPath(_) => "ClipPath",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Vec<f64>> for Value {
    fn from(list: Vec<f64>) -> Self {
        Value::List(list)
    }
}

impl From<&[f64]> for Value {
    fn from(list: &[f64]) -> Self {
        Value::List(list.to_vec())
    }
}

impl From<PatternRef> for Value {
    fn from(p: PatternRef) -> Self {
        Value::Pattern(p)
    }
}

impl From<&PatternRef> for Value {
    fn from(p: &PatternRef) -> Self {
        Value::Pattern(p.clone())
    }
}

impl From<ClipPathRef> for Value {
    fn from(c: ClipPathRef) -> Self {
        Value::ClipPath(c)
    }
}

impl From<&ClipPathRef> for Value {
    fn from(c: &ClipPathRef) -> Self {
        Value::ClipPath(c.clone())
    }
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    /// A color name or notation, resolved by the backend.
    Color(String),
    Pattern(PatternRef),
}

/// Text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

impl FromStr for TextAnchor {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "start" => Ok(TextAnchor::Start),
            "middle" => Ok(TextAnchor::Middle),
            "end" => Ok(TextAnchor::End),
            other => Err(RvgError::validation(format!(
                "unsupported text_anchor value {other:?} (expected start, middle or end)"
            ))),
        }
    }
}

/// Writing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
    #[default]
    LrTb,
    Lr,
    RlTb,
    Rl,
    TbRl,
    Tb,
}

impl WritingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WritingMode::LrTb => "lr-tb",
            WritingMode::Lr => "lr",
            WritingMode::RlTb => "rl-tb",
            WritingMode::Rl => "rl",
            WritingMode::TbRl => "tb-rl",
            WritingMode::Tb => "tb",
        }
    }

    pub fn is_left_to_right(self) -> bool {
        matches!(self, WritingMode::LrTb | WritingMode::Lr)
    }
}

impl FromStr for WritingMode {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().replace('_', "-").as_str() {
            "lr-tb" => Ok(WritingMode::LrTb),
            "lr" => Ok(WritingMode::Lr),
            "rl-tb" => Ok(WritingMode::RlTb),
            "rl" => Ok(WritingMode::Rl),
            "tb-rl" => Ok(WritingMode::TbRl),
            "tb" => Ok(WritingMode::Tb),
            other => Err(RvgError::validation(format!("unsupported writing_mode value {other:?}"))),
        }
    }
}

/// Baseline shift.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BaselineShift {
    #[default]
    Baseline,
    Sub,
    Super,
    /// Positive values raise the baseline.
    Length(f64),
    /// Percentage of the run's extent; positive values raise.
    Percent(f64),
}

impl FromStr for BaselineShift {
    type Err = RvgError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "baseline" => Ok(BaselineShift::Baseline),
            "sub" => Ok(BaselineShift::Sub),
            "super" => Ok(BaselineShift::Super),
            _ => match s.strip_suffix('%') {
                Some(pct) => Ok(BaselineShift::Percent(parse_float("baseline_shift", pct)?)),
                None => Ok(BaselineShift::Length(s.parse::<Length>()?.to_px()?)),
            },
        }
    }
}

/// A coerced, stored style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Number(f64),
    Keyword(String),
    Paint(Paint),
    /// Empty means "none".
    Dashes(Vec<f64>),
    Anchor(TextAnchor),
    WritingMode(WritingMode),
    BaselineShift(BaselineShift),
    ClipPath(ClipPathRef),
}

/// The argument of an emitted style call.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleArg {
    None,
    Number(f64),
    /// Array values expanded into one call.
    Numbers(Vec<f64>),
    Keyword(String),
    Color(String),
    /// Reference to a named pattern or clip path resource.
    Url(String),
}

impl StyleValue {
    /// The emitted argument. Resource-valued entries reference the
    /// resource by name; its definition is emitted separately.
    pub fn to_arg(&self) -> StyleArg {
        match self {
            StyleValue::Number(n) => StyleArg::Number(*n),
            StyleValue::Keyword(k) => StyleArg::Keyword(k.clone()),
            StyleValue::Paint(Paint::None) => StyleArg::None,
            StyleValue::Paint(Paint::Color(c)) => StyleArg::Color(c.clone()),
            StyleValue::Paint(Paint::Pattern(p)) => StyleArg::Url(p.name()),
            StyleValue::Dashes(d) if d.is_empty() => StyleArg::None,
            StyleValue::Dashes(d) => StyleArg::Numbers(d.clone()),
            StyleValue::Anchor(a) => StyleArg::Keyword(a.as_str().to_string()),
            StyleValue::WritingMode(w) => StyleArg::Keyword(w.as_str().to_string()),
            StyleValue::BaselineShift(b) => match b {
                BaselineShift::Baseline => StyleArg::Keyword("baseline".into()),
                BaselineShift::Sub => StyleArg::Keyword("sub".into()),
                BaselineShift::Super => StyleArg::Keyword("super".into()),
                BaselineShift::Length(n) => StyleArg::Number(*n),
                BaselineShift::Percent(p) => StyleArg::Keyword(format!("{p}%")),
            },
            StyleValue::ClipPath(c) => StyleArg::Url(c.name()),
        }
    }
}

/// Sparse map of explicitly set styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleTable {
    entries: BTreeMap<StyleName, StyleValue>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one entry. An unknown name or bad value leaves the table as it was.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let name: StyleName = name.parse()?;
        let value = name.coerce(value.into())?;
        self.entries.insert(name, value);
        Ok(())
    }

    /// Set several entries at once. Every entry is validated before any is
    /// stored.
    pub fn set_all<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let staged = entries
            .into_iter()
            .map(|(k, v)| {
                let name: StyleName = k.as_ref().parse()?;
                Ok((name, name.coerce(v.into())?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.entries.extend(staged);
        Ok(())
    }

    pub fn get(&self, name: StyleName) -> Option<&StyleValue> {
        self.entries.get(&name)
    }

    pub fn remove(&mut self, name: StyleName) -> Option<StyleValue> {
        self.entries.remove(&name)
    }

    /// Entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleName, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Referenced patterns and clip paths are copied along with the table.
impl DeepCopy for StyleTable {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    StyleValue::Paint(Paint::Pattern(pattern)) => {
                        StyleValue::Paint(Paint::Pattern(pattern.deep_copy_with(cx)))
                    }
                    StyleValue::ClipPath(clip_path) => StyleValue::ClipPath(clip_path.deep_copy_with(cx)),
                    other => other.clone(),
                };
                (*name, value)
            })
            .collect();
        StyleTable { entries }
    }
}
