//! Parley text shaping: glyph metrics and glyph drawing.
//!
//! Nothing is bundled. Layouts use the system font collection plus any
//! font registered with [`TextEngine::register_font`].

use kurbo::{Affine, Rect, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{
    Alignment, AlignmentOptions, FontContext, FontStack, FontStyle, FontWeight, FontWidth, Layout, LayoutContext,
    StyleProperty,
};
use peniko::{Blob, Brush, Color, Fill};
use rvg_core::{BackendError, BackendResult, FontSpec, GlyphMetrics, TextAnchor};
use std::borrow::Cow;
use std::sync::Arc;
use vello::Scene;

/// One text primitive ready to draw.
pub(crate) struct TextDraw<'a> {
    pub text: &'a str,
    pub font: &'a FontSpec,
    pub anchor: TextAnchor,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, Stroke)>,
    pub decoration: Option<&'a str>,
    /// Maps the pen position to the origin.
    pub transform: Affine,
}

/// Cached Parley contexts.
pub struct TextEngine {
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Make a TrueType/OpenType font available by its family name.
    pub fn register_font(&mut self, data: Vec<u8>) -> BackendResult<()> {
        let families = self
            .font_cx
            .collection
            .register_fonts(Blob::new(Arc::new(data)), None);
        if families.is_empty() {
            return Err(BackendError::Font("no font faces found in font data".into()));
        }
        log::debug!("registered {} font families", families.len());
        Ok(())
    }

    fn layout(&mut self, text: &str, font: &FontSpec, brush: Brush) -> Layout<Brush> {
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font.size as f32));
        builder.push_default(StyleProperty::Brush(brush));
        builder.push_default(StyleProperty::FontStack(font_stack(font)));
        if let Some(weight) = font.weight.as_deref().and_then(font_weight) {
            builder.push_default(StyleProperty::FontWeight(weight));
        }
        if let Some(style) = font.style.as_deref().and_then(font_style) {
            builder.push_default(StyleProperty::FontStyle(style));
        }
        if let Some(width) = font.stretch.as_deref().and_then(font_width) {
            builder.push_default(StyleProperty::FontWidth(width));
        }
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, Alignment::Start, AlignmentOptions::default());
        layout
    }

    /// Width of the whole probe and the first line's ascent and descent.
    pub fn measure(&mut self, probe: &str, font: &FontSpec) -> BackendResult<GlyphMetrics> {
        if probe.is_empty() {
            return Ok(GlyphMetrics::default());
        }
        let layout = self.layout(probe, font, Brush::default());
        let has_glyphs = layout.lines().any(|line| {
            line.items()
                .any(|item| matches!(item, PositionedLayoutItem::GlyphRun(run) if run.glyphs().next().is_some()))
        });
        let line = match layout.lines().next() {
            Some(line) if has_glyphs => line,
            _ => return Err(BackendError::Font(format!("no font available to measure {probe:?}"))),
        };
        let metrics = line.metrics();
        Ok(GlyphMetrics {
            width: f64::from(layout.full_width()),
            ascent: f64::from(metrics.ascent),
            descent: -f64::from(metrics.descent),
        })
    }

    /// Draw a run with its baseline at the origin of `draw.transform`,
    /// aligned by `draw.anchor`.
    pub(crate) fn draw(&mut self, scene: &mut Scene, draw: &TextDraw<'_>) {
        let fill_brush = Brush::Solid(draw.fill.unwrap_or(Color::TRANSPARENT));
        let layout = self.layout(draw.text, draw.font, fill_brush.clone());
        let width = f64::from(layout.full_width());
        let shift = match draw.anchor {
            TextAnchor::Start => 0.0,
            TextAnchor::Middle => -width / 2.0,
            TextAnchor::End => -width,
        };
        let baseline = layout
            .lines()
            .next()
            .map_or(0.0, |line| f64::from(line.metrics().baseline));
        let transform = draw.transform * Affine::translate((shift, -baseline));

        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let glyph_xform = run
                    .synthesis()
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph { id: glyph.id, x: gx, y: gy }
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                glyph_count += glyphs.len();

                if draw.fill.is_some() {
                    scene
                        .draw_glyphs(font)
                        .brush(&fill_brush)
                        .hint(true)
                        .transform(transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.iter().copied());
                }
                if let Some((color, stroke)) = &draw.stroke {
                    scene
                        .draw_glyphs(font)
                        .brush(&Brush::Solid(*color))
                        .transform(transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(stroke, glyphs.iter().copied());
                }

                let Some(decoration) = draw.decoration else {
                    continue;
                };
                let Some(color) = draw.fill.or(draw.stroke.as_ref().map(|(c, _)| *c)) else {
                    continue;
                };
                let metrics = run.metrics();
                let (offset, size) = match decoration {
                    "underline" => (metrics.underline_offset, metrics.underline_size),
                    "line-through" => (metrics.strikethrough_offset, metrics.strikethrough_size),
                    "overline" => (metrics.ascent, metrics.underline_size),
                    _ => continue,
                };
                let x0 = f64::from(glyph_run.offset());
                let x1 = x0 + f64::from(glyph_run.advance());
                let line_y = f64::from(y - offset);
                let half = f64::from(size) / 2.0;
                let rect = Rect::new(x0, line_y - half, x1, line_y + half);
                scene.fill(Fill::NonZero, transform, color, None, &rect);
            }
        }
        if glyph_count == 0 {
            log::warn!("no glyphs drawn for {:?}", draw.text);
        }
    }
}

fn font_stack(font: &FontSpec) -> FontStack<'static> {
    match (&font.font, &font.family) {
        (Some(name), _) => FontStack::Single(parley::FontFamily::Named(Cow::Owned(name.clone()))),
        (None, Some(family)) => FontStack::Source(Cow::Owned(family.clone())),
        (None, None) => FontStack::Source(Cow::Borrowed("sans-serif")),
    }
}

fn font_weight(keyword: &str) -> Option<FontWeight> {
    match keyword {
        "normal" => Some(FontWeight::NORMAL),
        "bold" | "bolder" => Some(FontWeight::BOLD),
        "lighter" => Some(FontWeight::LIGHT),
        other => other.parse::<f32>().ok().map(FontWeight::new),
    }
}

fn font_style(keyword: &str) -> Option<FontStyle> {
    match keyword {
        "normal" => Some(FontStyle::Normal),
        "italic" => Some(FontStyle::Italic),
        "oblique" => Some(FontStyle::Oblique(None)),
        _ => None,
    }
}

fn font_width(keyword: &str) -> Option<FontWidth> {
    match keyword {
        "ultra-condensed" => Some(FontWidth::ULTRA_CONDENSED),
        "extra-condensed" => Some(FontWidth::EXTRA_CONDENSED),
        "condensed" => Some(FontWidth::CONDENSED),
        "semi-condensed" => Some(FontWidth::SEMI_CONDENSED),
        "normal" => Some(FontWidth::NORMAL),
        "semi-expanded" => Some(FontWidth::SEMI_EXPANDED),
        "expanded" => Some(FontWidth::EXPANDED),
        "extra-expanded" => Some(FontWidth::EXTRA_EXPANDED),
        "ultra-expanded" => Some(FontWidth::ULTRA_EXPANDED),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_stack_prefers_explicit_font() {
        let spec = FontSpec {
            font: Some("Roboto".into()),
            family: Some("serif".into()),
            ..FontSpec::default()
        };
        assert!(matches!(font_stack(&spec), FontStack::Single(_)));
        let spec = FontSpec {
            family: Some("Georgia, serif".into()),
            ..FontSpec::default()
        };
        assert!(matches!(font_stack(&spec), FontStack::Source(ref s) if s == "Georgia, serif"));
    }

    #[test]
    fn test_font_keywords() {
        assert_eq!(font_weight("bold"), Some(FontWeight::BOLD));
        assert_eq!(font_weight("300"), Some(FontWeight::new(300.0)));
        assert_eq!(font_style("italic"), Some(FontStyle::Italic));
        assert_eq!(font_style("any"), None);
        assert_eq!(font_width("condensed"), Some(FontWidth::CONDENSED));
    }

    #[test]
    fn test_empty_probe_measures_zero() {
        let mut engine = TextEngine::new();
        let metrics = engine.measure("", &FontSpec::default()).unwrap();
        assert_eq!(metrics, GlyphMetrics::default());
    }

    #[test]
    fn test_register_rejects_non_font_data() {
        let mut engine = TextEngine::new();
        assert!(matches!(
            engine.register_font(b"not a font".to_vec()),
            Err(BackendError::Font(_))
        ));
    }
}
