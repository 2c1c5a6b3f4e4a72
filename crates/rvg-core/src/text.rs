//! Text layout.
//!
//! A run is either handed to the backend whole (the default strategy, when
//! every layout attribute is at its default) or broken into glyphs that are
//! positioned one by one from probed metrics. Glyph widths come from a
//! three-character probe (`a` + glyph + `a`) minus the width of `aa`, which
//! cancels side bearings; heights are `round(ascent - descent)`.

use crate::backend::FontSpec;
use crate::emit::{EmitContext, Primitive};
use crate::error::{Result, RvgError};
use crate::style::{BaselineShift, StyleArg, StyleName, StyleValue, TextAnchor, WritingMode};
use crate::transform::TransformOp;
use kurbo::{Affine, Point, Vec2};

/// Text attributes in scope, mirrored from emitted transforms and styles.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Composed transform of all enclosing scopes.
    pub affine: Affine,
    pub anchor: TextAnchor,
    pub writing_mode: WritingMode,
    pub glyph_orientation_horizontal: u16,
    pub glyph_orientation_vertical: u16,
    pub letter_spacing: f64,
    pub word_spacing: f64,
    pub baseline_shift: BaselineShift,
    pub font: FontSpec,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            affine: Affine::IDENTITY,
            anchor: TextAnchor::Start,
            writing_mode: WritingMode::LrTb,
            glyph_orientation_horizontal: 0,
            glyph_orientation_vertical: 90,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            baseline_shift: BaselineShift::Baseline,
            font: FontSpec::default(),
        }
    }
}

impl TextState {
    pub(crate) fn apply(&mut self, name: StyleName, value: &StyleValue) {
        match (name, value) {
            (StyleName::TextAnchor, StyleValue::Anchor(anchor)) => self.anchor = *anchor,
            (StyleName::WritingMode, StyleValue::WritingMode(mode)) => self.writing_mode = *mode,
            (StyleName::GlyphOrientationHorizontal, StyleValue::Number(deg)) => {
                self.glyph_orientation_horizontal = *deg as u16;
            }
            (StyleName::GlyphOrientationVertical, StyleValue::Number(deg)) => {
                self.glyph_orientation_vertical = *deg as u16;
            }
            (StyleName::LetterSpacing, StyleValue::Number(n)) => self.letter_spacing = *n,
            (StyleName::WordSpacing, StyleValue::Number(n)) => self.word_spacing = *n,
            (StyleName::BaselineShift, StyleValue::BaselineShift(shift)) => self.baseline_shift = *shift,
            (StyleName::FontSize, StyleValue::Number(n)) => self.font.size = *n,
            (StyleName::Font, StyleValue::Keyword(k)) => self.font.font = Some(k.clone()),
            (StyleName::FontFamily, StyleValue::Keyword(k)) => self.font.family = Some(k.clone()),
            (StyleName::FontStyle, StyleValue::Keyword(k)) => self.font.style = Some(k.clone()),
            (StyleName::FontWeight, StyleValue::Keyword(k)) => self.font.weight = Some(k.clone()),
            (StyleName::FontStretch, StyleValue::Keyword(k)) => self.font.stretch = Some(k.clone()),
            _ => {}
        }
    }

    /// True when the backend can place the whole run itself.
    pub fn uses_default_layout(&self) -> bool {
        self.baseline_shift == BaselineShift::Baseline
            && self.letter_spacing == 0.0
            && self.word_spacing == 0.0
            && self.writing_mode.is_left_to_right()
            && self.glyph_orientation_horizontal == 0
    }
}

/// Layout strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Default,
    LeftToRight,
    TopToBottom,
    RightToLeft,
}

impl Strategy {
    pub fn select(state: &TextState) -> Self {
        if state.uses_default_layout() {
            return Strategy::Default;
        }
        match state.writing_mode {
            WritingMode::LrTb | WritingMode::Lr => Strategy::LeftToRight,
            WritingMode::TbRl | WritingMode::Tb => Strategy::TopToBottom,
            WritingMode::RlTb | WritingMode::Rl => Strategy::RightToLeft,
        }
    }
}

/// Lay out `content` at `pen` and return the advance.
pub(crate) fn layout(ctx: &mut EmitContext<'_>, pen: Point, content: &str) -> Result<Vec2> {
    if content.is_empty() {
        return Ok(Vec2::ZERO);
    }
    let strategy = Strategy::select(ctx.text_state());
    log::trace!("text {:?} at ({}, {}) with {:?}", content, pen.x, pen.y, strategy);
    match strategy {
        Strategy::Default => default_layout(ctx, pen, content),
        Strategy::LeftToRight => left_to_right(ctx, pen, content),
        Strategy::TopToBottom => top_to_bottom(ctx, pen, content),
        Strategy::RightToLeft => Err(RvgError::Unsupported(format!(
            "right-to-left text layout (writing_mode {})",
            ctx.text_state().writing_mode.as_str()
        ))),
    }
}

fn default_layout(ctx: &mut EmitContext<'_>, pen: Point, content: &str) -> Result<Vec2> {
    ctx.primitive(Primitive::Text {
        x: pen.x,
        y: pen.y,
        text: content.to_string(),
    });
    let width = ctx.glyph_metrics(content)?.width;
    let dx = match ctx.text_state().anchor {
        TextAnchor::Start => width,
        TextAnchor::Middle => width / 2.0,
        TextAnchor::End => 0.0,
    };
    Ok(Vec2::new(dx, 0.0))
}

/// One positioned step of a run: a glyph or an inter-word gap.
struct Step {
    glyph: Option<char>,
    advance: Vec2,
}

/// Split on single spaces, dropping trailing empty words.
fn words(content: &str) -> Vec<&str> {
    let mut words: Vec<&str> = content.split(' ').collect();
    while words.last().is_some_and(|w| w.is_empty()) {
        words.pop();
    }
    words
}

/// Probed `(width, height)` of `glyph`, swapped for 90 and 270 degrees.
fn glyph_extent(ctx: &mut EmitContext<'_>, orientation: u16, glyph: &str, neutral: f64) -> Result<(f64, f64)> {
    let metrics = ctx.glyph_metrics(&format!("a{glyph}a"))?;
    let width = metrics.width - neutral;
    let height = (metrics.ascent - metrics.descent).round();
    Ok(match orientation {
        90 | 270 => (height, width),
        _ => (width, height),
    })
}

/// Collect steps with the advance produced by `letter` and `word`.
fn steps(
    ctx: &mut EmitContext<'_>,
    content: &str,
    orientation: u16,
    letter: impl Fn((f64, f64)) -> Vec2,
    word: impl Fn((f64, f64)) -> Vec2,
) -> Result<Vec<Step>> {
    let neutral = ctx.glyph_metrics("aa")?.width;
    let mut steps = Vec::new();
    let mut space = None;
    for (i, w) in words(content).into_iter().enumerate() {
        if i > 0 {
            let extent = match space {
                Some(extent) => extent,
                None => {
                    let extent = glyph_extent(ctx, orientation, " ", neutral)?;
                    space = Some(extent);
                    extent
                }
            };
            steps.push(Step {
                glyph: None,
                advance: word(extent),
            });
        }
        for ch in w.chars() {
            let mut buf = [0u8; 4];
            let extent = glyph_extent(ctx, orientation, ch.encode_utf8(&mut buf), neutral)?;
            steps.push(Step {
                glyph: Some(ch),
                advance: letter(extent),
            });
        }
    }
    Ok(steps)
}

/// Perpendicular displacement for the baseline shift in scope. Positive
/// values move down in user space.
fn baseline_offset(ctx: &mut EmitContext<'_>, orientation: u16, content: &str) -> Result<f64> {
    let shift = ctx.text_state().baseline_shift;
    if shift == BaselineShift::Baseline || content.is_empty() {
        return Ok(0.0);
    }
    let metrics = ctx.glyph_metrics(content)?;
    let extent = match orientation {
        0 | 180 => metrics.width,
        _ => metrics.ascent - metrics.descent,
    };
    Ok(match shift {
        BaselineShift::Baseline => 0.0,
        BaselineShift::Sub => extent,
        BaselineShift::Super => -extent,
        BaselineShift::Percent(pct) => -extent * pct / 100.0,
        BaselineShift::Length(len) => -len,
    })
}

/// Draw one glyph, rotated about its origin when oriented.
fn glyph(ctx: &mut EmitContext<'_>, orientation: u16, x: f64, y: f64, ch: char) {
    let text = Primitive::Text {
        x,
        y,
        text: ch.to_string(),
    };
    if orientation == 0 {
        ctx.primitive(text);
        return;
    }
    ctx.push();
    ctx.transform(TransformOp::Translate { tx: x, ty: y });
    ctx.transform(TransformOp::Rotate {
        degrees: f64::from(orientation),
    });
    ctx.transform(TransformOp::Translate { tx: -x, ty: -y });
    ctx.primitive(text);
    ctx.pop();
}

fn left_to_right(ctx: &mut EmitContext<'_>, pen: Point, content: &str) -> Result<Vec2> {
    let state = ctx.text_state().clone();
    let orientation = state.glyph_orientation_horizontal;
    let steps = steps(
        ctx,
        content,
        orientation,
        |(w, h)| Vec2::new(w + state.letter_spacing, h),
        |(w, _)| Vec2::new(w + state.word_spacing, 0.0),
    )?;
    let total: f64 = steps.iter().map(|s| s.advance.x).sum();
    let tallest = steps.iter().map(|s| s.advance.y).fold(0.0, f64::max);
    let mut advances: Vec<f64> = steps.iter().map(|s| s.advance.x).collect();

    ctx.push();
    ctx.style_arg(StyleName::TextAnchor, StyleArg::Keyword(TextAnchor::Start.as_str().into()));

    let (mut x, mut y) = (pen.x, pen.y);
    x -= match state.anchor {
        TextAnchor::Start => 0.0,
        TextAnchor::Middle => total / 2.0,
        TextAnchor::End => total,
    };
    match orientation {
        90 => y -= tallest,
        180 => {
            // Glyphs rotate about their origin, so each one is drawn one
            // advance later.
            if !advances.is_empty() {
                x += advances.remove(0);
                advances.push(0.0);
            }
            y -= tallest;
        }
        270 => x += advances.first().copied().unwrap_or(0.0),
        _ => {}
    }
    y += baseline_offset(ctx, orientation, content)?;

    for (step, advance) in steps.iter().zip(advances) {
        if let Some(ch) = step.glyph {
            glyph(ctx, orientation, x, y, ch);
        }
        x += advance;
    }
    ctx.pop();
    Ok(Vec2::new(total, 0.0))
}

fn top_to_bottom(ctx: &mut EmitContext<'_>, pen: Point, content: &str) -> Result<Vec2> {
    let state = ctx.text_state().clone();
    let orientation = state.glyph_orientation_vertical;
    let steps = steps(
        ctx,
        content,
        orientation,
        |(w, h)| Vec2::new(w, h + state.letter_spacing),
        |(_, h)| Vec2::new(0.0, h + state.word_spacing),
    )?;
    let total: f64 = steps.iter().map(|s| s.advance.y).sum();
    let widest = steps.iter().map(|s| s.advance.x).fold(0.0, f64::max);
    let mut advances: Vec<f64> = steps.iter().map(|s| s.advance.y).collect();

    ctx.push();
    ctx.style_arg(StyleName::TextAnchor, StyleArg::Keyword(TextAnchor::Start.as_str().into()));

    let (mut x, mut y) = (pen.x, pen.y);
    y -= match state.anchor {
        TextAnchor::Start => 0.0,
        TextAnchor::Middle => total / 2.0,
        TextAnchor::End => total,
    };
    match orientation {
        0 => {
            x -= widest / 2.0;
            y += advances.first().copied().unwrap_or(0.0);
        }
        90 => x -= widest / 2.0,
        180 => x += widest / 2.0,
        270 => {
            x += widest / 2.0;
            if !advances.is_empty() {
                y += advances.remove(0);
                advances.push(0.0);
            }
        }
        _ => {}
    }
    x -= baseline_offset(ctx, orientation, content)?;

    for (step, advance) in steps.iter().zip(advances) {
        if let Some(ch) = step.glyph {
            let centre = (widest - step.advance.x) / 2.0;
            let x_shift = if orientation == 180 { -centre } else { centre };
            glyph(ctx, orientation, x + x_shift, y, ch);
        }
        y += advance;
    }
    ctx.pop();
    Ok(Vec2::new(0.0, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use crate::style::StyleTable;

    fn run(styles: &[(&str, &str)], content: &str, pen: Point) -> (Result<Vec2>, Vec<Primitive>) {
        let mut backend = RecordingBackend::new();
        let mut ctx = EmitContext::new(&mut backend);
        let mut table = StyleTable::new();
        table.set_all(styles.iter().copied()).unwrap();
        ctx.push();
        ctx.apply_styles(&table).unwrap();
        let advance = layout(&mut ctx, pen, content);
        ctx.pop();
        (advance, ctx.finish().into_vec())
    }

    fn glyph_positions(primitives: &[Primitive]) -> Vec<(f64, f64, String)> {
        primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { x, y, text } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_words_drop_trailing_empties() {
        assert_eq!(words("a b  "), vec!["a", "b"]);
        assert_eq!(words("a  b"), vec!["a", "", "b"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_strategy_selection() {
        let mut state = TextState::default();
        assert_eq!(Strategy::select(&state), Strategy::Default);
        state.writing_mode = WritingMode::TbRl;
        assert_eq!(Strategy::select(&state), Strategy::TopToBottom);
        state.writing_mode = WritingMode::Lr;
        state.letter_spacing = 1.0;
        assert_eq!(Strategy::select(&state), Strategy::LeftToRight);
        state.writing_mode = WritingMode::RlTb;
        assert_eq!(Strategy::select(&state), Strategy::RightToLeft);
    }

    #[test]
    fn test_default_strategy_hands_run_to_backend() {
        let (advance, prims) = run(&[], "Hi", Point::new(5.0, 20.0));
        let positions = glyph_positions(&prims);
        assert_eq!(positions, vec![(5.0, 20.0, "Hi".to_string())]);
        // 'H' 0.7em + 'i' 0.3em at 12px.
        assert!((advance.unwrap().x - 12.0).abs() < 1e-9);

        let (advance, _) = run(&[("text_anchor", "middle")], "Hi", Point::ZERO);
        assert!((advance.unwrap().x - 6.0).abs() < 1e-9);
        let (advance, _) = run(&[("text_anchor", "end")], "Hi", Point::ZERO);
        assert!(advance.unwrap().x.abs() < 1e-9);
    }

    #[test]
    fn test_left_to_right_glyphs_increase() {
        let (advance, prims) = run(&[("letter_spacing", "1")], "abc", Point::new(10.0, 50.0));
        let positions = glyph_positions(&prims);
        assert_eq!(positions.len(), 3);
        assert!(positions.windows(2).all(|w| w[1].0 > w[0].0));
        assert!((positions[0].0 - 10.0).abs() < 1e-9);
        // 0.6em * 12 + 1 per glyph.
        assert!((positions[1].0 - 18.2).abs() < 1e-9);
        assert!((advance.unwrap().x - 24.6).abs() < 1e-9);
    }

    #[test]
    fn test_left_to_right_anchor_shifts() {
        let (_, start) = run(&[("letter_spacing", "1")], "abc", Point::new(100.0, 0.0));
        let (_, middle) = run(&[("letter_spacing", "1"), ("text_anchor", "middle")], "abc", Point::new(100.0, 0.0));
        let (_, end) = run(&[("letter_spacing", "1"), ("text_anchor", "end")], "abc", Point::new(100.0, 0.0));
        let first = |prims: &[Primitive]| glyph_positions(prims)[0].0;
        assert!((first(&start) - 100.0).abs() < 1e-9);
        assert!((first(&middle) - (100.0 - 24.6 / 2.0)).abs() < 1e-9);
        assert!((first(&end) - (100.0 - 24.6)).abs() < 1e-9);
    }

    #[test]
    fn test_laid_out_run_forces_start_anchor() {
        let (_, prims) = run(&[("word_spacing", "2"), ("text_anchor", "end")], "a b", Point::ZERO);
        let forced = prims.iter().any(|p| {
            *p == Primitive::Style {
                name: StyleName::TextAnchor,
                arg: StyleArg::Keyword("start".into()),
            }
        });
        assert!(forced);
    }

    #[test]
    fn test_word_spacing_adds_gap() {
        let (advance, prims) = run(&[("word_spacing", "4")], "a b", Point::ZERO);
        let positions = glyph_positions(&prims);
        assert_eq!(positions.len(), 2);
        // 'a' 7.2, space 3.0 + 4.
        assert!((positions[1].0 - 14.2).abs() < 1e-9);
        assert!((advance.unwrap().x - 21.4).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_glyphs_are_scoped() {
        let (_, prims) = run(&[("glyph_orientation_horizontal", "90")], "ab", Point::new(10.0, 40.0));
        let rotations = prims
            .iter()
            .filter(|p| matches!(p, Primitive::Transform(TransformOp::Rotate { degrees }) if *degrees == 90.0))
            .count();
        assert_eq!(rotations, 2);
        let positions = glyph_positions(&prims);
        // Rotated glyphs advance by their height and sit one glyph width higher.
        assert!((positions[1].0 - 22.0).abs() < 1e-9);
        assert!((positions[0].1 - (40.0 - 7.2)).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_shift() {
        let (_, prims) = run(&[("baseline_shift", "super")], "a", Point::new(0.0, 30.0));
        assert!((glyph_positions(&prims)[0].1 - (30.0 - 7.2)).abs() < 1e-9);
        let (_, prims) = run(&[("baseline_shift", "sub")], "a", Point::new(0.0, 30.0));
        assert!((glyph_positions(&prims)[0].1 - (30.0 + 7.2)).abs() < 1e-9);
        let (_, prims) = run(&[("baseline_shift", "5")], "a", Point::new(0.0, 30.0));
        assert!((glyph_positions(&prims)[0].1 - 25.0).abs() < 1e-9);
        let (_, prims) = run(&[("baseline_shift", "50%")], "a", Point::new(0.0, 30.0));
        assert!((glyph_positions(&prims)[0].1 - (30.0 - 3.6)).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_shift_measures_whole_run() {
        // 'm' alone is 10.8 wide; "mi" is 14.4.
        let (_, prims) = run(&[("baseline_shift", "super")], "mi", Point::new(0.0, 30.0));
        for (_, y, _) in glyph_positions(&prims) {
            assert!((y - (30.0 - 14.4)).abs() < 1e-9);
        }
        let (_, prims) = run(&[("baseline_shift", "-50%")], "mi", Point::new(0.0, 30.0));
        assert!((glyph_positions(&prims)[1].1 - (30.0 + 7.2)).abs() < 1e-9);
    }

    #[test]
    fn test_top_to_bottom_advances_down() {
        let (advance, prims) = run(&[("writing_mode", "tb")], "ab", Point::new(50.0, 10.0));
        let positions = glyph_positions(&prims);
        assert_eq!(positions.len(), 2);
        assert!(positions[1].1 > positions[0].1);
        // Default vertical orientation is 90: each glyph advances by its width.
        assert!((advance.unwrap().y - 14.4).abs() < 1e-9);
    }

    #[test]
    fn test_top_to_bottom_upright_centres_glyphs() {
        let (advance, prims) = run(
            &[("writing_mode", "tb"), ("glyph_orientation_vertical", "0")],
            "mi",
            Point::new(50.0, 10.0),
        );
        let positions = glyph_positions(&prims);
        // 'm' is 10.8 wide, 'i' 3.6; both centre on x = 50.
        assert!((positions[0].0 - (50.0 - 5.4)).abs() < 1e-9);
        assert!((positions[1].0 - (50.0 - 1.8)).abs() < 1e-9);
        // The first glyph hangs below the pen by its height.
        assert!((positions[0].1 - 22.0).abs() < 1e-9);
        assert!((advance.unwrap().y - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_to_left_is_unsupported() {
        let (advance, prims) = run(&[("writing_mode", "rl-tb")], "abc", Point::ZERO);
        assert!(matches!(advance, Err(RvgError::Unsupported(_))));
        assert!(glyph_positions(&prims).is_empty());
    }

    #[test]
    fn test_empty_run_draws_nothing() {
        let (advance, prims) = run(&[("letter_spacing", "2")], "", Point::ZERO);
        assert_eq!(advance.unwrap(), Vec2::ZERO);
        assert!(glyph_positions(&prims).is_empty());
    }
}
