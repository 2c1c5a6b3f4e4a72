//! Vello-based raster backend.
//!
//! Each `render` call replays a primitive stream into a [`vello::Scene`]. The
//! graphics state (transform, paint, font, anchor) lives on a stack that
//! follows push/pop. Clip paths become clip layers that are popped with the
//! scope that applied them. Patterns are recorded into their own scene and
//! tiled over the painted area.

use crate::decode::image_data;
use crate::fonts::{TextDraw, TextEngine};
use crate::paint::{parse_color, PaintSource, PaintState};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Stroke};
use peniko::{Extend, Fill, ImageBrush, ImageData, Mix};
use rvg_core::{
    Backend, BackendError, BackendResult, CanvasFill, CanvasSpec, ClipUnits, Description, FontSpec, GlyphMetrics,
    GlyphMetricsSource, Primitive, RasterImage, StyleArg, StyleName, TextAnchor,
};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

/// Pattern tiles drawn for one painted area, at most.
const MAX_TILES: usize = 16_384;

/// Tolerance for flattening shapes into paths.
const TOLERANCE: f64 = 0.1;

/// A canvas: the Vello scene everything is drawn into.
pub struct VelloCanvas {
    scene: Scene,
    width: u32,
    height: u32,
    description: Description,
}

impl VelloCanvas {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets the canvas to empty).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn description(&self) -> &Description {
        &self.description
    }
}

/// Vello backend with Parley text.
#[derive(Default)]
pub struct VelloBackend {
    text: TextEngine,
    /// Decoded image data, keyed by the address of the shared pixels. The
    /// stored `Arc` keeps the address from being reused.
    image_cache: HashMap<usize, (Arc<RasterImage>, ImageData)>,
}

impl VelloBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_font(&mut self, data: Vec<u8>) -> BackendResult<()> {
        self.text.register_font(data)
    }

    fn image_data(&mut self, image: &Arc<RasterImage>) -> ImageData {
        let key = Arc::as_ptr(image) as usize;
        self.image_cache
            .entry(key)
            .or_insert_with(|| (Arc::clone(image), image_data(image)))
            .1
            .clone()
    }

    fn paint_background(&mut self, scene: &mut Scene, spec: &CanvasSpec) -> BackendResult<()> {
        let (width, height) = (f64::from(spec.width), f64::from(spec.height));
        let bounds = Rect::new(0.0, 0.0, width, height);
        let backdrop = match &spec.fill {
            CanvasFill::Color(backdrop) => Some(backdrop),
            CanvasFill::Image { backdrop, .. } => backdrop.as_ref(),
            CanvasFill::Texture(_) | CanvasFill::Transparent => None,
        };
        if let Some(backdrop) = backdrop {
            let color = parse_color(&backdrop.color)?.multiply_alpha(backdrop.opacity as f32);
            scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &bounds);
        }

        let image = match &spec.fill {
            CanvasFill::Texture(image) | CanvasFill::Image { image, .. } => image,
            CanvasFill::Color(_) | CanvasFill::Transparent => return Ok(()),
        };
        let data = self.image_data(image);
        if spec.fill.is_tiled() {
            let brush = ImageBrush::new(data).with_extend(Extend::Repeat);
            scene.fill(Fill::NonZero, Affine::IDENTITY, &brush, None, &bounds);
            return Ok(());
        }
        let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
        scene.push_layer(Mix::Clip, 1.0, Affine::IDENTITY, &bounds);
        for rect in spec.fill.image_rects(width, height) {
            let transform = Affine::translate((rect.x0, rect.y0))
                * Affine::scale_non_uniform(rect.width() / iw, rect.height() / ih);
            scene.draw_image(&data.clone().into(), transform);
        }
        scene.pop_layer();
        Ok(())
    }
}

impl GlyphMetricsSource for VelloBackend {
    // Outline metrics do not depend on the transform.
    fn glyph_metrics(&mut self, probe: &str, font: &FontSpec, _affine: Affine) -> BackendResult<GlyphMetrics> {
        self.text.measure(probe, font)
    }
}

impl Backend for VelloBackend {
    type Canvas = VelloCanvas;

    fn create_canvas(&mut self, spec: &CanvasSpec) -> BackendResult<VelloCanvas> {
        let mut scene = Scene::new();
        self.paint_background(&mut scene, spec)?;
        log::debug!("created {}x{} canvas", spec.width, spec.height);
        Ok(VelloCanvas {
            scene,
            width: spec.width,
            height: spec.height,
            description: spec.description.clone(),
        })
    }

    fn render(&mut self, canvas: &mut VelloCanvas, primitives: &[Primitive]) -> BackendResult<()> {
        let mut frame = Frame::new(self, &mut canvas.scene);
        for primitive in primitives {
            frame.apply(primitive)?;
        }
        frame.finish()
    }
}

/// Graphics state of one scope.
#[derive(Debug, Clone)]
struct GraphicsState {
    transform: Affine,
    paint: PaintState,
    font: FontSpec,
    anchor: TextAnchor,
    /// Object-bounding-box clip waiting for the next shape's bounds.
    pending_clip: Option<BezPath>,
    /// Layers pushed in this scope.
    layers: usize,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            paint: PaintState::default(),
            font: FontSpec::default(),
            anchor: TextAnchor::Start,
            pending_clip: None,
            layers: 0,
        }
    }
}

impl GraphicsState {
    fn child(&self) -> Self {
        Self {
            layers: 0,
            ..self.clone()
        }
    }
}

/// A clip path being recorded.
struct ClipRecording {
    name: String,
    units: ClipUnits,
    origin: Affine,
    path: BezPath,
    /// Open clip definitions nested inside this one. Their content is
    /// not part of the recorded path.
    nested: usize,
}

struct ClipDef {
    units: ClipUnits,
    path: BezPath,
}

/// A pattern tile being recorded.
struct PatternRecording {
    name: String,
    tile: Rect,
    scene: Scene,
}

struct PatternDef {
    tile: Rect,
    scene: Scene,
}

/// State of one `render` call.
struct Frame<'a> {
    backend: &'a mut VelloBackend,
    canvas: &'a mut Scene,
    states: Vec<GraphicsState>,
    clips: HashMap<String, ClipDef>,
    patterns: HashMap<String, PatternDef>,
    clip_recording: Option<ClipRecording>,
    pattern_recordings: Vec<PatternRecording>,
}

impl<'a> Frame<'a> {
    fn new(backend: &'a mut VelloBackend, canvas: &'a mut Scene) -> Self {
        Self {
            backend,
            canvas,
            states: vec![GraphicsState::default()],
            clips: HashMap::new(),
            patterns: HashMap::new(),
            clip_recording: None,
            pattern_recordings: Vec::new(),
        }
    }

    fn state(&self) -> &GraphicsState {
        // The root state is never popped.
        &self.states[self.states.len() - 1]
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// The scene drawing goes to: the innermost pattern tile, or the canvas.
    fn target(&mut self) -> &mut Scene {
        match self.pattern_recordings.last_mut() {
            Some(recording) => &mut recording.scene,
            None => &mut *self.canvas,
        }
    }

    fn apply(&mut self, primitive: &Primitive) -> BackendResult<()> {
        match primitive {
            Primitive::Push => {
                let child = self.state().child();
                self.states.push(child);
            }
            Primitive::Pop => self.pop_state()?,
            Primitive::Transform(op) => {
                let state = self.state_mut();
                state.transform = state.transform * op.to_affine();
            }
            Primitive::Style { name, arg } => self.style(*name, arg)?,
            Primitive::Circle { cx, cy, r } => {
                self.draw_path(kurbo::Circle::new((*cx, *cy), *r).to_path(TOLERANCE))?;
            }
            Primitive::Ellipse { cx, cy, rx, ry } => {
                let ellipse = kurbo::Ellipse::new((*cx, *cy), (*rx, *ry), 0.0);
                self.draw_path(ellipse.to_path(TOLERANCE))?;
            }
            Primitive::Line { x1, y1, x2, y2 } => {
                self.draw_path(kurbo::Line::new((*x1, *y1), (*x2, *y2)).to_path(TOLERANCE))?;
            }
            Primitive::Path(path) => self.draw_path(path.clone())?,
            Primitive::Rectangle { x, y, width, height } => {
                self.draw_path(Rect::new(*x, *y, x + width, y + height).to_path(TOLERANCE))?;
            }
            Primitive::RoundRectangle {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let rect = Rect::new(*x, *y, x + width, y + height);
                self.draw_path(round_rect_path(rect, *rx, *ry))?;
            }
            Primitive::Polygon(points) => self.draw_path(polyline_path(points, true))?,
            Primitive::Polyline(points) => self.draw_path(polyline_path(points, false))?,
            Primitive::Text { x, y, text } => self.draw_text(*x, *y, text)?,
            Primitive::Image {
                x,
                y,
                width,
                height,
                image,
            } => self.draw_image(Rect::new(*x, *y, x + width, y + height), image),
            Primitive::BeginClipPath { name } => {
                if let Some(recording) = &mut self.clip_recording {
                    // Nested viewport clips cannot intersect a single path.
                    log::trace!("skipping clip path {name} inside {}", recording.name);
                    recording.nested += 1;
                    return Ok(());
                }
                self.clip_recording = Some(ClipRecording {
                    name: name.clone(),
                    units: ClipUnits::default(),
                    origin: self.state().transform,
                    path: BezPath::new(),
                    nested: 0,
                });
            }
            Primitive::ClipUnits(units) => match &mut self.clip_recording {
                Some(recording) if recording.nested == 0 => recording.units = *units,
                Some(_) => {}
                None => log::warn!("clip units outside a clip path definition"),
            },
            Primitive::EndClipPath => {
                if let Some(recording) = self.clip_recording.as_mut().filter(|r| r.nested > 0) {
                    recording.nested -= 1;
                    return Ok(());
                }
                let recording = self
                    .clip_recording
                    .take()
                    .ok_or_else(|| BackendError::RenderFailed("clip path ended without beginning".into()))?;
                log::trace!("defined clip path {}", recording.name);
                self.clips.insert(
                    recording.name,
                    ClipDef {
                        units: recording.units,
                        path: recording.path,
                    },
                );
            }
            Primitive::BeginPattern {
                name,
                x,
                y,
                width,
                height,
            } => {
                let mut state = self.state().child();
                state.transform = Affine::IDENTITY;
                self.states.push(state);
                self.pattern_recordings.push(PatternRecording {
                    name: name.clone(),
                    tile: Rect::new(*x, *y, x + width, y + height),
                    scene: Scene::new(),
                });
            }
            Primitive::EndPattern => {
                self.pop_state()?;
                let recording = self
                    .pattern_recordings
                    .pop()
                    .ok_or_else(|| BackendError::RenderFailed("pattern ended without beginning".into()))?;
                log::trace!("defined pattern {}", recording.name);
                self.patterns.insert(
                    recording.name,
                    PatternDef {
                        tile: recording.tile,
                        scene: recording.scene,
                    },
                );
            }
        }
        Ok(())
    }

    fn pop_state(&mut self) -> BackendResult<()> {
        if self.states.len() < 2 {
            return Err(BackendError::RenderFailed("pop without matching push".into()));
        }
        let layers = self.state().layers;
        let scene = self.target();
        for _ in 0..layers {
            scene.pop_layer();
        }
        self.states.pop();
        Ok(())
    }

    fn style(&mut self, name: StyleName, arg: &StyleArg) -> BackendResult<()> {
        if let (StyleName::ClipPath, StyleArg::Url(clip)) = (name, arg) {
            return self.apply_clip(clip);
        }
        let state = self.state_mut();
        if state.paint.apply(name, arg)? {
            return Ok(());
        }
        match (name, arg) {
            (StyleName::FontSize, StyleArg::Number(size)) => state.font.size = *size,
            (StyleName::Font, StyleArg::Keyword(k)) => state.font.font = Some(k.clone()),
            (StyleName::FontFamily, StyleArg::Keyword(k)) => state.font.family = Some(k.clone()),
            (StyleName::FontStyle, StyleArg::Keyword(k)) => state.font.style = Some(k.clone()),
            (StyleName::FontWeight, StyleArg::Keyword(k)) => state.font.weight = Some(k.clone()),
            (StyleName::FontStretch, StyleArg::Keyword(k)) => state.font.stretch = Some(k.clone()),
            (StyleName::TextAnchor, StyleArg::Keyword(k)) => {
                state.anchor = match k.as_str() {
                    "middle" => TextAnchor::Middle,
                    "end" => TextAnchor::End,
                    _ => TextAnchor::Start,
                }
            }
            // Glyph placement styles are resolved before the stream is built.
            _ => log::trace!("ignoring {name} in backend"),
        }
        Ok(())
    }

    fn apply_clip(&mut self, name: &str) -> BackendResult<()> {
        if self.clip_recording.is_some() {
            log::warn!("clip path {name} applied inside a clip path definition is ignored");
            return Ok(());
        }
        let clip = self
            .clips
            .get(name)
            .ok_or_else(|| BackendError::UndefinedResource(name.to_string()))?;
        match clip.units {
            ClipUnits::UserSpaceOnUse => {
                let path = clip.path.clone();
                let transform = self.state().transform;
                self.target().push_layer(Mix::Clip, 1.0, transform, &path);
                self.state_mut().layers += 1;
            }
            ClipUnits::ObjectBoundingBox => {
                let path = clip.path.clone();
                self.state_mut().pending_clip = Some(path);
            }
        }
        Ok(())
    }

    /// Push a bounding-box clip sized to the shape about to be drawn.
    fn apply_pending_clip(&mut self, bounds: Rect) {
        let Some(path) = self.state_mut().pending_clip.take() else {
            return;
        };
        let transform = self.state().transform
            * Affine::translate((bounds.x0, bounds.y0))
            * Affine::scale_non_uniform(bounds.width(), bounds.height());
        self.target().push_layer(Mix::Clip, 1.0, transform, &path);
        self.state_mut().layers += 1;
    }

    fn draw_path(&mut self, path: BezPath) -> BackendResult<()> {
        if let Some(recording) = &mut self.clip_recording {
            if recording.nested > 0 {
                return Ok(());
            }
            let mut local = path;
            local.apply_affine(recording.origin.inverse() * self.states[self.states.len() - 1].transform);
            recording.path.extend(local.elements().iter().copied());
            return Ok(());
        }
        self.apply_pending_clip(path.bounding_box());
        let state = self.state().clone();
        let transform = state.transform;

        match &state.paint.fill {
            PaintSource::None => {}
            PaintSource::Solid(color) => {
                let color = color.multiply_alpha(state.paint.fill_alpha());
                self.target().fill(state.paint.fill_rule, transform, color, None, &path);
            }
            PaintSource::Pattern(name) => self.fill_pattern(name, &path, transform, state.paint.fill_alpha())?,
        }

        let Some(stroke) = state.paint.stroke_style() else {
            return Ok(());
        };
        match &state.paint.stroke {
            PaintSource::None => {}
            PaintSource::Solid(color) => {
                let color = color.multiply_alpha(state.paint.stroke_alpha());
                self.target().stroke(&stroke, transform, color, None, &path);
            }
            PaintSource::Pattern(name) => {
                let outline = stroke_outline(&path, &stroke);
                self.fill_pattern(name, &outline, transform, state.paint.stroke_alpha())?;
            }
        }
        Ok(())
    }

    /// Tile a pattern over `area`, clipped to it.
    fn fill_pattern(&mut self, name: &str, area: &BezPath, transform: Affine, alpha: f32) -> BackendResult<()> {
        let pattern = self
            .patterns
            .get(name)
            .ok_or_else(|| BackendError::UndefinedResource(name.to_string()))?;
        let origins = tile_origins(pattern.tile, area.bounding_box(), MAX_TILES);
        if origins.is_empty() {
            return Ok(());
        }
        let scene = match self.pattern_recordings.last_mut() {
            Some(recording) => &mut recording.scene,
            None => &mut *self.canvas,
        };
        scene.push_layer(Mix::Normal, alpha, transform, area);
        for origin in origins {
            scene.append(&pattern.scene, Some(transform * Affine::translate(origin.to_vec2())));
        }
        scene.pop_layer();
        Ok(())
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str) -> BackendResult<()> {
        if self.clip_recording.is_some() {
            log::warn!("text in clip path definitions is not supported");
            return Ok(());
        }
        let state = self.state().clone();
        let fill = match &state.paint.fill {
            PaintSource::Solid(color) => Some(color.multiply_alpha(state.paint.fill_alpha())),
            PaintSource::None => None,
            PaintSource::Pattern(name) => {
                log::warn!("pattern {name} can't paint text, drawing unfilled");
                None
            }
        };
        let stroke = match (&state.paint.stroke, state.paint.stroke_style()) {
            (PaintSource::Solid(color), Some(stroke)) => Some((color.multiply_alpha(state.paint.stroke_alpha()), stroke)),
            _ => None,
        };
        if fill.is_none() && stroke.is_none() {
            return Ok(());
        }
        let draw = TextDraw {
            text,
            font: &state.font,
            anchor: state.anchor,
            fill,
            stroke,
            decoration: state.paint.decoration.as_deref(),
            transform: state.transform * Affine::translate((x, y)),
        };
        let scene = match self.pattern_recordings.last_mut() {
            Some(recording) => &mut recording.scene,
            None => &mut *self.canvas,
        };
        self.backend.text.draw(scene, &draw);
        Ok(())
    }

    fn draw_image(&mut self, rect: Rect, image: &Arc<RasterImage>) {
        if self.clip_recording.is_some() {
            log::warn!("images in clip path definitions are ignored");
            return;
        }
        let data = self.backend.image_data(image);
        let state = self.state();
        let transform = state.transform
            * Affine::translate((rect.x0, rect.y0))
            * Affine::scale_non_uniform(
                rect.width() / f64::from(image.width()),
                rect.height() / f64::from(image.height()),
            );
        let alpha = state.paint.opacity as f32;
        let layer_transform = state.transform;
        let scene = self.target();
        if alpha < 1.0 {
            scene.push_layer(Mix::Normal, alpha, layer_transform, &rect);
            scene.draw_image(&data.into(), transform);
            scene.pop_layer();
        } else {
            scene.draw_image(&data.into(), transform);
        }
    }

    /// Close layers left open by the root state.
    fn finish(mut self) -> BackendResult<()> {
        if self.states.len() != 1 || self.clip_recording.is_some() || !self.pattern_recordings.is_empty() {
            return Err(BackendError::RenderFailed("unbalanced primitive stream".into()));
        }
        let layers = self.state().layers;
        for _ in 0..layers {
            self.canvas.pop_layer();
        }
        Ok(())
    }
}

fn polyline_path(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for point in iter {
            path.line_to(*point);
        }
        if close {
            path.close_path();
        }
    }
    path
}

/// A rectangle with elliptical corners of radii `rx` and `ry`: a circular
/// rounded rect built in a space squeezed by `rx / ry`, then stretched back.
fn round_rect_path(rect: Rect, rx: f64, ry: f64) -> BezPath {
    let rx = rx.min(rect.width() / 2.0);
    let ry = ry.min(rect.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return rect.to_path(TOLERANCE);
    }
    let k = rx / ry;
    let squeezed = Rect::new(rect.x0 / k, rect.y0, rect.x1 / k, rect.y1);
    let mut path = kurbo::RoundedRect::from_rect(squeezed, ry).to_path(TOLERANCE);
    path.apply_affine(Affine::scale_non_uniform(k, 1.0));
    path
}

fn stroke_outline(path: &BezPath, stroke: &Stroke) -> BezPath {
    kurbo::stroke(path.elements().iter().copied(), stroke, &kurbo::StrokeOpts::default(), TOLERANCE)
}

/// Origins of the tiles of `tile`'s lattice that overlap `bounds`.
fn tile_origins(tile: Rect, bounds: Rect, limit: usize) -> Vec<Point> {
    let (w, h) = (tile.width(), tile.height());
    if w <= 0.0 || h <= 0.0 || (bounds.width() <= 0.0 && bounds.height() <= 0.0) {
        return Vec::new();
    }
    let i0 = ((bounds.x0 - tile.x0) / w).floor() as i64;
    let i1 = ((bounds.x1 - tile.x0) / w).ceil() as i64;
    let j0 = ((bounds.y0 - tile.y0) / h).floor() as i64;
    let j1 = ((bounds.y1 - tile.y0) / h).ceil() as i64;
    let count = (i1 - i0).max(1) as usize * (j1 - j0).max(1) as usize;
    if count > limit {
        log::warn!("pattern needs {count} tiles, drawing the first {limit}");
    }
    let mut origins = Vec::new();
    for j in j0..j1.max(j0 + 1) {
        for i in i0..i1.max(i0 + 1) {
            if origins.len() == limit {
                return origins;
            }
            origins.push(Point::new(tile.x0 + i as f64 * w, tile.y0 + j as f64 * h));
        }
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvg_core::prelude::*;
    use rvg_core::{Backdrop, Rvg, RvgError, TransformOp};

    fn spec(fill: CanvasFill) -> CanvasSpec {
        CanvasSpec {
            width: 20,
            height: 10,
            fill,
            description: Description::default(),
        }
    }

    fn canvas(backend: &mut VelloBackend) -> VelloCanvas {
        backend.create_canvas(&spec(CanvasFill::Transparent)).unwrap()
    }

    fn style(name: StyleName, arg: StyleArg) -> Primitive {
        Primitive::Style { name, arg }
    }

    #[test]
    fn test_transparent_canvas_is_empty() {
        let mut backend = VelloBackend::new();
        let canvas = canvas(&mut backend);
        assert!(canvas.scene().encoding().is_empty());
        assert_eq!((canvas.width(), canvas.height()), (20, 10));
    }

    #[test]
    fn test_background_color() {
        let mut backend = VelloBackend::new();
        let fill = CanvasFill::Color(Backdrop {
            color: "white".into(),
            opacity: 1.0,
        });
        let canvas = backend.create_canvas(&spec(fill)).unwrap();
        assert!(!canvas.scene().encoding().is_empty());

        let fill = CanvasFill::Color(Backdrop {
            color: "no-such-color".into(),
            opacity: 1.0,
        });
        assert!(matches!(
            backend.create_canvas(&spec(fill)),
            Err(BackendError::UnknownColor(_))
        ));
    }

    #[test]
    fn test_background_texture_drawn() {
        let mut backend = VelloBackend::new();
        let texture = Arc::new(RasterImage::solid(4, 4, [0, 0, 255, 255]).unwrap());
        let canvas = backend.create_canvas(&spec(CanvasFill::Texture(texture))).unwrap();
        assert!(!canvas.scene().encoding().is_empty());
        assert_eq!(backend.image_cache.len(), 1);
    }

    #[test]
    fn test_tiny_texture_on_large_canvas() {
        let mut backend = VelloBackend::new();
        let texture = Arc::new(RasterImage::solid(1, 1, [0, 255, 0, 255]).unwrap());
        let spec = CanvasSpec {
            width: 3000,
            height: 3000,
            fill: CanvasFill::Texture(texture),
            description: Description::default(),
        };
        assert_eq!(spec.fill.image_rects(3000.0, 3000.0).len(), 1);
        let canvas = backend.create_canvas(&spec).unwrap();
        assert!(!canvas.scene().encoding().is_empty());
        assert_eq!(backend.image_cache.len(), 1);
    }

    #[test]
    fn test_shapes_draw() {
        let mut backend = VelloBackend::new();
        let mut canvas = canvas(&mut backend);
        let stream = vec![
            Primitive::Push,
            Primitive::Transform(TransformOp::Translate { tx: 5.0, ty: 5.0 }),
            style(StyleName::Fill, StyleArg::Color("red".into())),
            style(StyleName::Stroke, StyleArg::Color("#0000ff".into())),
            Primitive::Circle {
                cx: 0.0,
                cy: 0.0,
                r: 3.0,
            },
            Primitive::Polygon(vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(2.0, 3.0)]),
            Primitive::RoundRectangle {
                x: 0.0,
                y: 0.0,
                width: 8.0,
                height: 6.0,
                rx: 2.0,
                ry: 1.0,
            },
            Primitive::Pop,
        ];
        backend.render(&mut canvas, &stream).unwrap();
        assert!(!canvas.scene().encoding().is_empty());
    }

    #[test]
    fn test_unknown_fill_color() {
        let mut backend = VelloBackend::new();
        let mut canvas = canvas(&mut backend);
        let err = backend
            .render(&mut canvas, &[style(StyleName::Fill, StyleArg::Color("blurple".into()))])
            .unwrap_err();
        assert_eq!(err, BackendError::UnknownColor("blurple".into()));
    }

    #[test]
    fn test_unbalanced_streams_fail() {
        let mut backend = VelloBackend::new();
        let mut canvas = canvas(&mut backend);
        assert!(backend.render(&mut canvas, &[Primitive::Pop]).is_err());
        assert!(backend.render(&mut canvas, &[Primitive::Push]).is_err());
        assert!(backend.render(&mut canvas, &[Primitive::EndClipPath]).is_err());
    }

    #[test]
    fn test_undefined_resources() {
        let mut backend = VelloBackend::new();
        let mut canvas = canvas(&mut backend);
        let err = backend
            .render(&mut canvas, &[style(StyleName::ClipPath, StyleArg::Url("clip-x".into()))])
            .unwrap_err();
        assert_eq!(err, BackendError::UndefinedResource("clip-x".into()));

        let stream = [
            style(StyleName::Fill, StyleArg::Url("pattern-x".into())),
            Primitive::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 5.0,
                height: 5.0,
            },
        ];
        let err = backend.render(&mut canvas, &stream).unwrap_err();
        assert_eq!(err, BackendError::UndefinedResource("pattern-x".into()));
    }

    #[test]
    fn test_clip_content_is_not_drawn() {
        let mut backend = VelloBackend::new();
        let mut canvas = canvas(&mut backend);
        let stream = [
            Primitive::BeginClipPath { name: "clip-a".into() },
            Primitive::Push,
            Primitive::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 5.0,
                height: 5.0,
            },
            Primitive::Pop,
            Primitive::EndClipPath,
        ];
        backend.render(&mut canvas, &stream).unwrap();
        assert!(canvas.scene().encoding().is_empty());
    }

    #[test]
    fn test_viewport_clip_inside_clip_path_is_skipped() {
        let mut backend = VelloBackend::new();
        let mut scene = Scene::new();
        let mut frame = Frame::new(&mut backend, &mut scene);
        let stream = [
            Primitive::BeginClipPath { name: "clip-a".into() },
            Primitive::Push,
            Primitive::BeginClipPath {
                name: "viewport-b".into(),
            },
            Primitive::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            },
            Primitive::EndClipPath,
            style(StyleName::ClipPath, StyleArg::Url("viewport-b".into())),
            Primitive::Circle {
                cx: 5.0,
                cy: 5.0,
                r: 2.0,
            },
            Primitive::Pop,
            Primitive::EndClipPath,
        ];
        for primitive in &stream {
            frame.apply(primitive).unwrap();
        }
        let bounds = frame.clips["clip-a"].path.bounding_box();
        assert!(!frame.clips.contains_key("viewport-b"));
        assert!((bounds.x0 - 3.0).abs() < 1e-6 && (bounds.x1 - 7.0).abs() < 1e-6);
        assert!((bounds.y0 - 3.0).abs() < 1e-6 && (bounds.y1 - 7.0).abs() < 1e-6);
        frame.finish().unwrap();
    }

    #[test]
    fn test_clip_path_with_nested_rvg_renders() {
        let mut rvg = Rvg::new(40.0, 40.0).unwrap();
        let clip = rvg
            .clip_path("userSpaceOnUse", |c| {
                c.rvg(20.0, 20.0, 10.0, 10.0, |v| {
                    v.circle(8.0, 10.0, 10.0)?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        rvg.rect(40.0, 40.0, 0.0, 0.0)
            .unwrap()
            .styles([("fill", rvg_core::Value::from("red")), ("clip_path", (&clip).into())])
            .unwrap();

        let mut backend = VelloBackend::new();
        let canvas = rvg.draw(&mut backend).unwrap();
        assert!(!canvas.scene().encoding().is_empty());
    }

    #[test]
    fn test_tile_origins_cover_bounds() {
        let tile = Rect::new(0.0, 0.0, 10.0, 10.0);
        let origins = tile_origins(tile, Rect::new(5.0, 5.0, 25.0, 15.0), 100);
        assert_eq!(origins.len(), 6);
        assert_eq!(origins[0], Point::new(0.0, 0.0));
        assert_eq!(origins[5], Point::new(20.0, 10.0));
        assert_eq!(tile_origins(tile, Rect::new(0.0, 0.0, 1000.0, 1000.0), 7).len(), 7);
        assert!(tile_origins(Rect::ZERO, Rect::new(0.0, 0.0, 5.0, 5.0), 10).is_empty());
    }

    #[test]
    fn test_round_rect_clamps_radii() {
        let rect = Rect::new(0.0, 0.0, 10.0, 4.0);
        let bounds = round_rect_path(rect, 20.0, 20.0).bounding_box();
        assert!((bounds.width() - 10.0).abs() < 1e-6);
        assert!((bounds.height() - 4.0).abs() < 1e-6);
        assert_eq!(round_rect_path(rect, 0.0, 2.0).bounding_box(), rect);
    }

    #[test]
    fn test_scene_with_pattern_and_clip_renders() {
        let mut rvg = Rvg::new(50.0, 50.0).unwrap();
        let pattern = rvg
            .pattern(10.0, 10.0, 0.0, 0.0, |p| {
                p.circle(3.0, 5.0, 5.0)?.style("fill", "green")?;
                Ok(())
            })
            .unwrap();
        let clip = rvg
            .clip_path("userSpaceOnUse", |c| {
                c.circle(20.0, 25.0, 25.0)?;
                Ok(())
            })
            .unwrap();
        rvg.rect(50.0, 50.0, 0.0, 0.0)
            .unwrap()
            .styles([("fill", rvg_core::Value::from(&pattern)), ("clip_path", (&clip).into())])
            .unwrap();
        rvg.line(0.0, 0.0, 50.0, 50.0)
            .unwrap()
            .styles([("stroke", "black"), ("stroke_dasharray", "4 2")])
            .unwrap();
        let image = Arc::new(RasterImage::solid(2, 2, [255, 0, 0, 128]).unwrap());
        rvg.image(&image, Some(10.0), Some(10.0), 30.0, 30.0).unwrap();

        let mut backend = VelloBackend::new();
        let canvas = rvg.draw(&mut backend).unwrap();
        assert!(!canvas.scene().encoding().is_empty());
    }

    #[test]
    fn test_bad_color_in_scene_propagates() {
        let mut rvg = Rvg::new(10.0, 10.0).unwrap();
        rvg.circle(2.0, 5.0, 5.0).unwrap().style("fill", "blurple").unwrap();
        let err = rvg.draw(&mut VelloBackend::new()).unwrap_err();
        assert_eq!(err, RvgError::Backend(BackendError::UnknownColor("blurple".into())));
    }
}
