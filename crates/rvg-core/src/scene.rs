//! The scene root.

use crate::backend::{Backdrop, Backend, BackgroundPosition, CanvasFill, CanvasSpec, GlyphMetricsSource};
use crate::emit::{DrawList, EmitContext};
use crate::error::{Result, RvgError};
use crate::node::{Build, HasCore, Node, NodeCore, RasterImage, Viewport};
use crate::units::{finite, Length};
use std::sync::Arc;

/// Background options of the root canvas, in priority order.
#[derive(Debug, Clone, Default, PartialEq)]
struct Background {
    texture: Option<Arc<RasterImage>>,
    image: Option<(Arc<RasterImage>, BackgroundPosition)>,
    color: Option<String>,
    opacity: f64,
}

/// A scene: the outermost viewport plus canvas options.
///
/// ```ignore
/// let mut rvg = Rvg::new(200.0, 100.0)?;
/// rvg.viewbox(0.0, 0.0, 400.0, 200.0)?;
/// rvg.circle(50.0, 100.0, 100.0)?.styles([("fill", "red")])?;
/// let canvas = rvg.draw(&mut backend)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rvg {
    core: NodeCore,
    viewport: Viewport,
    background: Background,
}

impl HasCore for Rvg {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind_name(&self) -> &'static str {
        "rvg"
    }
}

impl Build for Rvg {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        self.viewport.children_vec()
    }

    fn child_nodes(&self) -> &[Node] {
        self.viewport.child_nodes()
    }
}

impl Rvg {
    /// A scene of the given size. Physical units need the DPI to be set.
    pub fn new(width: impl Into<Length>, height: impl Into<Length>) -> Result<Self> {
        let width = width.into().to_px()?;
        let height = height.into().to_px()?;
        Ok(Self {
            core: NodeCore::new(),
            viewport: Viewport::new(width, height, 0.0, 0.0)?,
            background: Background {
                opacity: 1.0,
                ..Background::default()
            },
        })
    }

    pub fn width(&self) -> f64 {
        self.viewport.width()
    }

    pub fn height(&self) -> f64 {
        self.viewport.height()
    }

    pub fn viewbox(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<&mut Self> {
        self.mutable_core()?;
        self.viewport.viewbox(x, y, width, height)?;
        Ok(self)
    }

    pub fn preserve_aspect_ratio(&mut self, align: &str, meet_or_slice: &str) -> Result<&mut Self> {
        self.mutable_core()?;
        self.viewport.preserve_aspect_ratio(align, meet_or_slice)?;
        Ok(self)
    }

    /// Fill the canvas with a tiled texture.
    pub fn with_background_texture(mut self, texture: Arc<RasterImage>) -> Self {
        self.background.texture = Some(texture);
        self
    }

    /// Fill the canvas with an image placed according to `position`.
    pub fn with_background_image(mut self, image: Arc<RasterImage>, position: BackgroundPosition) -> Self {
        self.background.image = Some((image, position));
        self
    }

    /// Fill the canvas with a colour; also the backdrop of a fitted image.
    pub fn with_background(mut self, color: impl Into<String>, opacity: f64) -> Result<Self> {
        let opacity = finite("background opacity", opacity)?;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(RvgError::validation(format!(
                "background opacity must be in 0.0..=1.0 ({opacity} given)"
            )));
        }
        self.background.color = Some(color.into());
        self.background.opacity = opacity;
        Ok(self)
    }

    fn canvas_fill(&self) -> CanvasFill {
        let backdrop = self.background.color.as_ref().map(|color| Backdrop {
            color: color.clone(),
            opacity: self.background.opacity,
        });
        if let Some(texture) = &self.background.texture {
            return CanvasFill::Texture(Arc::clone(texture));
        }
        if let Some((image, position)) = &self.background.image {
            return CanvasFill::Image {
                image: Arc::clone(image),
                position: *position,
                backdrop,
            };
        }
        match backdrop {
            Some(backdrop) => CanvasFill::Color(backdrop),
            None => CanvasFill::Transparent,
        }
    }

    /// The canvas a backend should create for this scene.
    pub fn canvas_spec(&self) -> Result<CanvasSpec> {
        let (width, height) = (self.width(), self.height());
        if width < 1.0 || height < 1.0 {
            return Err(RvgError::validation(format!(
                "draw requires non-zero width and height ({width}x{height} given)"
            )));
        }
        Ok(CanvasSpec {
            width: width as u32,
            height: height as u32,
            fill: self.canvas_fill(),
            description: self.core.description().clone(),
        })
    }

    /// Traverse the scene into a primitive stream.
    pub fn compile(&self, metrics: &mut dyn GlyphMetricsSource) -> Result<DrawList> {
        let mut ctx = EmitContext::new(metrics);
        let id = self.core.id();
        ctx.scoped(&self.core, |ctx| self.viewport.emit_content(ctx, id))?;
        let list = ctx.finish();
        log::debug!("compiled scene {} into {} primitives", id, list.len());
        Ok(list)
    }

    /// Create a canvas and draw the scene onto it.
    pub fn draw<B: Backend>(&self, backend: &mut B) -> Result<B::Canvas> {
        let spec = self.canvas_spec()?;
        log::debug!("drawing {}x{} canvas", spec.width, spec.height);
        let mut canvas = backend.create_canvas(&spec)?;
        self.draw_onto(backend, &mut canvas)?;
        Ok(canvas)
    }

    /// Draw the scene onto an existing canvas.
    pub fn draw_onto<B: Backend>(&self, backend: &mut B, canvas: &mut B::Canvas) -> Result<()> {
        self.canvas_spec()?;
        let list = self.compile(backend)?;
        backend.render(canvas, list.primitives())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::Primitive;
    use crate::node::{Describable, NodeKind, Stylable, Transformable};
    use crate::recording::RecordingBackend;
    use crate::style::{StyleArg, StyleName};
    use crate::transform::TransformOp;
    use kurbo::Affine;

    fn kinds(list: &DrawList) -> Vec<&'static str> {
        list.iter()
            .map(|p| match p {
                Primitive::Push => "push",
                Primitive::Pop => "pop",
                Primitive::Transform(_) => "transform",
                Primitive::Style { .. } => "style",
                Primitive::Circle { .. } => "circle",
                Primitive::Rectangle { .. } => "rect",
                Primitive::Text { .. } => "text",
                Primitive::Image { .. } => "image",
                Primitive::BeginClipPath { .. } => "begin_clip",
                Primitive::EndClipPath => "end_clip",
                Primitive::ClipUnits(_) => "clip_units",
                Primitive::BeginPattern { .. } => "begin_pattern",
                Primitive::EndPattern => "end_pattern",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn test_node_emission_order() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        rvg.circle(10.0, 50.0, 50.0)
            .unwrap()
            .translate(5.0, 5.0)
            .unwrap()
            .rotate(30.0)
            .unwrap()
            .styles([("stroke", "blue"), ("fill", "red")])
            .unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        assert_eq!(
            kinds(&list),
            vec![
                "push",
                "begin_clip",
                "rect",
                "end_clip",
                "style",
                "push",
                "transform",
                "transform",
                "style",
                "style",
                "circle",
                "pop",
                "pop"
            ]
        );
        // Canonical order, not call order.
        let styles: Vec<_> = list
            .iter()
            .filter_map(|p| match p {
                Primitive::Style { name, .. } if *name != StyleName::ClipPath => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(styles, vec![StyleName::Fill, StyleName::Stroke]);
    }

    #[test]
    fn test_every_scope_balanced() {
        let mut rvg = Rvg::new(200.0, 200.0).unwrap();
        let group = rvg
            .g(|g| {
                g.rect(10.0, 10.0, 0.0, 0.0)?;
                g.g(|_| Ok(()))?;
                g.text(0.0, 20.0, "")?;
                g.circle(0.0, 0.0, 0.0)?;
                Ok(())
            })
            .unwrap()
            .clone();
        rvg.use_node(&group, 50.0, 50.0, None, None).unwrap();
        rvg.rvg(0.0, 0.0, 0.0, 0.0, |_| Ok(())).unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        assert!(list.is_balanced());
        // Root, group, rect, empty group, empty text, zero circle, use,
        // its copy and the copy's four children, nested rvg.
        assert_eq!(list.count(|p| *p == Primitive::Push), 13);
    }

    #[test]
    fn test_viewbox_emission_order() {
        let mut rvg = Rvg::new(50.0, 200.0).unwrap();
        rvg.viewbox(0.0, 0.0, 100.0, 100.0).unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        let transforms: Vec<_> = list
            .iter()
            .filter_map(|p| match p {
                Primitive::Transform(op) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            transforms,
            vec![
                TransformOp::Translate { tx: 0.0, ty: 75.0 },
                TransformOp::Scale { sx: 0.5, sy: 0.5 }
            ]
        );
        assert_eq!(
            list.primitives()[2],
            Primitive::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 50.0,
                height: 200.0
            }
        );
    }

    #[test]
    fn test_use_copy_unaffected_by_later_mutation() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        let group_id = rvg
            .g(|g| {
                g.circle(5.0, 5.0, 5.0)?;
                Ok(())
            })
            .unwrap()
            .id();
        rvg.use_id(group_id, 20.0, 0.0, None, None).unwrap();
        let before = rvg.compile(&mut RecordingBackend::new()).unwrap();

        let group = rvg.find_mut(group_id).unwrap();
        group.group_mut().unwrap().rect(3.0, 3.0, 0.0, 0.0).unwrap();
        let after = rvg.compile(&mut RecordingBackend::new()).unwrap();

        // Only the original group gained a rect.
        let rects = |l: &DrawList| l.count(|p| matches!(p, Primitive::Rectangle { width, .. } if *width == 3.0));
        assert_eq!(rects(&before), 0);
        assert_eq!(rects(&after), 1);
        let circles = |l: &DrawList| l.count(|p| matches!(p, Primitive::Circle { .. }));
        assert_eq!(circles(&after), 2);
    }

    #[test]
    fn test_pattern_defined_before_reference() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        let pattern = rvg
            .pattern(10.0, 10.0, 0.0, 0.0, |p| {
                p.circle(5.0, 5.0, 5.0)?;
                Ok(())
            })
            .unwrap();
        rvg.rect(100.0, 100.0, 0.0, 0.0)
            .unwrap()
            .style("fill", &pattern)
            .unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        let kinds = kinds(&list);
        let begin = kinds.iter().position(|k| *k == "begin_pattern").unwrap();
        let end = kinds.iter().position(|k| *k == "end_pattern").unwrap();
        assert!(begin < end);
        assert_eq!(
            list.primitives()[end + 1],
            Primitive::Style {
                name: StyleName::Fill,
                arg: StyleArg::Url(pattern.name())
            }
        );
        assert!(list.is_balanced());
    }

    #[test]
    fn test_clip_path_definition() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        let clip = rvg
            .clip_path("objectBoundingBox", |c| {
                c.circle(0.5, 0.5, 0.5)?;
                Ok(())
            })
            .unwrap();
        rvg.rect(100.0, 100.0, 0.0, 0.0)
            .unwrap()
            .style("clip_path", &clip)
            .unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        let named = list.count(|p| *p == Primitive::BeginClipPath { name: clip.name() });
        assert_eq!(named, 1);
        assert!(list.iter().any(|p| *p
            == Primitive::Style {
                name: StyleName::ClipPath,
                arg: StyleArg::Url(clip.name())
            }));
    }

    #[test]
    fn test_text_metrics_see_ancestor_transforms() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        rvg.g(|g| {
            g.text(0.0, 0.0, "a")?;
            Ok(())
        })
        .unwrap()
        .translate(10.0, 0.0)
        .unwrap();
        let mut backend = RecordingBackend::new();
        rvg.compile(&mut backend).unwrap();
        assert_eq!(backend.queries()[0].affine, Affine::translate((10.0, 0.0)));
    }

    #[test]
    fn test_spans_continue_pen() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        rvg.text(10.0, 20.0, "ab").unwrap().tspan("c").unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        let texts: Vec<_> = list
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { x, y, text } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], (10.0, 20.0, "ab".to_string()));
        assert!((texts[1].0 - 24.4).abs() < 1e-9);
        assert_eq!(texts[1].2, "c");
    }

    #[test]
    fn test_draw_requires_size() {
        let rvg = Rvg::new(0.0, 100.0).unwrap();
        let err = rvg.draw(&mut RecordingBackend::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(rvg.compile(&mut RecordingBackend::new()).is_ok());
    }

    #[test]
    fn test_draw_repeatedly() {
        let mut rvg = Rvg::new(10.0, 10.0).unwrap();
        rvg.circle(1.0, 5.0, 5.0).unwrap();
        let mut backend = RecordingBackend::new();
        let mut canvas = rvg.draw(&mut backend).unwrap();
        let first = canvas.primitives.len();
        rvg.draw_onto(&mut backend, &mut canvas).unwrap();
        assert_eq!(canvas.renders, 2);
        assert_eq!(canvas.primitives.len(), first * 2);
    }

    #[test]
    fn test_canvas_fill_priority() {
        let texture = Arc::new(RasterImage::solid(2, 2, [0, 0, 0, 255]).unwrap());
        let rvg = Rvg::new(10.0, 10.0)
            .unwrap()
            .with_background("white", 0.5)
            .unwrap();
        assert!(matches!(rvg.canvas_spec().unwrap().fill, CanvasFill::Color(ref b) if b.opacity == 0.5));

        let rvg = rvg.with_background_image(Arc::clone(&texture), BackgroundPosition::Fit);
        assert!(matches!(
            rvg.canvas_spec().unwrap().fill,
            CanvasFill::Image { backdrop: Some(_), .. }
        ));

        let rvg = rvg.with_background_texture(texture);
        assert!(matches!(rvg.canvas_spec().unwrap().fill, CanvasFill::Texture(_)));

        let plain = Rvg::new(10.0, 10.0).unwrap();
        assert_eq!(plain.canvas_spec().unwrap().fill, CanvasFill::Transparent);
        assert!(Rvg::new(1.0, 1.0).unwrap().with_background("red", 2.0).is_err());
    }

    #[test]
    fn test_nested_rvg_translates_then_clips() {
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        rvg.rvg(40.0, 20.0, 5.0, 6.0, |inner| {
            inner.viewbox(0.0, 0.0, 80.0, 40.0)?;
            inner.rect(80.0, 40.0, 0.0, 0.0)?;
            Ok(())
        })
        .unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();
        let nested = &list.primitives()[5..];
        assert_eq!(nested[0], Primitive::Push);
        assert_eq!(nested[1], Primitive::Transform(TransformOp::Translate { tx: 5.0, ty: 6.0 }));
        assert!(matches!(nested[2], Primitive::BeginClipPath { .. }));
        assert_eq!(nested[6], Primitive::Transform(TransformOp::Scale { sx: 0.5, sy: 0.5 }));
    }

    #[test]
    fn test_image_viewport_pass() {
        let image = Arc::new(RasterImage::solid(10, 20, [1, 2, 3, 255]).unwrap());
        let mut rvg = Rvg::new(100.0, 100.0).unwrap();
        rvg.image(&image, Some(40.0), Some(40.0), 10.0, 0.0).unwrap();
        rvg.image(&image, Some(0.0), Some(40.0), 0.0, 0.0).unwrap();
        let node = rvg.image(&image, Some(30.0), Some(30.0), 0.0, 0.0).unwrap();
        node.preserve_aspect_ratio("none", "meet").unwrap();
        let list = rvg.compile(&mut RecordingBackend::new()).unwrap();

        let images: Vec<_> = list
            .iter()
            .filter_map(|p| match p {
                Primitive::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect();
        // Viewport pass draws at the image's own size; align none composites
        // directly; the zero-sized one draws nothing.
        assert_eq!(images, vec![(0.0, 0.0, 10.0, 20.0), (0.0, 0.0, 30.0, 30.0)]);
        assert!(list.iter().any(|p| *p == Primitive::Transform(TransformOp::Scale { sx: 2.0, sy: 2.0 })));
        assert!(list.is_balanced());
    }

    #[test]
    fn test_title_reaches_canvas_and_freeze_sticks() {
        let mut rvg = Rvg::new(10.0, 10.0).unwrap();
        rvg.title("scene").unwrap();
        assert_eq!(rvg.canvas_spec().unwrap().description.title.as_deref(), Some("scene"));
        let node = rvg.circle(1.0, 1.0, 1.0).unwrap();
        node.freeze();
        assert!(matches!(node.kind(), NodeKind::Shape(_)));
        assert!(node.translate(1.0, 1.0).is_err());
    }
}
