//! A backend that records primitive streams.
//!
//! Metrics come from a fixed-advance model so layouts are reproducible
//! without fonts.

use crate::backend::{Backend, CanvasSpec, FontSpec, GlyphMetrics, GlyphMetricsSource};
use crate::emit::Primitive;
use crate::error::BackendResult;
use kurbo::Affine;
use serde::{Deserialize, Serialize};

/// Per-character advances in ems. Sizes scale with the font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedMetrics {
    pub advance: f64,
    pub narrow_advance: f64,
    pub wide_advance: f64,
    pub capital_advance: f64,
    pub space_advance: f64,
    pub ascent: f64,
    /// Negative below the baseline.
    pub descent: f64,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            narrow_advance: 0.3,
            wide_advance: 0.9,
            capital_advance: 0.7,
            space_advance: 0.25,
            ascent: 0.8,
            descent: -0.2,
        }
    }
}

impl FixedMetrics {
    fn char_advance(&self, ch: char) -> f64 {
        match ch {
            ' ' => self.space_advance,
            'i' | 'l' | 'j' | '.' | ',' | '\'' | '!' => self.narrow_advance,
            'm' | 'w' | 'M' | 'W' => self.wide_advance,
            c if c.is_uppercase() => self.capital_advance,
            _ => self.advance,
        }
    }

    pub fn measure(&self, probe: &str, font: &FontSpec) -> GlyphMetrics {
        let ems: f64 = probe.chars().map(|c| self.char_advance(c)).sum();
        GlyphMetrics {
            width: ems * font.size,
            ascent: self.ascent * font.size,
            descent: self.descent * font.size,
        }
    }
}

/// One metrics query as the emitter issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsQuery {
    pub probe: String,
    pub font: FontSpec,
    pub affine: Affine,
}

/// The canvas of a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub spec: CanvasSpec,
    pub primitives: Vec<Primitive>,
    /// Number of `render` calls onto this canvas.
    pub renders: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    metrics: FixedMetrics,
    queries: Vec<MetricsQuery>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: FixedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &FixedMetrics {
        &self.metrics
    }

    /// Every metrics query so far, in order.
    pub fn queries(&self) -> &[MetricsQuery] {
        &self.queries
    }
}

impl GlyphMetricsSource for RecordingBackend {
    fn glyph_metrics(&mut self, probe: &str, font: &FontSpec, affine: Affine) -> BackendResult<GlyphMetrics> {
        self.queries.push(MetricsQuery {
            probe: probe.to_string(),
            font: font.clone(),
            affine,
        });
        Ok(self.metrics.measure(probe, font))
    }
}

impl Backend for RecordingBackend {
    type Canvas = Recording;

    fn create_canvas(&mut self, spec: &CanvasSpec) -> BackendResult<Recording> {
        log::debug!("recording canvas {}x{}", spec.width, spec.height);
        Ok(Recording {
            spec: spec.clone(),
            primitives: Vec::new(),
            renders: 0,
        })
    }

    fn render(&mut self, canvas: &mut Recording, primitives: &[Primitive]) -> BackendResult<()> {
        canvas.primitives.extend_from_slice(primitives);
        canvas.renders += 1;
        Ok(())
    }
}
