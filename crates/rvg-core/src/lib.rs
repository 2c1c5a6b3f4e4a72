//! RVG Core Library
//!
//! A declarative vector scene graph: build a tree of containers, shapes,
//! text and references with inherited transforms and styles, then compile
//! it into a scoped primitive stream for a raster [`Backend`].

pub mod backend;
pub mod config;
pub mod duplicate;
pub mod emit;
pub mod error;
pub mod node;
pub mod recording;
pub mod scene;
pub mod style;
pub mod text;
pub mod transform;
pub mod units;
pub mod viewport;

pub use backend::{
    Backdrop, Backend, BackgroundPosition, CanvasFill, CanvasSpec, FontSpec, GlyphMetrics, GlyphMetricsSource,
};
pub use config::RvgConfig;
pub use duplicate::{CopyContext, DeepCopy};
pub use emit::{DrawList, EmitContext, Primitive};
pub use error::{BackendError, BackendResult, Result, RvgError};
pub use node::{
    Build, ClipPath, ClipPathRef, ClipUnits, Describable, Description, Group, HasCore, ImagePlacement, Node, NodeCore,
    NodeId, NodeKind, Pattern, PatternRef, RasterImage, Shape, Stylable, TextRun, Transformable, Tref, Tspan, Use,
    Viewport,
};
pub use recording::{FixedMetrics, Recording, RecordingBackend};
pub use scene::Rvg;
pub use style::{BaselineShift, Paint, StyleArg, StyleName, StyleTable, StyleValue, TextAnchor, Value, WritingMode};
pub use text::{Strategy, TextState};
pub use transform::{TransformList, TransformOp};
pub use units::{dpi, set_dpi, Angle, AngleUnit, Length, LengthUnit};
pub use viewport::{Align, AxisAlign, MeetOrSlice, PreserveAspectRatio, ViewBox, ViewportSettings, ViewportTransform};

/// Traits needed to build scenes.
pub mod prelude {
    pub use crate::duplicate::DeepCopy;
    pub use crate::node::{Build, Describable, HasCore, Stylable, Transformable};
}
