//! Geometric scene and render layers
//!
//! Layout produces a [`Scene`]: primitives, connectors and legend entries in
//! absolute canvas coordinates, plus the styling and warnings recorded while
//! building it. Drawing backends consume the scene and group their output by
//! [`RenderLayer`] so that z-order does not depend on emission order.
//! Legend labels are measured through [`TextMetrics`].
mod layer;
mod scene;
mod text;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use scene::{
    Connector, LayoutWarning, LegendEntry, Primitive, PrimitiveKind, ResolvedStyle, Scene,
    SceneBuilder,
};
pub use text::{ApproximateMetrics, FontMetrics, TextMetrics};
