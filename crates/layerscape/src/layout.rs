//! Scene layout for the two diagram views.
//!
//! [`LayeredEngine`] draws one pseudo-3D box per layer along the drawing
//! direction. [`GraphEngine`] draws the dependency graph as columns of
//! neurons. Both produce a [`Scene`](layerscape_core::draw::Scene) in canvas
//! coordinates, ready for an exporter.

mod graph;
mod layered;
mod legend;
mod sizing;
mod style;

pub use graph::{GraphEngine, OUTPUT_KIND};
pub use layered::LayeredEngine;
pub use layerscape_core::draw::{ApproximateMetrics, FontMetrics, TextMetrics};
pub use sizing::{BoxDimensions, DimensionScaler};
