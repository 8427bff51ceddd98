//! Layerscape - architecture diagrams for neural-network models
//!
//! This library lays out diagrams of a model's layer structure and renders
//! them to SVG. It supports two views:
//!
//! - the **layered view**, one pseudo-3D box per layer sized by the layer's
//!   output shape and joined to its neighbours by funnels;
//! - the **graph view**, one column per topological level with a node per
//!   neuron and connectors along every dependency.
//!
//! Models are read through the
//! [`ModelIntrospection`](layerscape_core::model::ModelIntrospection) trait.
//! [`description::ModelDescription`] implements it for JSON model files.

pub mod config;
pub mod description;
mod error;
pub mod export;
pub mod layout;
pub mod shape;
pub mod structure;

#[cfg(test)]
mod testing;

pub use layerscape_core::{color, draw, geometry, model};

pub use error::LayerscapeError;

use log::{debug, info};

use color::ColorWheel;
use config::AppConfig;
use draw::Scene;
use layout::{GraphEngine, LayeredEngine};
use model::ModelIntrospection;

/// Builder for laying out and rendering model diagrams.
///
/// # Examples
///
/// ```
/// use layerscape::{DiagramBuilder, config::AppConfig, description::ModelDescription};
///
/// let json = r#"{
///     "name": "mlp",
///     "layers": [
///         {"name": "in", "kind": "InputLayer", "batch_shape": [null, 4], "units": 4},
///         {"name": "out", "kind": "Dense", "output_shape": [null, 2], "units": 2,
///          "inbound_nodes": [{"inbound_layers": "in"}]}
///     ]
/// }"#;
/// let mut model = ModelDescription::from_json(json).unwrap();
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let mut wheel = builder.color_wheel().unwrap();
///
/// let layered = builder.layered_view(&model, &mut wheel).unwrap();
/// let graph = builder.graph_view(&mut model).unwrap();
///
/// let svg = builder.render_svg(&layered).unwrap();
/// assert!(svg.starts_with("<svg"));
/// assert_eq!(graph.primitives().len(), 4 + 2 + 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including view and style settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Creates a color wheel over the configured palette.
    ///
    /// Reuse one wheel across several layered views to keep kind colors
    /// consistent between them.
    ///
    /// # Errors
    ///
    /// Returns [`LayerscapeError::Color`] for an invalid or empty palette.
    pub fn color_wheel(&self) -> Result<ColorWheel, LayerscapeError> {
        self.config.style().color_wheel()
    }

    /// Lay out the layered view of `model`.
    ///
    /// # Arguments
    ///
    /// * `model` - The model to draw
    /// * `wheel` - Color wheel assigning fills to kinds without a mapped color
    ///
    /// # Errors
    ///
    /// Returns `LayerscapeError` for unreadable model bookkeeping, unsupported
    /// shapes or invalid colors.
    pub fn layered_view<M>(&self, model: &M, wheel: &mut ColorWheel) -> Result<Scene, LayerscapeError>
    where
        M: ModelIntrospection + ?Sized,
    {
        info!("Laying out layered view");
        let scene = LayeredEngine::new(self.config.layered(), self.config.style()).layout(model, wheel)?;
        debug!(warnings = scene.warnings().len(); "Layered view ready");
        Ok(scene)
    }

    /// Lay out the graph view of `model`.
    ///
    /// The model's build hook runs before its connections are read.
    ///
    /// # Errors
    ///
    /// Returns `LayerscapeError` for unreadable model bookkeeping or invalid
    /// colors.
    pub fn graph_view<M>(&self, model: &mut M) -> Result<Scene, LayerscapeError>
    where
        M: ModelIntrospection + ?Sized,
    {
        info!("Laying out graph view");
        let scene = GraphEngine::new(self.config.graph(), self.config.style()).layout(model)?;
        debug!(warnings = scene.warnings().len(); "Graph view ready");
        Ok(scene)
    }

    /// Render a laid-out scene to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns `LayerscapeError` for an invalid background color or a
    /// rendering failure.
    pub fn render_svg(&self, scene: &Scene) -> Result<String, LayerscapeError> {
        let background = self.config.style().background_color()?;
        let svg = export::svg::render_to_string(scene, background)?;
        info!(bytes = svg.len(); "SVG rendered successfully");
        Ok(svg)
    }
}
