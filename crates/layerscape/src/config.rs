//! Configuration types for Layerscape diagram rendering.
//!
//! This module provides configuration structures that control how diagrams
//! are sized, laid out and styled. All types implement [`serde::Deserialize`]
//! for loading from external sources, and every option has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`LayeredConfig`] - Options of the layered (box and funnel) view.
//! - [`SizingConfig`] - How tensor shapes map to box extents.
//! - [`GraphConfig`] - Options of the graph (per-neuron) view.
//! - [`StyleConfig`] - Background, palette and per-kind colors.
//!
//! # Example
//!
//! ```
//! # use layerscape::config::{AppConfig, SizingMode};
//! let config = AppConfig::default();
//! assert_eq!(config.layered().sizing().sizing_mode(), SizingMode::Accurate);
//! assert_eq!(config.graph().node_size(), 50.0);
//! ```

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;

use layerscape_core::color::{ColorSpec, ColorWheel, Rgba};

use crate::error::LayerscapeError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layered view section.
    #[serde(default)]
    layered: LayeredConfig,

    /// Graph view section.
    #[serde(default)]
    graph: GraphConfig,

    /// Style section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `layered` - Layered view settings.
    /// * `graph` - Graph view settings.
    /// * `style` - Visual styling options.
    pub fn new(layered: LayeredConfig, graph: GraphConfig, style: StyleConfig) -> Self {
        Self {
            layered,
            graph,
            style,
        }
    }

    pub fn layered(&self) -> &LayeredConfig {
        &self.layered
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

// =============================================================================
// Sizing
// =============================================================================

/// Policy mapping a tensor dimension to a pixel extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SizingMode {
    /// `dim * scale`, clamped
    #[default]
    Accurate,
    /// Linear growth that slows down for large dimensions
    Balanced,
    /// Like accurate, with per-category upper bounds
    Capped,
    /// `log10(dim) * scale * 20`, clamped
    Logarithmic,
    /// `dim * relative_base_size`, clamped
    Relative,
}

impl SizingMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Accurate => "accurate",
            Self::Balanced => "balanced",
            Self::Capped => "capped",
            Self::Logarithmic => "logarithmic",
            Self::Relative => "relative",
        }
    }
}

impl From<&str> for SizingMode {
    /// Parses a mode name; unknown names fall back to [`SizingMode::Accurate`]
    /// with a warning.
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "accurate" => Self::Accurate,
            "balanced" => Self::Balanced,
            "capped" => Self::Capped,
            "logarithmic" => Self::Logarithmic,
            "relative" => Self::Relative,
            _ => {
                warn!(sizing_mode = value; "Unknown sizing mode, falling back to accurate");
                Self::Accurate
            }
        }
    }
}

impl From<String> for SizingMode {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis receiving the only dimension of a one-dimensional shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OneDimAxis {
    X,
    Y,
    #[default]
    Z,
}

impl FromStr for OneDimAxis {
    type Err = LayerscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            other => Err(LayerscapeError::UnsupportedOrientation(other.to_string())),
        }
    }
}

impl TryFrom<String> for OneDimAxis {
    type Error = LayerscapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Upper bounds per dimension category, used by [`SizingMode::Capped`].
///
/// Unset categories fall back to the global maximum of the axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct DimensionCaps {
    #[serde(default)]
    channels: Option<f32>,
    #[serde(default)]
    sequence: Option<f32>,
    #[serde(default)]
    general: Option<f32>,
}

impl DimensionCaps {
    pub fn new(channels: Option<f32>, sequence: Option<f32>, general: Option<f32>) -> Self {
        Self {
            channels,
            sequence,
            general,
        }
    }

    /// Cap of the depth axis
    pub fn channels(&self) -> Option<f32> {
        self.channels
    }

    /// Cap of the spatial axes of two-dimensional shapes
    pub fn sequence(&self) -> Option<f32> {
        self.sequence
    }

    /// Cap of the spatial axes of every other shape
    pub fn general(&self) -> Option<f32> {
        self.general
    }
}

/// Parameters of the dimension scaler.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    scale_z: f32,
    scale_xy: f32,
    max_z: f32,
    max_xy: f32,
    min_z: f32,
    min_xy: f32,
    one_dim_orientation: OneDimAxis,
    sizing_mode: SizingMode,
    dimension_caps: DimensionCaps,
    relative_base_size: f32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            scale_z: 0.1,
            scale_xy: 4.0,
            max_z: 400.0,
            max_xy: 2000.0,
            min_z: 20.0,
            min_xy: 20.0,
            one_dim_orientation: OneDimAxis::Z,
            sizing_mode: SizingMode::Accurate,
            dimension_caps: DimensionCaps::default(),
            relative_base_size: 2.0,
        }
    }
}

impl SizingConfig {
    /// Sets the scale factors of the depth axis and the spatial axes.
    pub fn with_scale(mut self, scale_z: f32, scale_xy: f32) -> Self {
        self.scale_z = scale_z;
        self.scale_xy = scale_xy;
        self
    }

    /// Sets the lower bounds of the depth axis and the spatial axes.
    pub fn with_min(mut self, min_z: f32, min_xy: f32) -> Self {
        self.min_z = min_z;
        self.min_xy = min_xy;
        self
    }

    /// Sets the upper bounds of the depth axis and the spatial axes.
    pub fn with_max(mut self, max_z: f32, max_xy: f32) -> Self {
        self.max_z = max_z;
        self.max_xy = max_xy;
        self
    }

    pub fn with_one_dim_orientation(mut self, orientation: OneDimAxis) -> Self {
        self.one_dim_orientation = orientation;
        self
    }

    pub fn with_sizing_mode(mut self, mode: SizingMode) -> Self {
        self.sizing_mode = mode;
        self
    }

    pub fn with_dimension_caps(mut self, caps: DimensionCaps) -> Self {
        self.dimension_caps = caps;
        self
    }

    pub fn with_relative_base_size(mut self, base: f32) -> Self {
        self.relative_base_size = base;
        self
    }

    pub fn scale_z(&self) -> f32 {
        self.scale_z
    }

    pub fn scale_xy(&self) -> f32 {
        self.scale_xy
    }

    pub fn max_z(&self) -> f32 {
        self.max_z
    }

    pub fn max_xy(&self) -> f32 {
        self.max_xy
    }

    pub fn min_z(&self) -> f32 {
        self.min_z
    }

    pub fn min_xy(&self) -> f32 {
        self.min_xy
    }

    pub fn one_dim_orientation(&self) -> OneDimAxis {
        self.one_dim_orientation
    }

    pub fn sizing_mode(&self) -> SizingMode {
        self.sizing_mode
    }

    pub fn dimension_caps(&self) -> DimensionCaps {
        self.dimension_caps
    }

    pub fn relative_base_size(&self) -> f32 {
        self.relative_base_size
    }
}

// =============================================================================
// Layered view
// =============================================================================

/// Options of the layered view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayeredConfig {
    sizing: SizingConfig,
    /// Draw boxes as pseudo-3D blocks
    draw_volume: bool,
    /// Join consecutive boxes with funnel lines
    draw_funnel: bool,
    padding: f32,
    /// Horizontal gap between consecutive boxes
    spacing: f32,
    /// Fade step of the top face; the side face fades twice as much
    shade_step: u8,
    /// Layer kinds that are skipped entirely
    type_ignore: Vec<String>,
    /// Layer positions in container order that are skipped entirely
    index_ignore: Vec<usize>,
    legend: bool,
    /// Label legend entries per layer with their dimensions
    show_dimension: bool,
    font_size: f32,
    /// Vertical gap between the diagram and the legend row
    legend_spacing: f32,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            sizing: SizingConfig::default(),
            draw_volume: true,
            draw_funnel: true,
            padding: 10.0,
            spacing: 10.0,
            shade_step: 10,
            type_ignore: Vec::new(),
            index_ignore: Vec::new(),
            legend: false,
            show_dimension: false,
            font_size: 12.0,
            legend_spacing: 10.0,
        }
    }
}

impl LayeredConfig {
    pub fn with_sizing(mut self, sizing: SizingConfig) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_draw_volume(mut self, draw_volume: bool) -> Self {
        self.draw_volume = draw_volume;
        self
    }

    pub fn with_draw_funnel(mut self, draw_funnel: bool) -> Self {
        self.draw_funnel = draw_funnel;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_shade_step(mut self, shade_step: u8) -> Self {
        self.shade_step = shade_step;
        self
    }

    pub fn with_type_ignore(mut self, kinds: Vec<String>) -> Self {
        self.type_ignore = kinds;
        self
    }

    pub fn with_index_ignore(mut self, indices: Vec<usize>) -> Self {
        self.index_ignore = indices;
        self
    }

    /// Enables the legend, optionally with one entry per layer.
    pub fn with_legend(mut self, legend: bool, show_dimension: bool) -> Self {
        self.legend = legend;
        self.show_dimension = show_dimension;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn sizing(&self) -> &SizingConfig {
        &self.sizing
    }

    pub fn draw_volume(&self) -> bool {
        self.draw_volume
    }

    pub fn draw_funnel(&self) -> bool {
        self.draw_funnel
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn shade_step(&self) -> u8 {
        self.shade_step
    }

    pub fn type_ignore(&self) -> &[String] {
        &self.type_ignore
    }

    pub fn index_ignore(&self) -> &[usize] {
        &self.index_ignore
    }

    pub fn legend(&self) -> bool {
        self.legend
    }

    pub fn show_dimension(&self) -> bool {
        self.show_dimension
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn legend_spacing(&self) -> f32 {
        self.legend_spacing
    }
}

// =============================================================================
// Graph view
// =============================================================================

/// Options of the graph view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Side of a neuron and width of a layer box
    node_size: f32,
    padding: f32,
    /// Horizontal gap between columns
    layer_spacing: f32,
    /// Vertical gap between neurons
    node_spacing: f32,
    connector_color: ColorSpec,
    connector_width: f32,
    /// Maximum number of neurons drawn per layer
    ellipsize_after: usize,
    /// Draw one circle per unit instead of a single box
    show_neurons: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_size: 50.0,
            padding: 10.0,
            layer_spacing: 250.0,
            node_spacing: 10.0,
            connector_color: ColorSpec::Css("gray".to_string()),
            connector_width: 1.0,
            ellipsize_after: 10,
            show_neurons: true,
        }
    }
}

impl GraphConfig {
    pub fn with_node_size(mut self, node_size: f32) -> Self {
        self.node_size = node_size;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_layer_spacing(mut self, layer_spacing: f32) -> Self {
        self.layer_spacing = layer_spacing;
        self
    }

    pub fn with_node_spacing(mut self, node_spacing: f32) -> Self {
        self.node_spacing = node_spacing;
        self
    }

    pub fn with_ellipsize_after(mut self, ellipsize_after: usize) -> Self {
        self.ellipsize_after = ellipsize_after;
        self
    }

    pub fn with_show_neurons(mut self, show_neurons: bool) -> Self {
        self.show_neurons = show_neurons;
        self
    }

    pub fn node_size(&self) -> f32 {
        self.node_size
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn layer_spacing(&self) -> f32 {
        self.layer_spacing
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// Returns the parsed connector color.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid color.
    pub fn connector_color(&self) -> Result<Rgba, LayerscapeError> {
        Ok(self.connector_color.to_rgba()?)
    }

    pub fn connector_width(&self) -> f32 {
        self.connector_width
    }

    pub fn ellipsize_after(&self) -> usize {
        self.ellipsize_after
    }

    pub fn show_neurons(&self) -> bool {
        self.show_neurons
    }
}

// =============================================================================
// Style
// =============================================================================

/// Colors configured for one layer kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KindStyle {
    #[serde(default)]
    fill: Option<ColorSpec>,
    #[serde(default)]
    outline: Option<ColorSpec>,
}

impl KindStyle {
    pub fn new(fill: Option<ColorSpec>, outline: Option<ColorSpec>) -> Self {
        Self { fill, outline }
    }

    /// Returns the parsed fill color, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid color.
    pub fn fill(&self) -> Result<Option<Rgba>, LayerscapeError> {
        Ok(self.fill.as_ref().map(ColorSpec::to_rgba).transpose()?)
    }

    /// Returns the parsed outline color, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid color.
    pub fn outline(&self) -> Result<Option<Rgba>, LayerscapeError> {
        Ok(self.outline.as_ref().map(ColorSpec::to_rgba).transpose()?)
    }
}

/// Visual styling configuration.
///
/// ```toml
/// [style]
/// background = "white"
/// palette = ["#ffd166", "#ef476f"]
///
/// [style.color_map.Conv2D]
/// fill = "#118ab2"
/// outline = [0, 0, 0]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    background: Option<ColorSpec>,

    /// Colors cycled by the color wheel, in order
    #[serde(default)]
    palette: Option<Vec<ColorSpec>>,

    /// Explicit colors per layer kind
    #[serde(default)]
    color_map: IndexMap<String, KindStyle>,
}

impl StyleConfig {
    pub fn with_background(mut self, background: ColorSpec) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_palette(mut self, palette: Vec<ColorSpec>) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn with_kind_style(mut self, kind: impl Into<String>, style: KindStyle) -> Self {
        self.color_map.insert(kind.into(), style);
        self
    }

    /// Returns the parsed background color, white when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid color.
    pub fn background_color(&self) -> Result<Rgba, LayerscapeError> {
        match &self.background {
            Some(spec) => Ok(spec.to_rgba()?),
            None => Ok(Rgba::WHITE),
        }
    }

    /// Creates a fresh color wheel over the configured palette.
    ///
    /// # Errors
    ///
    /// Returns an error if a palette entry is not a valid color or the
    /// palette is empty.
    pub fn color_wheel(&self) -> Result<ColorWheel, LayerscapeError> {
        let Some(palette) = &self.palette else {
            return Ok(ColorWheel::default());
        };
        let colors = palette
            .iter()
            .map(ColorSpec::to_rgba)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ColorWheel::with_palette(colors)?)
    }

    /// Returns the colors configured for `kind`
    pub fn kind_style(&self, kind: &str) -> Option<&KindStyle> {
        self.color_map.get(kind)
    }

    pub fn color_map(&self) -> &IndexMap<String, KindStyle> {
        &self.color_map
    }
}
