//! Error types for Layerscape operations.
//!
//! This module provides the main error type [`LayerscapeError`] which wraps
//! the fatal conditions that can occur while laying out or exporting a
//! diagram. Recoverable conditions are reported as
//! [`LayoutWarning`](crate::draw::LayoutWarning) values instead.

use std::io;

use thiserror::Error;

use layerscape_core::color::ColorError;

/// The main error type for Layerscape operations.
///
/// Any of these aborts the whole render; no partial scene is returned.
#[derive(Debug, Error)]
pub enum LayerscapeError {
    #[error("unsupported shape for layer `{layer}`: {value}")]
    UnsupportedShape { layer: String, value: String },

    #[error("unsupported one-dimensional orientation `{0}`, expected one of `x`, `y` or `z`")]
    UnsupportedOrientation(String),

    #[error("model exposes neither a tracked-layers nor a layers collection")]
    MissingLayerContainer,

    #[error("layer `{layer}` reports no output shape, output tensor shape or batch shape")]
    MissingShape { layer: String },

    #[error("inbound node of layer `{layer}` has neither `inbound_layers` nor parent nodes")]
    UnrecognizedInboundFormat { layer: String },

    #[error("layer `{layer}` references unknown layer `{reference}`")]
    UnknownLayerReference { layer: String, reference: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Color error: {0}")]
    Color(#[from] ColorError),

    #[error("Model description error: {0}")]
    ModelFormat(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LayerscapeError {
    /// Create an `UnsupportedShape` error for `layer` describing `value`.
    pub fn unsupported_shape(layer: impl Into<String>, value: impl ToString) -> Self {
        Self::UnsupportedShape {
            layer: layer.into(),
            value: value.to_string(),
        }
    }
}
