//! Error adapter for converting LayerscapeError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use layerscape::LayerscapeError;

/// Adapter giving a [`LayerscapeError`] a diagnostic code and, where one
/// applies, a hint.
pub struct ErrorAdapter(pub LayerscapeError);

impl fmt::Debug for ErrorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            LayerscapeError::UnsupportedShape { .. }
            | LayerscapeError::MissingShape { .. } => "layerscape::shape",
            LayerscapeError::UnsupportedOrientation(_) | LayerscapeError::Config(_) => {
                "layerscape::config"
            }
            LayerscapeError::MissingLayerContainer
            | LayerscapeError::UnrecognizedInboundFormat { .. }
            | LayerscapeError::UnknownLayerReference { .. }
            | LayerscapeError::ModelFormat(_) => "layerscape::model",
            LayerscapeError::Color(_) => "layerscape::color",
            LayerscapeError::Export(_) => "layerscape::export",
            LayerscapeError::Io(_) => "layerscape::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            LayerscapeError::UnsupportedShape { .. } => {
                "output shapes must be a list of dimensions, a list of such lists, or null"
            }
            LayerscapeError::MissingShape { .. } => {
                "add `output_shape` or `batch_shape` to the layer description"
            }
            LayerscapeError::UnknownLayerReference { .. } => {
                "inbound nodes and outputs must name layers declared in `layers`"
            }
            LayerscapeError::UnrecognizedInboundFormat { .. } => {
                "each inbound node needs `inbound_layers` or `parent_nodes`"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
