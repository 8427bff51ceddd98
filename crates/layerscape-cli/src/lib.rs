//! Layerscape CLI library
//!
//! This module contains the core CLI logic for the Layerscape diagram tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, View};
pub use error_adapter::ErrorAdapter;

use std::fs;

use log::{info, warn};

use layerscape::{DiagramBuilder, LayerscapeError, description::ModelDescription};

/// Run the Layerscape CLI application
///
/// Reads the model description, lays out the selected view and writes the
/// resulting SVG to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `LayerscapeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed model descriptions
/// - Layout errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), LayerscapeError> {
    info!(
        input_path = args.input,
        output_path = args.output,
        view:? = args.view;
        "Processing model"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let mut model = ModelDescription::from_json(&source)?;
    info!(model = model.name(), layers = model.len(); "Model loaded");

    let builder = DiagramBuilder::new(app_config);
    let scene = match args.view {
        View::Layered => {
            let mut wheel = builder.color_wheel()?;
            builder.layered_view(&model, &mut wheel)?
        }
        View::Graph => builder.graph_view(&mut model)?,
    };

    if !scene.warnings().is_empty() {
        warn!(count = scene.warnings().len(); "Layout completed with warnings");
    }

    let svg = builder.render_svg(&scene)?;
    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
