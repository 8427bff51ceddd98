//! Command-line argument definitions for the Layerscape CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, the diagram view,
//! configuration file selection, and logging verbosity.

use clap::{Parser, ValueEnum};

/// Diagram view to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// One pseudo-3D box per layer joined by funnels
    #[default]
    Layered,
    /// One column per topological level with a node per neuron
    Graph,
}

/// Command-line arguments for the Layerscape diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model description (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Diagram view
    #[arg(long, value_enum, default_value_t = View::Layered)]
    pub view: View,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
