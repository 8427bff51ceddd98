//! Layerscape Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Layerscape layout
//! engine, its drawing backends and the model adapters. It includes:
//!
//! - **Colors**: CSS color parsing, RGBA normalization and the round-robin
//!   [`color::ColorWheel`]
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Model**: The read-only introspection interface over a host model and the
//!   tensor [`model::Shape`] type ([`model`] module)
//! - **Draw**: The geometric scene produced by layout and the render layers used
//!   by SVG backends ([`draw`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod model;
