//! Model structure: the layer dependency graph and its topological columns.
//!
//! The graph view needs to know which layer feeds which. [`build_adjacency`]
//! reconstructs that from the model's connection records and
//! [`build_hierarchy`] groups the layers into columns, each layer placed only
//! after all of its inputs.

mod adjacency;
mod hierarchy;

pub use adjacency::{
    AdjacencyGraph, NodeKey, augment_output_layers, build_adjacency, find_input_layers,
    find_layer_by_name, find_output_layers, incoming_layers, model_layers, outgoing_layers,
};
pub use hierarchy::{HierarchyLevel, build_hierarchy};
