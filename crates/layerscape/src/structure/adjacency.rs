//! Layer dependency graph reconstructed from a model's connection records.

use indexmap::IndexMap;
use log::{debug, trace};

use layerscape_core::model::{LayerId, ModelIntrospection};

use crate::error::LayerscapeError;

/// A node of the adjacency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// A layer of the model
    Layer(LayerId),
    /// A synthetic node standing for the n-th model output
    Output(usize),
}

impl NodeKey {
    /// Returns the layer handle, or `None` for synthetic nodes
    pub fn layer(self) -> Option<LayerId> {
        match self {
            Self::Layer(layer) => Some(layer),
            Self::Output(_) => None,
        }
    }
}

/// Dense edge-count matrix over graph nodes.
///
/// Nodes receive dense indices in first-seen order. `M[i][j]` counts the
/// connection records from node `i` to node `j`; repeated records between the
/// same pair increment the count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    indices: IndexMap<NodeKey, usize>,
    matrix: Vec<Vec<u32>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dense index of `key`, assigning the next one on first sight.
    pub fn insert(&mut self, key: NodeKey) -> usize {
        if let Some(&index) = self.indices.get(&key) {
            return index;
        }
        let index = self.indices.len();
        self.indices.insert(key, index);
        for row in &mut self.matrix {
            row.push(0);
        }
        self.matrix.push(vec![0; index + 1]);
        index
    }

    /// Records one connection from `src` to `dst`.
    pub fn add_edge(&mut self, src: NodeKey, dst: NodeKey) {
        let src = self.insert(src);
        let dst = self.insert(dst);
        self.matrix[src][dst] += 1;
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the dense index of `key`
    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        self.indices.get(&key).copied()
    }

    /// Reverse lookup from a dense index to its node
    pub fn key_at(&self, index: usize) -> Option<NodeKey> {
        self.indices.get_index(index).map(|(key, _)| *key)
    }

    /// Iterates over the nodes in index order
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.indices.keys().copied()
    }

    /// Returns `M[src][dst]`, 0 for out-of-range indices
    pub fn edge_count(&self, src: usize, dst: usize) -> u32 {
        self.matrix
            .get(src)
            .and_then(|row| row.get(dst))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the edge-count matrix, rows indexed by source
    pub fn matrix(&self) -> &[Vec<u32>] {
        &self.matrix
    }

    /// Indices `j` with `M[index][j] > 0`, ascending
    pub fn successors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.matrix
            .get(index)
            .into_iter()
            .flat_map(|row| row.iter().enumerate())
            .filter(|(_, count)| **count > 0)
            .map(|(j, _)| j)
    }

    /// Indices `i` with `M[i][index] > 0`, ascending
    pub fn predecessors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&i| self.edge_count(i, index) > 0)
    }

    /// Column sum of `index`: the number of inbound records
    pub fn in_degree(&self, index: usize) -> u32 {
        (0..self.len()).map(|i| self.edge_count(i, index)).sum()
    }

    /// Removes `key`, joining each of its predecessors to each of its
    /// successors with one record.
    ///
    /// Remaining nodes keep their relative order; indices after the removed
    /// node shift down by one. Returns `false` if `key` is not in the graph.
    ///
    /// # Examples
    ///
    /// ```
    /// # use layerscape::model::LayerId;
    /// # use layerscape::structure::{AdjacencyGraph, NodeKey};
    /// let [a, gap, b] = [0, 1, 2].map(|i| NodeKey::Layer(LayerId::new(i)));
    /// let mut graph = AdjacencyGraph::new();
    /// graph.add_edge(a, gap);
    /// graph.add_edge(gap, b);
    ///
    /// assert!(graph.bridge(gap));
    /// assert_eq!(graph.len(), 2);
    /// assert_eq!(graph.edge_count(0, 1), 1);
    /// ```
    pub fn bridge(&mut self, key: NodeKey) -> bool {
        let Some(index) = self.index_of(key) else {
            return false;
        };
        let preds: Vec<usize> = self.predecessors(index).filter(|&p| p != index).collect();
        let succs: Vec<usize> = self.successors(index).filter(|&s| s != index).collect();
        for &p in &preds {
            for &s in &succs {
                self.matrix[p][s] += 1;
            }
        }

        self.indices.shift_remove(&key);
        for position in self.indices.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        self.matrix.remove(index);
        for row in &mut self.matrix {
            row.remove(index);
        }
        true
    }

    /// Iterates over `(src, dst, count)` for every non-zero cell, row by row
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.matrix.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(move |(j, count)| (i, j, *count))
        })
    }
}

/// Returns the layers of `model` in container order.
///
/// The tracked-layers collection is tried first, the public layers
/// collection second.
///
/// # Errors
///
/// Returns [`LayerscapeError::MissingLayerContainer`] if the model exposes
/// neither collection.
pub fn model_layers<M>(model: &M) -> Result<Vec<LayerId>, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    model
        .tracked_layers()
        .or_else(|| model.layers())
        .ok_or(LayerscapeError::MissingLayerContainer)
}

/// Returns the layers feeding `layer`, one entry per inbound record.
///
/// Every inbound node is read in the older `inbound_layers` format when it
/// has one, and through its parent nodes otherwise; never both.
///
/// # Errors
///
/// Returns [`LayerscapeError::UnrecognizedInboundFormat`] for a node that
/// carries neither.
pub fn incoming_layers<M>(model: &M, layer: LayerId) -> Result<Vec<LayerId>, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    let mut incoming = Vec::new();
    for node in model.inbound_nodes(layer) {
        if let Some(inbound) = node.inbound_layers() {
            incoming.extend(inbound.iter().copied());
        } else if let Some(parents) = node.parent_nodes() {
            incoming.extend_from_slice(parents);
        } else {
            return Err(LayerscapeError::UnrecognizedInboundFormat {
                layer: model.name(layer).to_string(),
            });
        }
    }
    Ok(incoming)
}

/// Returns the layers consuming `layer`, one entry per outbound record.
pub fn outgoing_layers<M>(model: &M, layer: LayerId) -> Vec<LayerId>
where
    M: ModelIntrospection + ?Sized,
{
    model.outbound_layers(layer)
}

/// Reconstructs the layer dependency graph of `model`.
///
/// The model's build hook runs first. Layers are indexed in container order;
/// a layer referenced as an input before its own turn is indexed at first
/// reference.
///
/// # Errors
///
/// Returns [`LayerscapeError::MissingLayerContainer`] or
/// [`LayerscapeError::UnrecognizedInboundFormat`] when the model bookkeeping
/// cannot be read.
///
/// # Examples
///
/// ```
/// # use layerscape::description::ModelDescription;
/// # use layerscape::structure::{build_adjacency, NodeKey};
/// let json = r#"{
///     "name": "mlp",
///     "layers": [
///         {"name": "in", "kind": "InputLayer", "batch_shape": [null, 4]},
///         {"name": "hidden", "kind": "Dense", "units": 8,
///          "inbound_nodes": [{"inbound_layers": "in"}]}
///     ]
/// }"#;
/// let mut model = ModelDescription::from_json(json).unwrap();
///
/// let graph = build_adjacency(&mut model).unwrap();
/// assert_eq!(graph.len(), 2);
/// assert_eq!(graph.edge_count(0, 1), 1);
/// ```
pub fn build_adjacency<M>(model: &mut M) -> Result<AdjacencyGraph, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    model.ensure_built();
    let model = &*model;

    let mut graph = AdjacencyGraph::new();
    for layer in model_layers(model)? {
        let dst = NodeKey::Layer(layer);
        graph.insert(dst);
        for inbound in incoming_layers(model, layer)? {
            trace!(src = model.name(inbound), dst = model.name(layer); "Inbound record");
            graph.add_edge(NodeKey::Layer(inbound), dst);
        }
    }

    debug!(nodes = graph.len(), edges = graph.edges().count(); "Adjacency graph built");
    Ok(graph)
}

/// Returns the layers without inbound records, in index order.
pub fn find_input_layers(graph: &AdjacencyGraph) -> Vec<LayerId> {
    (0..graph.len())
        .filter(|&index| graph.in_degree(index) == 0)
        .filter_map(|index| graph.key_at(index).and_then(NodeKey::layer))
        .collect()
}

/// Returns the output layers of `model`.
///
/// Declared outputs win; otherwise every non-spacer layer whose outbound
/// records reach no other non-spacer layer is an output, in container order.
/// Outbound records into spacers are followed through them.
///
/// # Errors
///
/// Returns [`LayerscapeError::MissingLayerContainer`] if outputs must be
/// derived and the model exposes no layer collection.
pub fn find_output_layers<M>(model: &M) -> Result<Vec<LayerId>, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    if let Some(outputs) = model.output_layers() {
        return Ok(outputs);
    }
    Ok(model_layers(model)?
        .into_iter()
        .filter(|&layer| model.spacer_offset(layer).is_none() && !feeds_layer(model, layer))
        .collect())
}

/// Whether the outbound records of `layer` reach a non-spacer layer.
fn feeds_layer<M>(model: &M, layer: LayerId) -> bool
where
    M: ModelIntrospection + ?Sized,
{
    let mut visited = vec![layer];
    let mut pending = model.outbound_layers(layer);
    while let Some(next) = pending.pop() {
        if visited.contains(&next) {
            continue;
        }
        if model.spacer_offset(next).is_none() {
            return true;
        }
        visited.push(next);
        pending.extend(model.outbound_layers(next));
    }
    false
}

/// Returns the first layer named `name`, in container order.
///
/// # Errors
///
/// Returns [`LayerscapeError::MissingLayerContainer`] if the model exposes no
/// layer collection.
pub fn find_layer_by_name<M>(model: &M, name: &str) -> Result<Option<LayerId>, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    Ok(model_layers(model)?
        .into_iter()
        .find(|&layer| model.name(layer) == name))
}

/// Appends one synthetic output node per entry of `outputs`.
///
/// The n-th synthetic node is connected from `outputs[n]`. Returns the
/// synthetic nodes in order.
pub fn augment_output_layers(graph: &mut AdjacencyGraph, outputs: &[LayerId]) -> Vec<NodeKey> {
    outputs
        .iter()
        .enumerate()
        .map(|(n, &layer)| {
            let synthetic = NodeKey::Output(n);
            graph.insert(synthetic);
            graph.add_edge(NodeKey::Layer(layer), synthetic);
            synthetic
        })
        .collect()
}
