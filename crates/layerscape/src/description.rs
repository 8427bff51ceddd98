//! JSON model descriptions.
//!
//! A [`ModelDescription`] is a serialized stand-in for a live model: a list of
//! layers with their shapes, neuron counts and inbound connection records.
//! It implements [`ModelIntrospection`] so both views can render it.
//!
//! ```json
//! {
//!     "name": "mlp",
//!     "layers": [
//!         {"name": "in", "kind": "InputLayer", "batch_shape": [null, 4]},
//!         {"name": "hidden", "kind": "Dense", "units": 8, "output_shape": [null, 8],
//!          "inbound_nodes": [{"inbound_layers": "in"}]},
//!         {"name": "out", "kind": "Dense", "units": 2, "output_shape": [null, 2],
//!          "inbound_nodes": [{"parent_nodes": ["hidden"]}]}
//!     ],
//!     "outputs": ["out"]
//! }
//! ```

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};

use layerscape_core::model::{InboundNode, LayerId, ModelIntrospection, OneOrMany, RawShape};

use crate::error::LayerscapeError;

#[derive(Debug, Deserialize)]
struct DescriptionRepr {
    name: String,
    layers: Vec<LayerRepr>,
    #[serde(default)]
    outputs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct LayerRepr {
    name: String,
    kind: String,
    #[serde(default, deserialize_with = "present_shape")]
    output_shape: Option<RawShape>,
    #[serde(default, deserialize_with = "present_shape")]
    input_shape: Option<RawShape>,
    #[serde(default, deserialize_with = "present_shape")]
    batch_shape: Option<RawShape>,
    #[serde(default)]
    units: Option<u64>,
    #[serde(default)]
    filters: Option<u64>,
    #[serde(default)]
    spacing: Option<f32>,
    #[serde(default)]
    inbound_nodes: Vec<InboundRepr>,
}

#[derive(Debug, Deserialize)]
struct InboundRepr {
    #[serde(default)]
    inbound_layers: Option<OneOrMany<String>>,
    #[serde(default)]
    parent_nodes: Option<Vec<String>>,
}

/// A present `null` is a reported null shape; only a missing field is absent.
fn present_shape<'de, D>(deserializer: D) -> Result<Option<RawShape>, D::Error>
where
    D: Deserializer<'de>,
{
    RawShape::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone)]
struct LayerEntry {
    name: String,
    kind: String,
    output_shape: Option<RawShape>,
    input_shape: Option<RawShape>,
    batch_shape: Option<RawShape>,
    units: Option<u64>,
    filters: Option<u64>,
    spacing: Option<f32>,
    inbound: Vec<InboundNode>,
    outbound: Vec<LayerId>,
}

/// A model read from a JSON description.
#[derive(Debug, Clone)]
pub struct ModelDescription {
    name: String,
    layers: Vec<LayerEntry>,
    outputs: Option<Vec<LayerId>>,
}

impl ModelDescription {
    /// Parses a JSON model description.
    ///
    /// Inbound records and declared outputs name their layers; every name is
    /// resolved to the first layer carrying it. Outbound records are derived
    /// from the inbound ones, one per inbound reference.
    ///
    /// # Errors
    ///
    /// Returns [`LayerscapeError::ModelFormat`] for malformed JSON and
    /// [`LayerscapeError::UnknownLayerReference`] for a reference to a layer
    /// that does not exist.
    pub fn from_json(json: &str) -> Result<Self, LayerscapeError> {
        let repr: DescriptionRepr = serde_json::from_str(json)?;

        let mut ids: IndexMap<String, LayerId> = IndexMap::with_capacity(repr.layers.len());
        for (index, layer) in repr.layers.iter().enumerate() {
            if ids.contains_key(&layer.name) {
                warn!(layer = layer.name.as_str(); "Duplicate layer name, references resolve to the first one");
                continue;
            }
            ids.insert(layer.name.clone(), LayerId::new(index));
        }

        let resolve = |owner: &str, reference: &str| {
            ids.get(reference)
                .copied()
                .ok_or_else(|| LayerscapeError::UnknownLayerReference {
                    layer: owner.to_string(),
                    reference: reference.to_string(),
                })
        };

        let mut layers = Vec::with_capacity(repr.layers.len());
        for layer in repr.layers {
            let mut inbound = Vec::with_capacity(layer.inbound_nodes.len());
            for node in &layer.inbound_nodes {
                inbound.push(match (&node.inbound_layers, &node.parent_nodes) {
                    (Some(OneOrMany::One(name)), _) => {
                        InboundNode::legacy(OneOrMany::One(resolve(&layer.name, name)?))
                    }
                    (Some(OneOrMany::Many(names)), _) => InboundNode::legacy(OneOrMany::Many(
                        names
                            .iter()
                            .map(|name| resolve(&layer.name, name))
                            .collect::<Result<_, _>>()?,
                    )),
                    (None, Some(names)) => InboundNode::with_parents(
                        names
                            .iter()
                            .map(|name| resolve(&layer.name, name))
                            .collect::<Result<_, _>>()?,
                    ),
                    (None, None) => InboundNode::default(),
                });
            }

            layers.push(LayerEntry {
                name: layer.name,
                kind: layer.kind,
                output_shape: layer.output_shape,
                input_shape: layer.input_shape,
                batch_shape: layer.batch_shape,
                units: layer.units,
                filters: layer.filters,
                spacing: layer.spacing,
                inbound,
                outbound: Vec::new(),
            });
        }

        for dst in 0..layers.len() {
            let sources: Vec<LayerId> = layers[dst]
                .inbound
                .iter()
                .flat_map(|node| match (node.inbound_layers(), node.parent_nodes()) {
                    (Some(inbound), _) => inbound.iter().copied().collect(),
                    (None, Some(parents)) => parents.to_vec(),
                    (None, None) => Vec::new(),
                })
                .collect();
            for src in sources {
                layers[src.index()].outbound.push(LayerId::new(dst));
            }
        }

        let outputs = repr
            .outputs
            .map(|names| {
                names
                    .iter()
                    .map(|name| resolve("outputs", name))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        debug!(model = repr.name.as_str(), layers = layers.len(); "Model description loaded");
        Ok(Self {
            name: repr.name,
            layers,
            outputs,
        })
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn entry(&self, layer: LayerId) -> &LayerEntry {
        &self.layers[layer.index()]
    }
}

impl ModelIntrospection for ModelDescription {
    fn tracked_layers(&self) -> Option<Vec<LayerId>> {
        Some((0..self.layers.len()).map(LayerId::new).collect())
    }

    fn name(&self, layer: LayerId) -> &str {
        &self.entry(layer).name
    }

    fn kind(&self, layer: LayerId) -> &str {
        &self.entry(layer).kind
    }

    fn output_shape(&self, layer: LayerId) -> Option<RawShape> {
        self.entry(layer).output_shape.clone()
    }

    fn batch_shape(&self, layer: LayerId) -> Option<RawShape> {
        self.entry(layer).batch_shape.clone()
    }

    fn input_shape(&self, layer: LayerId) -> Option<RawShape> {
        self.entry(layer).input_shape.clone()
    }

    fn inbound_nodes(&self, layer: LayerId) -> Vec<InboundNode> {
        self.entry(layer).inbound.clone()
    }

    fn outbound_layers(&self, layer: LayerId) -> Vec<LayerId> {
        self.entry(layer).outbound.clone()
    }

    fn units(&self, layer: LayerId) -> Option<u64> {
        self.entry(layer).units
    }

    fn filters(&self, layer: LayerId) -> Option<u64> {
        self.entry(layer).filters
    }

    fn spacer_offset(&self, layer: LayerId) -> Option<f32> {
        self.entry(layer).spacing
    }

    fn output_layers(&self) -> Option<Vec<LayerId>> {
        self.outputs.clone()
    }
}
