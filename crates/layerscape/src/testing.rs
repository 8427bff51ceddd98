//! In-memory models for unit tests.

use layerscape_core::model::{Dim, InboundNode, LayerId, ModelIntrospection, OneOrMany, RawShape};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    kind: String,
    shape: Option<RawShape>,
    units: Option<u64>,
    spacer: Option<f32>,
    inbound: Vec<InboundNode>,
}

/// A model whose layers, spacers included, are chained in insertion order
/// unless wired explicitly.
#[derive(Debug, Clone, Default)]
pub(crate) struct SequentialModel {
    entries: Vec<Entry>,
    outputs: Option<Vec<LayerId>>,
}

impl SequentialModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a layer fed by the previous entry.
    pub(crate) fn layer(self, name: &str, kind: &str, dims: &[Dim]) -> Self {
        self.raw_layer(name, kind, RawShape::Dims(dims.to_vec()))
    }

    pub(crate) fn raw_layer(mut self, name: &str, kind: &str, shape: RawShape) -> Self {
        let inbound = self.chain_inbound();
        self.entries.push(Entry {
            name: name.to_string(),
            kind: kind.to_string(),
            shape: Some(shape),
            units: None,
            spacer: None,
            inbound,
        });
        self
    }

    /// Appends a dense layer with `units` neurons.
    pub(crate) fn dense(self, name: &str, units: u64) -> Self {
        let mut model = self.layer(name, "Dense", &[None, Some(units)]);
        if let Some(last) = model.entries.last_mut() {
            last.units = Some(units);
        }
        model
    }

    pub(crate) fn spacer(mut self, offset: f32) -> Self {
        let inbound = self.chain_inbound();
        self.entries.push(Entry {
            name: format!("spacer_{}", self.entries.len()),
            kind: "SpacingDummyLayer".to_string(),
            shape: None,
            units: None,
            spacer: Some(offset),
            inbound,
        });
        self
    }

    fn chain_inbound(&self) -> Vec<InboundNode> {
        self.entries
            .len()
            .checked_sub(1)
            .map(|previous| vec![InboundNode::legacy(OneOrMany::One(LayerId::new(previous)))])
            .unwrap_or_default()
    }

    /// Replaces the inputs of layer `dst` with `sources`.
    pub(crate) fn wire(mut self, dst: usize, sources: &[usize]) -> Self {
        let ids = sources.iter().copied().map(LayerId::new).collect();
        self.entries[dst].inbound = vec![InboundNode::legacy(OneOrMany::Many(ids))];
        self
    }

    pub(crate) fn with_outputs(mut self, outputs: &[usize]) -> Self {
        self.outputs = Some(outputs.iter().copied().map(LayerId::new).collect());
        self
    }
}

impl ModelIntrospection for SequentialModel {
    fn tracked_layers(&self) -> Option<Vec<LayerId>> {
        Some((0..self.entries.len()).map(LayerId::new).collect())
    }

    fn name(&self, layer: LayerId) -> &str {
        &self.entries[layer.index()].name
    }

    fn kind(&self, layer: LayerId) -> &str {
        &self.entries[layer.index()].kind
    }

    fn output_shape(&self, layer: LayerId) -> Option<RawShape> {
        self.entries[layer.index()].shape.clone()
    }

    fn inbound_nodes(&self, layer: LayerId) -> Vec<InboundNode> {
        self.entries[layer.index()].inbound.clone()
    }

    fn outbound_layers(&self, layer: LayerId) -> Vec<LayerId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.inbound.iter().any(|node| {
                    node.inbound_layers()
                        .is_some_and(|sources| sources.iter().any(|s| *s == layer))
                })
            })
            .map(|(i, _)| LayerId::new(i))
            .collect()
    }

    fn units(&self, layer: LayerId) -> Option<u64> {
        self.entries[layer.index()].units
    }

    fn spacer_offset(&self, layer: LayerId) -> Option<f32> {
        self.entries[layer.index()].spacer
    }

    fn output_layers(&self) -> Option<Vec<LayerId>> {
        self.outputs.clone()
    }
}
