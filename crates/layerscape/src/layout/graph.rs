//! Graph view: one column per hierarchy level, one node per neuron.
//!
//! Every level becomes a column of nodes, the columns laid out left to right
//! and each column centered vertically on the canvas. A layer exposing a
//! neuron or filter count contributes up to `ellipsize_after` circles; one
//! of them is replaced by an ellipsis marker when the count is truncated.
//! Layers without a count, and the synthetic output nodes appended after
//! the last level, are drawn as a single tall box. Spacer layers take no
//! column; their inputs are joined straight to their outputs.
//!
//! Connectors run from the right middle of every node of a source layer to
//! the left middle of every node of its destination layer.

use std::collections::HashMap;

use log::{debug, info, trace};

use layerscape_core::{
    color::Rgba,
    draw::{Connector, Primitive, PrimitiveKind, Scene, SceneBuilder},
    geometry::{Bounds, Point, Size},
    model::ModelIntrospection,
};

use crate::{
    config::{GraphConfig, StyleConfig},
    error::LayerscapeError,
    structure::{NodeKey, augment_output_layers, build_adjacency, build_hierarchy, find_output_layers},
};

use super::style::StyleResolver;

/// Kind reported for the synthetic output nodes.
pub const OUTPUT_KIND: &str = "Output";

/// Height of a box node, in node sizes.
const BOX_HEIGHT_FACTOR: f32 = 3.0;

/// How a graph node renders a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeShape {
    /// `count` neuron circles, truncated to the ellipsize threshold
    Neurons(u64),
    /// A single tall box
    Block,
}

/// Layout engine of the graph view.
///
/// # Examples
///
/// ```
/// # use layerscape::config::AppConfig;
/// # use layerscape::description::ModelDescription;
/// # use layerscape::layout::GraphEngine;
/// let json = r#"{
///     "name": "mlp",
///     "layers": [
///         {"name": "in", "kind": "InputLayer", "batch_shape": [null, 3], "units": 3},
///         {"name": "out", "kind": "Dense", "units": 2,
///          "inbound_nodes": [{"inbound_layers": "in"}]}
///     ]
/// }"#;
/// let mut model = ModelDescription::from_json(json).unwrap();
/// let config = AppConfig::default();
///
/// let scene = GraphEngine::new(config.graph(), config.style())
///     .layout(&mut model)
///     .unwrap();
/// // 3 + 2 neurons and one synthetic output box
/// assert_eq!(scene.primitives().len(), 6);
/// // 3 * 2 between the layers, 2 * 1 into the output box
/// assert_eq!(scene.connectors().len(), 8);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphEngine<'a> {
    config: &'a GraphConfig,
    style: &'a StyleConfig,
}

impl<'a> GraphEngine<'a> {
    pub fn new(config: &'a GraphConfig, style: &'a StyleConfig) -> Self {
        Self { config, style }
    }

    /// Lays out the dependency graph of `model`.
    ///
    /// The model's build hook runs before its connections are read.
    ///
    /// # Errors
    ///
    /// Fails if the connection records cannot be read or a configured color is
    /// invalid.
    pub fn layout<M>(&self, model: &mut M) -> Result<Scene, LayerscapeError>
    where
        M: ModelIntrospection + ?Sized,
    {
        let config = self.config;
        let resolver = StyleResolver::new(self.style);

        let mut graph = build_adjacency(model)?;
        let model = &*model;

        // spacers only shift boxes in the layered view
        let spacers: Vec<NodeKey> = graph
            .keys()
            .filter(|key| key.layer().is_some_and(|layer| model.spacer_offset(layer).is_some()))
            .collect();
        for spacer in spacers {
            graph.bridge(spacer);
        }
        debug!(nodes = graph.len(); "Spacers bridged");

        let mut columns = build_hierarchy(&graph);

        let outputs = find_output_layers(model)?;
        let synthetic = augment_output_layers(&mut graph, &outputs);
        if !synthetic.is_empty() {
            columns.push(synthetic);
        }

        info!(columns = columns.len(), outputs = outputs.len(); "Computing graph layout");

        let mut builder = SceneBuilder::new();
        let mut placed: Vec<Primitive> = Vec::new();
        let mut nodes_of: HashMap<NodeKey, Vec<usize>> = HashMap::new();
        let mut column_spans: Vec<(usize, f32)> = Vec::with_capacity(columns.len());

        let mut x = config.padding();
        for column in &columns {
            let first = placed.len();
            let mut y = 0.0_f32;

            for &key in column {
                let (kind, shape) = match key.layer() {
                    Some(layer) => {
                        let count = model.units(layer).or_else(|| model.filters(layer));
                        let shape = match count {
                            Some(count) if config.show_neurons() => NodeShape::Neurons(count),
                            _ => NodeShape::Block,
                        };
                        (model.kind(layer), shape)
                    }
                    None => (OUTPUT_KIND, NodeShape::Block),
                };

                let style = resolver.graph(kind)?;
                builder.record_style(kind, style);

                let nodes = self.column_nodes(shape, x, &mut y, style.fill(), style.outline());
                trace!(node:? = key, kind, nodes = nodes.len(); "Graph node placed");

                let indices = nodes_of.entry(key).or_default();
                for node in nodes {
                    indices.push(placed.len());
                    placed.push(match key.layer() {
                        Some(layer) => node.with_layer(layer),
                        None => node,
                    });
                }
                y += 2.0 * config.node_size();
            }

            let height = (y - config.node_spacing() - 2.0 * config.node_size()).max(0.0);
            column_spans.push((first, height));
            x += config.node_size() + config.layer_spacing();
        }

        let size = self.canvas_size(columns.len(), &column_spans);

        let mut column_end = placed.len();
        for &(first, height) in column_spans.iter().rev() {
            let offset = (size.height() - height) / 2.0;
            for node in &mut placed[first..column_end] {
                node.translate(Point::new(0.0, offset));
            }
            column_end = first;
        }

        let color = config.connector_color()?;
        let mut connectors = 0_usize;
        for (src, dst, _) in graph.edges() {
            let (Some(src), Some(dst)) = (graph.key_at(src), graph.key_at(dst)) else {
                continue;
            };
            let (Some(starts), Some(ends)) = (nodes_of.get(&src), nodes_of.get(&dst)) else {
                continue;
            };
            for start in starts.iter().map(|&i| &placed[i]) {
                for end in ends.iter().map(|&i| &placed[i]) {
                    if start.kind() == PrimitiveKind::Ellipsis || end.kind() == PrimitiveKind::Ellipsis {
                        continue;
                    }
                    builder.push_connector(Connector::new(
                        start.bounds().right_middle(),
                        end.bounds().left_middle(),
                        color,
                        config.connector_width(),
                    ));
                    connectors += 1;
                }
            }
        }

        for node in placed {
            builder.push_primitive(node);
        }

        info!(connectors, width = size.width(), height = size.height(); "Graph layout computed");
        Ok(builder.build(size))
    }

    /// Stacks the nodes of one layer downward from `y`, leaving `y` below the
    /// last node plus one node spacing.
    fn column_nodes(&self, shape: NodeShape, x: f32, y: &mut f32, fill: Rgba, outline: Rgba) -> Vec<Primitive> {
        let config = self.config;
        let size = config.node_size();

        let limit = u64::try_from(config.ellipsize_after()).unwrap_or(u64::MAX);
        let (count, height, ellipsis_at) = match shape {
            NodeShape::Neurons(count) => {
                let ellipsis_at = (count > limit)
                    .then(|| config.ellipsize_after().checked_sub(2))
                    .flatten();
                (count.min(limit), size, ellipsis_at)
            }
            NodeShape::Block => (1, size * BOX_HEIGHT_FACTOR, None),
        };

        let mut nodes = Vec::new();
        for i in 0..count {
            let bounds = Bounds::new_from_top_left(Point::new(x, *y), Size::new(size, height));
            let node = match shape {
                NodeShape::Block => Primitive::new_box(bounds, 0.0, fill, outline, 0),
                NodeShape::Neurons(_) if usize::try_from(i).ok() == ellipsis_at => {
                    Primitive::ellipsis(bounds, fill, outline)
                }
                NodeShape::Neurons(_) => Primitive::circle(bounds, fill, outline),
            };
            *y = bounds.max_y() + config.node_spacing();
            nodes.push(node);
        }

        if ellipsis_at.is_some() {
            debug!(count = nodes.len(); "Neuron column truncated");
        }
        nodes
    }

    /// `cols * node_size + (cols - 1) * layer_spacing + 2 * padding` wide,
    /// tallest column plus `2 * padding` high.
    fn canvas_size(&self, columns: usize, spans: &[(usize, f32)]) -> Size {
        let config = self.config;
        let cols = columns as f32;
        let gaps = columns.saturating_sub(1) as f32;
        let width = cols * config.node_size() + gaps * config.layer_spacing() + 2.0 * config.padding();
        let tallest = spans.iter().map(|(_, height)| *height).fold(0.0_f32, f32::max);
        Size::new(width, tallest + 2.0 * config.padding())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use layerscape_core::model::LayerId;

    use crate::testing::SequentialModel;

    use super::*;

    fn run(model: &mut SequentialModel, config: &GraphConfig) -> Scene {
        let style = StyleConfig::default();
        GraphEngine::new(config, &style).layout(model).unwrap()
    }

    fn count(scene: &Scene, kind: PrimitiveKind) -> usize {
        scene.primitives().iter().filter(|p| p.kind() == kind).count()
    }

    #[test]
    fn test_simple_mlp() {
        let mut model = SequentialModel::new().dense("in", 3).dense("hidden", 4).dense("out", 2);
        let config = GraphConfig::default();
        let scene = run(&mut model, &config);

        assert_eq!(count(&scene, PrimitiveKind::Circle), 9);
        assert_eq!(count(&scene, PrimitiveKind::Box), 1);
        assert_eq!(scene.connectors().len(), 3 * 4 + 4 * 2 + 2);

        // four columns including the synthetic output
        let expected_width = 4.0 * 50.0 + 3.0 * 250.0 + 20.0;
        assert_eq!(scene.size().width(), expected_width);
        // tallest column: 4 nodes of 50 with 3 gaps of 10
        assert_eq!(scene.size().height(), 4.0 * 50.0 + 3.0 * 10.0 + 20.0);
    }

    #[test]
    fn test_custom_spacing() {
        let mut model = SequentialModel::new().dense("in", 3).dense("out", 2);
        let config = GraphConfig::default()
            .with_node_size(20.0)
            .with_node_spacing(5.0)
            .with_layer_spacing(100.0)
            .with_padding(0.0);
        let scene = run(&mut model, &config);

        // in, out and the output box
        assert_eq!(scene.size().width(), 3.0 * 20.0 + 2.0 * 100.0);
        // three nodes beat the output box of 3 * 20
        assert_eq!(scene.size().height(), 3.0 * 20.0 + 2.0 * 5.0);
    }

    #[test]
    fn test_columns_are_centered() {
        let mut model = SequentialModel::new().dense("in", 1).dense("out", 5);
        let scene = run(&mut model, &GraphConfig::default());

        let canvas_middle = scene.size().height() / 2.0;
        let single = &scene.primitives()[0];
        assert!(approx_eq!(f32, single.bounds().center().y(), canvas_middle, ulps = 4));

        let output_box = scene.primitives().last().unwrap();
        assert_eq!(output_box.kind(), PrimitiveKind::Box);
        assert_eq!(output_box.bounds().height(), 150.0);
        assert!(approx_eq!(f32, output_box.bounds().center().y(), canvas_middle, ulps = 4));
    }

    #[test]
    fn test_ellipsis_and_truncation() {
        let mut model = SequentialModel::new().dense("in", 2).dense("wide", 100);
        let config = GraphConfig::default().with_ellipsize_after(5);
        let scene = run(&mut model, &config);

        let wide: Vec<&Primitive> = scene
            .primitives()
            .iter()
            .filter(|p| p.layer().map(|l| l.index()) == Some(1))
            .collect();
        assert_eq!(wide.len(), 5);
        assert_eq!(wide[3].kind(), PrimitiveKind::Ellipsis);
        assert_eq!(count(&scene, PrimitiveKind::Ellipsis), 1);

        // 2 * 4 into the wide layer, 4 * 1 into the output box
        assert_eq!(scene.connectors().len(), 8 + 4);
        let marker = wide[3].bounds();
        for connector in scene.connectors() {
            assert_ne!(connector.to(), marker.left_middle());
            assert_ne!(connector.from(), marker.right_middle());
        }
    }

    #[test]
    fn test_no_ellipsis_at_threshold() {
        let mut model = SequentialModel::new().dense("in", 5);
        let config = GraphConfig::default().with_ellipsize_after(5);
        let scene = run(&mut model, &config);
        assert_eq!(count(&scene, PrimitiveKind::Circle), 5);
        assert_eq!(count(&scene, PrimitiveKind::Ellipsis), 0);
    }

    #[test]
    fn test_hidden_neurons_draw_boxes() {
        let mut model = SequentialModel::new().dense("in", 3).dense("out", 2);
        let config = GraphConfig::default().with_show_neurons(false);
        let scene = run(&mut model, &config);
        assert_eq!(count(&scene, PrimitiveKind::Box), 3);
        assert_eq!(scene.connectors().len(), 2);
    }

    #[test]
    fn test_branching_model_columns() {
        // in -> a, in -> b, (a, b) -> merged
        let mut model = SequentialModel::new()
            .dense("in", 1)
            .dense("a", 1)
            .dense("b", 1)
            .dense("merged", 1)
            .wire(2, &[0])
            .wire(3, &[1, 2])
            .with_outputs(&[3]);
        let scene = run(&mut model, &GraphConfig::default());

        let xs: Vec<f32> = scene.primitives().iter().map(|p| p.bounds().min_x()).collect();
        assert_eq!(xs[0], 10.0);
        assert_eq!(xs[1], xs[2]);
        assert!(xs[3] > xs[1]);
        assert!(xs[4] > xs[3]);
        assert_eq!(scene.connectors().len(), 2 + 2 + 1);
    }

    #[test]
    fn test_nodes_do_not_overlap() {
        let mut model = SequentialModel::new().dense("in", 7).dense("hidden", 12).dense("out", 3);
        let scene = run(&mut model, &GraphConfig::default());
        let nodes = scene.primitives();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                assert!(!a.bounds().intersects(&b.bounds()), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_spacer_in_chain_is_bridged() {
        // in -> gap -> out, the way a sequential model wires a spacer
        let mut model = SequentialModel::new()
            .dense("in", 2)
            .spacer(30.0)
            .dense("out", 2)
            .with_outputs(&[2]);
        let scene = run(&mut model, &GraphConfig::default());

        assert_eq!(count(&scene, PrimitiveKind::Circle), 4);
        assert_eq!(count(&scene, PrimitiveKind::Box), 1);
        assert!(scene.primitives().iter().all(|p| p.layer() != Some(LayerId::new(1))));
        // 2 * 2 from in to out, 2 * 1 into the output box
        assert_eq!(scene.connectors().len(), 4 + 2);

        // three columns: in, out and the output box
        let expected_width = 3.0 * 50.0 + 2.0 * 250.0 + 20.0;
        assert_eq!(scene.size().width(), expected_width);
    }

    #[test]
    fn test_derived_outputs_skip_spacers() {
        // trailing spacer after the last real layer
        let mut trailing = SequentialModel::new().dense("in", 2).dense("out", 2).spacer(30.0);
        let scene = run(&mut trailing, &GraphConfig::default());
        assert_eq!(count(&scene, PrimitiveKind::Box), 1);
        assert_eq!(scene.connectors().len(), 4 + 2);

        // spacer hanging off `in` with nothing after it
        let mut detached = SequentialModel::new()
            .dense("in", 2)
            .spacer(30.0)
            .dense("out", 2)
            .wire(2, &[0]);
        let scene = run(&mut detached, &GraphConfig::default());
        assert_eq!(count(&scene, PrimitiveKind::Box), 1);
        assert_eq!(scene.connectors().len(), 4 + 2);
    }

    #[test]
    fn test_ellipsis_position_for_fifty_units() {
        let mut model = SequentialModel::new().dense("wide", 50);
        let config = GraphConfig::default().with_ellipsize_after(10);
        let scene = run(&mut model, &config);

        let wide: Vec<&Primitive> = scene
            .primitives()
            .iter()
            .filter(|p| p.layer() == Some(LayerId::new(0)))
            .collect();
        assert_eq!(wide.len(), 10);
        for (i, node) in wide.iter().enumerate() {
            let expected = if i == 8 {
                PrimitiveKind::Ellipsis
            } else {
                PrimitiveKind::Circle
            };
            assert_eq!(node.kind(), expected, "node {i}");
        }
    }

    #[test]
    fn test_output_style_recorded() {
        let mut model = SequentialModel::new().dense("in", 1);
        let scene = run(&mut model, &GraphConfig::default());
        assert!(scene.style_of(OUTPUT_KIND).is_some());
        assert!(scene.style_of("Dense").is_some());
    }
}
