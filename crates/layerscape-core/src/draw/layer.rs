//! Layer-based rendering for SVG output.
//!
//! Scene elements of the same category are collected into one [`RenderLayer`]
//! and every layer becomes its own `<g data-layer="...">` group, so funnels and
//! connectors always sit below the layer boxes they join and the legend always
//! sits on top.
//!
//! # Example
//!
//! ```
//! # use layerscape_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Line, Rectangle};
//!
//! let mut output = LayeredOutput::new();
//!
//! output.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));
//! output.add_to_layer(RenderLayer::Connector, Box::new(Line::new()));
//!
//! // Connector group renders before the shape group
//! let svg_nodes = output.render();
//! assert_eq!(svg_nodes.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers, bottom to top in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Canvas background
    Background,
    /// Funnel segments and neuron connectors
    Connector,
    /// Layer boxes, neurons and ellipsis placeholders
    Shape,
    /// Legend swatches and labels
    Legend,
}

impl RenderLayer {
    /// Returns the value of the `data-layer` attribute for this layer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Connector => "connector",
            Self::Shape => "shape",
            Self::Legend => "legend",
        }
    }
}

/// SVG nodes grouped by rendering layer.
///
/// Nodes keep their insertion order within a layer.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node to the specified layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Appends every node of `other`, keeping their layers.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    /// Returns `true` if there are no nodes in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes an SVG `<g>` element with a `data-layer`
    /// attribute. Empty layers are skipped.
    pub fn render(mut self) -> Vec<SvgNode> {
        // Stable sort keeps per-layer insertion order
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result: Vec<SvgNode> = Vec::new();
        let mut current: Option<(RenderLayer, svg_element::Group)> = None;

        for (layer, node) in self.items {
            current = match current {
                Some((current_layer, group)) if current_layer == layer => {
                    Some((current_layer, group.add(node)))
                }
                previous => {
                    if let Some((_, group)) = previous {
                        result.push(Box::new(group));
                    }
                    let group = svg_element::Group::new().set("data-layer", layer.name());
                    Some((layer, group.add(node)))
                }
            };
        }

        if let Some((_, group)) = current {
            result.push(Box::new(group));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svg::node::element::{Line, Rectangle};

    #[test]
    fn test_layered_output_new() {
        let output = LayeredOutput::new();
        assert!(output.is_empty());
        assert!(output.render().is_empty());
    }

    #[test]
    fn test_layered_output_merge() {
        let mut output1 = LayeredOutput::new();
        output1.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));

        let mut output2 = LayeredOutput::new();
        output2.add_to_layer(RenderLayer::Legend, Box::new(Rectangle::new()));

        output1.merge(output2);
        assert_eq!(output1.render().len(), 2);
    }

    #[test]
    fn test_layered_output_groups_same_layer() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Connector, Box::new(Line::new()));
        output.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));

        let nodes = output.render();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_layered_output_render_order() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Legend, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Shape, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Background, Box::new(Rectangle::new()));

        let document = output
            .render()
            .into_iter()
            .fold(svg::Document::new(), |doc, node| doc.add(node));
        let text = document.to_string();

        let background = text.find("data-layer=\"background\"").unwrap();
        let shape = text.find("data-layer=\"shape\"").unwrap();
        let legend = text.find("data-layer=\"legend\"").unwrap();
        assert!(background < shape);
        assert!(shape < legend);
    }
}
