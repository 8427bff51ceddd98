//! Layered view: one pseudo-3D box per layer, left to right.
//!
//! Boxes are placed along a running horizontal coordinate in container order.
//! Each box is as wide as its scaled depth and as tall as its scaled height;
//! with volume drawing enabled it also gets a back face offset by a third of
//! its horizontal extent. Consecutive boxes are joined by a funnel of four
//! lines between their corners.
//!
//! ```text
//!        ____          ____
//!       /   /|  ____  /   /|
//!      /___/ | /   /|/___/ |
//!      |   | |/___/ ||   | |
//!      |   | ||   | ||   | |
//!      |   | /|___|/ |   | /
//!      |___|/        |___|/
//! ```

use log::{debug, info, trace};

use layerscape_core::{
    color::ColorWheel,
    draw::{Connector, FontMetrics, Primitive, ResolvedStyle, Scene, SceneBuilder, TextMetrics},
    geometry::{Bounds, Point, Size},
    model::{LayerId, ModelIntrospection, Shape},
};

use crate::{
    config::{LayeredConfig, StyleConfig},
    error::LayerscapeError,
    shape::{normalize, resolve_output_shape},
    structure::model_layers,
};

use super::{
    legend::layout_legend,
    sizing::DimensionScaler,
    style::StyleResolver,
};

/// Width of funnel lines.
const FUNNEL_WIDTH: f32 = 1.0;

static LEGEND_METRICS: FontMetrics = FontMetrics::sans_serif();

/// A box placed on the running coordinate, before centering.
struct PlacedBox {
    primitive: Primitive,
    kind: String,
    shape: Shape,
    style: ResolvedStyle,
    /// No funnel joins this box to the previous one
    starts_chain: bool,
}

/// Layout engine of the layered view.
///
/// # Examples
///
/// ```
/// # use layerscape::config::AppConfig;
/// # use layerscape::description::ModelDescription;
/// # use layerscape::layout::LayeredEngine;
/// # use layerscape_core::color::ColorWheel;
/// let json = r#"{
///     "name": "cnn",
///     "layers": [
///         {"name": "in", "kind": "InputLayer", "batch_shape": [null, 28, 28, 1]},
///         {"name": "conv", "kind": "Conv2D", "output_shape": [null, 26, 26, 32],
///          "inbound_nodes": [{"inbound_layers": "in"}]}
///     ]
/// }"#;
/// let model = ModelDescription::from_json(json).unwrap();
/// let config = AppConfig::default();
/// let mut wheel = ColorWheel::default();
///
/// let scene = LayeredEngine::new(config.layered(), config.style())
///     .layout(&model, &mut wheel)
///     .unwrap();
/// assert_eq!(scene.primitives().len(), 2);
/// assert_eq!(scene.connectors().len(), 4);
/// ```
pub struct LayeredEngine<'a> {
    config: &'a LayeredConfig,
    style: &'a StyleConfig,
    metrics: &'a dyn TextMetrics,
}

impl<'a> LayeredEngine<'a> {
    /// Creates an engine measuring legend labels with [`FontMetrics`].
    pub fn new(config: &'a LayeredConfig, style: &'a StyleConfig) -> Self {
        Self {
            config,
            style,
            metrics: &LEGEND_METRICS,
        }
    }

    /// Replaces the text metrics used to size legend labels.
    pub fn with_text_metrics(mut self, metrics: &'a dyn TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Lays out every layer of `model`.
    ///
    /// Layers whose kind is listed in `type_ignore` or whose container position
    /// is listed in `index_ignore` are skipped. Spacer layers move the running
    /// coordinate and break the funnel chain. Boxes without a mapped fill color
    /// take the next color of `wheel`.
    ///
    /// # Errors
    ///
    /// Fails if the model exposes no layer container, a layer reports no
    /// usable shape, or a configured color is invalid.
    pub fn layout<M>(&self, model: &M, wheel: &mut ColorWheel) -> Result<Scene, LayerscapeError>
    where
        M: ModelIntrospection + ?Sized,
    {
        let config = self.config;
        let scaler = DimensionScaler::new(config.sizing());
        let resolver = StyleResolver::new(self.style);
        let mut builder = SceneBuilder::new();

        info!(mode:% = config.sizing().sizing_mode(); "Computing layered layout");

        let mut placed: Vec<PlacedBox> = Vec::new();
        let mut cursor = 0.0_f32;
        let mut after_spacer = false;

        for (index, layer) in model_layers(model)?.into_iter().enumerate() {
            let kind = model.kind(layer);
            if config.type_ignore().iter().any(|k| k == kind) || config.index_ignore().contains(&index) {
                trace!(index, kind; "Layer ignored");
                continue;
            }

            if let Some(offset) = model.spacer_offset(layer) {
                trace!(index, offset; "Spacer");
                cursor += offset;
                after_spacer = true;
                continue;
            }

            let placed_box = self.place(model, layer, cursor, &scaler, &resolver, wheel, &mut builder)?;
            cursor += placed_box.primitive.bounds().width() + config.spacing();

            placed.push(PlacedBox {
                starts_chain: after_spacer || placed.is_empty(),
                ..placed_box
            });
            after_spacer = false;
        }

        center_vertically(&mut placed);

        for (i, current) in placed.iter().enumerate() {
            if config.draw_funnel() && !current.starts_chain {
                if let Some(previous) = i.checked_sub(1).and_then(|p| placed.get(p)) {
                    for connector in funnel(&previous.primitive, &current.primitive) {
                        builder.push_connector(connector);
                    }
                }
            }
            builder.push_primitive(current.primitive.clone());
        }

        let padding = config.padding();
        if let Some(bounds) = builder.content_bounds() {
            builder.translate(Point::new(padding - bounds.min_x(), padding - bounds.min_y()));
        }

        if config.legend() {
            self.add_legend(&mut builder, &placed);
        }

        let size = match builder.content_bounds() {
            Some(bounds) => Size::new(bounds.max_x() + padding, bounds.max_y() + padding),
            None => Size::new(2.0 * padding, 2.0 * padding),
        };

        info!(boxes = placed.len(), width = size.width(), height = size.height(); "Layered layout computed");
        Ok(builder.build(size))
    }

    /// Scales one layer and places its box with the leading edge at `cursor`.
    #[allow(clippy::too_many_arguments)]
    fn place<M>(
        &self,
        model: &M,
        layer: LayerId,
        cursor: f32,
        scaler: &DimensionScaler<'_>,
        resolver: &StyleResolver<'_>,
        wheel: &mut ColorWheel,
        builder: &mut SceneBuilder,
    ) -> Result<PlacedBox, LayerscapeError>
    where
        M: ModelIntrospection + ?Sized,
    {
        let name = model.name(layer);
        let kind = model.kind(layer);

        let raw = resolve_output_shape(model, layer)?;
        let (shape, warnings) = normalize(&raw, name)?;
        for warning in warnings {
            builder.push_warning(warning);
        }

        let dims = scaler.scale(&shape, name)?;
        let style = resolver.layered(kind, wheel)?;
        builder.record_style(kind, style);

        let depth = if self.config.draw_volume() {
            dims.x() / 3.0
        } else {
            0.0
        };
        let x1 = cursor - depth / 2.0;
        let y1 = depth;
        let bounds = Bounds::new_from_top_left(Point::new(x1, y1), Size::new(dims.z(), dims.y()));

        debug!(layer = name, kind, x1, width = dims.z(), height = dims.y(), depth; "Box placed");

        Ok(PlacedBox {
            primitive: Primitive::new_box(
                bounds,
                depth,
                style.fill(),
                style.outline(),
                self.config.shade_step(),
            )
            .with_layer(layer),
            kind: kind.to_string(),
            shape,
            style,
            starts_chain: false,
        })
    }

    fn add_legend(&self, builder: &mut SceneBuilder, placed: &[PlacedBox]) {
        let config = self.config;
        let items: Vec<(String, ResolvedStyle)> = if config.show_dimension() {
            placed
                .iter()
                .map(|b| (dimension_label(&b.kind, &b.shape), b.style))
                .collect()
        } else {
            let mut kinds: Vec<(String, ResolvedStyle)> = Vec::new();
            for b in placed {
                if !kinds.iter().any(|(kind, _)| *kind == b.kind) {
                    kinds.push((b.kind.clone(), b.style));
                }
            }
            kinds
        };

        let top = builder
            .content_bounds()
            .map_or(config.padding(), |bounds| bounds.max_y() + config.legend_spacing());
        let entries = layout_legend(
            &items,
            Point::new(config.padding(), top),
            config.font_size(),
            config.legend_spacing(),
            self.metrics,
        );
        debug!(entries = entries.len(); "Legend placed");
        for entry in entries {
            builder.push_legend_entry(entry);
        }
    }
}

/// Centers every box on the tallest visual extent.
fn center_vertically(placed: &mut [PlacedBox]) {
    let visual_height = |b: &PlacedBox| b.primitive.bounds().height() + b.primitive.depth();
    let tallest = placed.iter().map(visual_height).fold(0.0_f32, f32::max);
    for b in placed.iter_mut() {
        let offset = (tallest - visual_height(b)) / 2.0;
        b.primitive.translate(Point::new(0.0, offset));
    }
}

/// The four funnel lines from `previous` to `current`, colored with the
/// outline of `current`.
///
/// Back-top and back-bottom corners join along the back faces, front-bottom
/// and front-top corners along the front faces.
fn funnel(previous: &Primitive, current: &Primitive) -> [Connector; 4] {
    let (p, pd) = (previous.bounds(), previous.depth());
    let (c, cd) = (current.bounds(), current.depth());
    let color = current.outline();
    let line = |from: Point, to: Point| Connector::new(from, to, color, FUNNEL_WIDTH);

    [
        line(
            Point::new(p.max_x() + pd, p.min_y() - pd),
            Point::new(c.min_x() + cd, c.min_y() - cd),
        ),
        line(
            Point::new(p.max_x() + pd, p.max_y() - pd),
            Point::new(c.min_x() + cd, c.max_y() - cd),
        ),
        line(
            Point::new(p.max_x(), p.max_y()),
            Point::new(c.min_x(), c.max_y()),
        ),
        line(
            Point::new(p.max_x(), p.min_y()),
            Point::new(c.min_x(), c.min_y()),
        ),
    ]
}

/// `Kind(d1xd2x...)` over the non-batch dimensions, unknown ones as `?`.
fn dimension_label(kind: &str, shape: &Shape) -> String {
    let dims: Vec<String> = shape
        .features()
        .iter()
        .map(|dim| dim.map_or_else(|| "?".to_string(), |d| d.to_string()))
        .collect();
    format!("{kind}({})", dims.join("x"))
}
