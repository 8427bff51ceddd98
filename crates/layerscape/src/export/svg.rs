//! SVG rendering of scenes.
//!
//! Every scene element goes to a [`RenderLayer`]: the background rectangle at
//! the bottom, connectors and funnels above it, layer shapes above those and
//! the legend on top. Each non-empty layer becomes one `<g data-layer="...">`
//! group.

use std::io::Write;

use log::{debug, error, info};
use svg::{Document, node::element as svg_element};

use layerscape_core::{
    color::Rgba,
    draw::{Connector, LayeredOutput, LegendEntry, Primitive, PrimitiveKind, RenderLayer, Scene},
    geometry::{Bounds, Point},
};

use super::{Error, Exporter};

/// Stroke width of shape outlines.
const OUTLINE_WIDTH: f32 = 1.0;

/// Builder for [`Svg`] exporters.
///
/// # Examples
///
/// ```
/// # use layerscape::export::{Exporter, svg::SvgBuilder};
/// # use layerscape_core::{color::Rgba, draw::SceneBuilder, geometry::Size};
/// let scene = SceneBuilder::new().build(Size::new(40.0, 20.0));
///
/// let mut exporter = SvgBuilder::new(Vec::new())
///     .with_background(Rgba::WHITE)
///     .build();
/// exporter.export_scene(&scene).unwrap();
///
/// let document = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(document.contains(r#"data-layer="background""#));
/// ```
pub struct SvgBuilder<W: Write> {
    writer: W,
    background: Rgba,
}

impl<W: Write> SvgBuilder<W> {
    /// Creates a builder writing the document to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            background: Rgba::WHITE,
        }
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    pub fn build(self) -> Svg<W> {
        Svg {
            writer: self.writer,
            background: self.background,
        }
    }
}

/// SVG exporter writing one document per exported scene.
pub struct Svg<W: Write> {
    writer: W,
    background: Rgba,
}

impl<W: Write> Svg<W> {
    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Renders `scene` to an SVG document sized to its canvas.
    pub fn render_scene(&self, scene: &Scene) -> Document {
        let size = scene.size();
        let mut output = LayeredOutput::new();

        output.add_to_layer(
            RenderLayer::Background,
            Box::new(fill_and_stroke(
                svg_element::Rectangle::new()
                    .set("x", 0.0)
                    .set("y", 0.0)
                    .set("width", size.width())
                    .set("height", size.height()),
                self.background,
                None,
            )),
        );

        for connector in scene.connectors() {
            output.add_to_layer(RenderLayer::Connector, Box::new(render_connector(connector)));
        }

        for primitive in scene.primitives() {
            output.merge(render_primitive(primitive));
        }

        for entry in scene.legend() {
            output.merge(render_legend_entry(entry));
        }

        let doc = Document::new()
            .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
            .set("width", size.width())
            .set("height", size.height());

        output.render().into_iter().fold(doc, |doc, group| doc.add(group))
    }

    fn write_document(&mut self, doc: &Document) -> Result<(), Error> {
        if let Err(err) = write!(self.writer, "{doc}") {
            error!(err:err; "Failed to write SVG content");
            return Err(Error::Io(err));
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Exporter for Svg<W> {
    fn export_scene(&mut self, scene: &Scene) -> Result<(), Error> {
        let doc = self.render_scene(scene);
        debug!(
            primitives = scene.primitives().len(),
            connectors = scene.connectors().len(),
            legend = scene.legend().len();
            "SVG document rendered"
        );
        self.write_document(&doc)?;
        info!("SVG written");
        Ok(())
    }
}

/// Renders a scene straight to an SVG string.
///
/// # Errors
///
/// Returns [`Error::Render`] if the document is not valid UTF-8.
pub fn render_to_string(scene: &Scene, background: Rgba) -> Result<String, Error> {
    let mut exporter = SvgBuilder::new(Vec::new()).with_background(background).build();
    exporter.export_scene(scene)?;
    String::from_utf8(exporter.into_inner()).map_err(|err| Error::Render(err.to_string()))
}

/// Sets the fill of `node` and, when given, its stroke.
fn fill_and_stroke<T>(node: T, fill: Rgba, stroke: Option<Rgba>) -> T
where
    T: svg::Node,
{
    let mut node = node;
    node.assign("fill", fill);
    node.assign("fill-opacity", fill.opacity());
    if let Some(stroke) = stroke {
        node.assign("stroke", stroke);
        node.assign("stroke-opacity", stroke.opacity());
        node.assign("stroke-width", OUTLINE_WIDTH);
    }
    node
}

fn render_connector(connector: &Connector) -> svg_element::Line {
    let color = connector.color();
    svg_element::Line::new()
        .set("x1", connector.from().x())
        .set("y1", connector.from().y())
        .set("x2", connector.to().x())
        .set("y2", connector.to().y())
        .set("stroke", color)
        .set("stroke-opacity", color.opacity())
        .set("stroke-width", connector.width())
}

fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn rectangle(bounds: Bounds) -> svg_element::Rectangle {
    svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
}

fn ellipse(bounds: Bounds) -> svg_element::Ellipse {
    let center = bounds.center();
    svg_element::Ellipse::new()
        .set("cx", center.x())
        .set("cy", center.y())
        .set("rx", bounds.width() / 2.0)
        .set("ry", bounds.height() / 2.0)
}

fn render_primitive(primitive: &Primitive) -> LayeredOutput {
    let mut output = LayeredOutput::new();
    let bounds = primitive.bounds();
    let (fill, outline) = (primitive.fill(), primitive.outline());

    match primitive.kind() {
        PrimitiveKind::Box => {
            output.add_to_layer(
                RenderLayer::Shape,
                Box::new(fill_and_stroke(rectangle(bounds), fill, Some(outline))),
            );

            let de = primitive.depth();
            if de > 0.0 {
                let (x1, y1, x2, y2) = (bounds.min_x(), bounds.min_y(), bounds.max_x(), bounds.max_y());
                let top = [
                    Point::new(x1, y1),
                    Point::new(x1 + de, y1 - de),
                    Point::new(x2 + de, y1 - de),
                    Point::new(x2, y1),
                ];
                let side = [
                    Point::new(x2, y1),
                    Point::new(x2 + de, y1 - de),
                    Point::new(x2 + de, y2 - de),
                    Point::new(x2, y2),
                ];
                let shade = primitive.shade();
                for (face, face_fill) in [
                    (top, fill.fade(shade)),
                    (side, fill.fade(shade.saturating_mul(2))),
                ] {
                    let polygon = svg_element::Polygon::new().set("points", polygon_points(&face));
                    output.add_to_layer(
                        RenderLayer::Shape,
                        Box::new(fill_and_stroke(polygon, face_fill, Some(outline))),
                    );
                }
            }
        }
        PrimitiveKind::Circle => {
            output.add_to_layer(
                RenderLayer::Shape,
                Box::new(fill_and_stroke(ellipse(bounds), fill, Some(outline))),
            );
        }
        PrimitiveKind::Ellipsis => {
            let width = bounds.width();
            let d = width / 7.0;
            let x1 = bounds.min_x() + (width - d) / 2.0;
            let mut dots = svg_element::Group::new();
            for step in [1.0, 3.0, 5.0] {
                let dot = Bounds::from_corners(x1, bounds.min_y() + step * d, x1 + d, bounds.min_y() + (step + 1.0) * d);
                dots = dots.add(fill_and_stroke(ellipse(dot), fill, Some(outline)));
            }
            output.add_to_layer(RenderLayer::Shape, Box::new(dots));
        }
    }

    output
}

fn render_legend_entry(entry: &LegendEntry) -> LayeredOutput {
    let mut output = LayeredOutput::new();
    output.add_to_layer(
        RenderLayer::Legend,
        Box::new(fill_and_stroke(rectangle(entry.swatch()), entry.fill(), Some(entry.outline()))),
    );

    let label = entry.label_bounds();
    let text = svg_element::Text::new(entry.label())
        .set("x", label.min_x())
        .set("y", label.center().y())
        .set("dominant-baseline", "middle")
        .set("font-family", "sans-serif")
        .set("font-size", entry.font_size())
        .set("fill", Rgba::BLACK);
    output.add_to_layer(RenderLayer::Legend, Box::new(text));
    output
}
