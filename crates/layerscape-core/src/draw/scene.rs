//! Positioned scene produced by the layout engines.

use std::fmt;

use thiserror::Error;

use crate::{
    color::Rgba,
    geometry::{Bounds, Point, Size},
    model::LayerId,
};

/// Kind tag of a [`Primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// A rectangle, drawn as a pseudo-3D block when it has depth
    Box,
    /// A single neuron
    Circle,
    /// Placeholder for elided neurons
    Ellipsis,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box => write!(f, "box"),
            Self::Circle => write!(f, "circle"),
            Self::Ellipsis => write!(f, "ellipsis"),
        }
    }
}

/// A positioned shape of the scene.
///
/// `bounds` is the front face. A box with a positive depth offset `de` also
/// has a back face shifted by `(+de, -de)`; the visible extent of the
/// primitive is therefore `x1..x2 + de` horizontally and `y1 - de..y2`
/// vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    kind: PrimitiveKind,
    bounds: Bounds,
    depth: f32,
    fill: Rgba,
    outline: Rgba,
    shade: u8,
    layer: Option<LayerId>,
}

impl Primitive {
    /// Creates a box primitive.
    ///
    /// # Arguments
    ///
    /// * `bounds` - Front face of the box
    /// * `depth` - Depth offset `de`; zero draws a flat rectangle
    /// * `fill` - Front face color
    /// * `outline` - Edge color
    /// * `shade` - Fade step applied to the top and side faces
    pub fn new_box(bounds: Bounds, depth: f32, fill: Rgba, outline: Rgba, shade: u8) -> Self {
        Self {
            kind: PrimitiveKind::Box,
            bounds,
            depth,
            fill,
            outline,
            shade,
            layer: None,
        }
    }

    /// Creates a neuron circle inscribed in `bounds`.
    pub fn circle(bounds: Bounds, fill: Rgba, outline: Rgba) -> Self {
        Self {
            kind: PrimitiveKind::Circle,
            bounds,
            depth: 0.0,
            fill,
            outline,
            shade: 0,
            layer: None,
        }
    }

    /// Creates an ellipsis placeholder occupying `bounds`.
    pub fn ellipsis(bounds: Bounds, fill: Rgba, outline: Rgba) -> Self {
        Self {
            kind: PrimitiveKind::Ellipsis,
            ..Self::circle(bounds, fill, outline)
        }
    }

    /// Tags the primitive with the layer it depicts.
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Returns the front face bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the depth offset `de`
    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn fill(&self) -> Rgba {
        self.fill
    }

    pub fn outline(&self) -> Rgba {
        self.outline
    }

    pub fn shade(&self) -> u8 {
        self.shade
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Returns the area covered by the front face together with the back face.
    pub fn visual_bounds(&self) -> Bounds {
        let b = self.bounds;
        Bounds::from_corners(b.min_x(), b.min_y() - self.depth, b.max_x() + self.depth, b.max_y())
    }

    /// Moves the primitive by `offset`.
    pub fn translate(&mut self, offset: Point) {
        self.bounds = self.bounds.translate(offset);
    }
}

/// A straight segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    from: Point,
    to: Point,
    color: Rgba,
    width: f32,
}

impl Connector {
    pub fn new(from: Point, to: Point, color: Rgba, width: f32) -> Self {
        Self {
            from,
            to,
            color,
            width,
        }
    }

    pub fn from(&self) -> Point {
        self.from
    }

    pub fn to(&self) -> Point {
        self.to
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn translate(&mut self, offset: Point) {
        self.from = self.from.add_point(offset);
        self.to = self.to.add_point(offset);
    }
}

/// A legend swatch with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    swatch: Bounds,
    label: String,
    label_bounds: Bounds,
    font_size: f32,
    fill: Rgba,
    outline: Rgba,
}

impl LegendEntry {
    /// Creates a legend entry.
    ///
    /// # Arguments
    ///
    /// * `swatch` - Bounds of the colored square
    /// * `label` - Label text
    /// * `label_bounds` - Estimated extent of the label text
    /// * `font_size` - Label font size
    /// * `fill` - Swatch fill color
    /// * `outline` - Swatch outline color
    pub fn new(
        swatch: Bounds,
        label: impl Into<String>,
        label_bounds: Bounds,
        font_size: f32,
        fill: Rgba,
        outline: Rgba,
    ) -> Self {
        Self {
            swatch,
            label: label.into(),
            label_bounds,
            font_size,
            fill,
            outline,
        }
    }

    pub fn swatch(&self) -> Bounds {
        self.swatch
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn label_bounds(&self) -> Bounds {
        self.label_bounds
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn fill(&self) -> Rgba {
        self.fill
    }

    pub fn outline(&self) -> Rgba {
        self.outline
    }

    /// Returns the area covered by the swatch and the label together
    pub fn bounds(&self) -> Bounds {
        self.swatch.merge(&self.label_bounds)
    }

    pub fn translate(&mut self, offset: Point) {
        self.swatch = self.swatch.translate(offset);
        self.label_bounds = self.label_bounds.translate(offset);
    }
}

/// Fill and outline resolved for a layer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStyle {
    fill: Rgba,
    outline: Rgba,
}

impl ResolvedStyle {
    pub fn new(fill: Rgba, outline: Rgba) -> Self {
        Self { fill, outline }
    }

    pub fn fill(&self) -> Rgba {
        self.fill
    }

    pub fn outline(&self) -> Rgba {
        self.outline
    }
}

/// Conditions the layout recovered from while building a scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutWarning {
    #[error("layer `{layer}` has multiple outputs; drawing the first and dropping {dropped}")]
    MultiOutput { layer: String, dropped: usize },

    #[error("layer `{layer}` reports an empty or null shape; drawing it as (None, 1)")]
    EmptyOrNullShape { layer: String },
}

/// A fully positioned diagram.
///
/// Built once per layout call through [`SceneBuilder`] and read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    connectors: Vec<Connector>,
    legend: Vec<LegendEntry>,
    size: Size,
    color_assignments: Vec<(String, ResolvedStyle)>,
    warnings: Vec<LayoutWarning>,
}

impl Scene {
    /// Returns the primitives in drawing order
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    /// Returns the canvas size
    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the style resolved per layer kind, in first-seen order
    pub fn color_assignments(&self) -> &[(String, ResolvedStyle)] {
        &self.color_assignments
    }

    /// Looks up the style resolved for `kind`
    pub fn style_of(&self, kind: &str) -> Option<ResolvedStyle> {
        self.color_assignments
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, style)| *style)
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }
}

/// Incrementally assembles a [`Scene`].
#[derive(Debug, Default)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_primitive(&mut self, primitive: Primitive) {
        self.scene.primitives.push(primitive);
    }

    pub fn push_connector(&mut self, connector: Connector) {
        self.scene.connectors.push(connector);
    }

    pub fn push_legend_entry(&mut self, entry: LegendEntry) {
        self.scene.legend.push(entry);
    }

    pub fn push_warning(&mut self, warning: LayoutWarning) {
        self.scene.warnings.push(warning);
    }

    /// Records the style used for `kind`; only the first record per kind is kept.
    pub fn record_style(&mut self, kind: &str, style: ResolvedStyle) {
        if self.scene.style_of(kind).is_none() {
            self.scene.color_assignments.push((kind.to_string(), style));
        }
    }

    /// Returns the primitives pushed so far
    pub fn primitives(&self) -> &[Primitive] {
        &self.scene.primitives
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.scene.legend
    }

    /// Returns the smallest bounds covering every primitive, connector and
    /// legend entry pushed so far, or `None` for an empty scene.
    pub fn content_bounds(&self) -> Option<Bounds> {
        let primitives = self.scene.primitives.iter().map(Primitive::visual_bounds);
        let connectors = self
            .scene
            .connectors
            .iter()
            .map(|c| Bounds::from_corners(c.from.x(), c.from.y(), c.to.x(), c.to.y()));
        let legend = self.scene.legend.iter().map(LegendEntry::bounds);

        primitives
            .chain(connectors)
            .chain(legend)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Moves every element of the scene by `offset`.
    pub fn translate(&mut self, offset: Point) {
        for primitive in &mut self.scene.primitives {
            primitive.translate(offset);
        }
        for connector in &mut self.scene.connectors {
            connector.translate(offset);
        }
        for entry in &mut self.scene.legend {
            entry.translate(offset);
        }
    }

    /// Finishes the scene with the given canvas size.
    pub fn build(mut self, size: Size) -> Scene {
        self.scene.size = size;
        self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_box(x: f32, depth: f32) -> Primitive {
        Primitive::new_box(
            Bounds::from_corners(x, 10.0, x + 20.0, 50.0),
            depth,
            Rgba::ORANGE,
            Rgba::BLACK,
            10,
        )
    }

    #[test]
    fn test_visual_bounds_include_depth() {
        let primitive = sample_box(0.0, 5.0);
        let visual = primitive.visual_bounds();
        assert_eq!(visual.min_y(), 5.0);
        assert_eq!(visual.max_x(), 25.0);
        assert_eq!(visual.max_y(), 50.0);
    }

    #[test]
    fn test_ellipsis_has_no_depth() {
        let bounds = Bounds::from_corners(0.0, 0.0, 10.0, 10.0);
        let ellipsis = Primitive::ellipsis(bounds, Rgba::ORANGE, Rgba::BLACK);
        assert_eq!(ellipsis.kind(), PrimitiveKind::Ellipsis);
        assert_eq!(ellipsis.depth(), 0.0);
        assert_eq!(ellipsis.visual_bounds(), bounds);
    }

    #[test]
    fn test_builder_translate_and_bounds() {
        let mut builder = SceneBuilder::new();
        assert!(builder.content_bounds().is_none());

        builder.push_primitive(sample_box(0.0, 0.0));
        builder.push_connector(Connector::new(
            Point::new(20.0, 30.0),
            Point::new(40.0, 30.0),
            Rgba::GRAY,
            1.0,
        ));
        builder.translate(Point::new(5.0, 5.0));

        let bounds = builder.content_bounds().unwrap();
        assert_eq!(bounds.min_x(), 5.0);
        assert_eq!(bounds.max_x(), 45.0);
        assert_eq!(bounds.min_y(), 15.0);
    }

    #[test]
    fn test_record_style_keeps_first() {
        let mut builder = SceneBuilder::new();
        builder.record_style("Dense", ResolvedStyle::new(Rgba::ORANGE, Rgba::BLACK));
        builder.record_style("Dense", ResolvedStyle::new(Rgba::WHITE, Rgba::BLACK));
        builder.record_style("Conv2D", ResolvedStyle::new(Rgba::GRAY, Rgba::BLACK));

        let scene = builder.build(Size::new(10.0, 10.0));
        assert_eq!(scene.color_assignments().len(), 2);
        assert_eq!(scene.style_of("Dense").map(|s| s.fill()), Some(Rgba::ORANGE));
        assert_eq!(scene.size(), Size::new(10.0, 10.0));
    }

    #[test]
    fn test_warning_messages() {
        let warning = LayoutWarning::MultiOutput {
            layer: "split".to_string(),
            dropped: 2,
        };
        assert!(warning.to_string().contains("split"));
        assert!(warning.to_string().contains('2'));
    }
}
