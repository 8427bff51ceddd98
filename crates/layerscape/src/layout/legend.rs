//! Legend row placed below a layered diagram.

use layerscape_core::{
    draw::{LegendEntry, ResolvedStyle, TextMetrics},
    geometry::{Bounds, Point, Size},
};

/// Places legend entries in a single row starting at `origin`.
///
/// Each entry is a square swatch of side `font_size` followed by its label,
/// half a font size to the right. Consecutive entries are `spacing` apart.
pub(crate) fn layout_legend(
    items: &[(String, ResolvedStyle)],
    origin: Point,
    font_size: f32,
    spacing: f32,
    metrics: &dyn TextMetrics,
) -> Vec<LegendEntry> {
    let mut x = origin.x();
    let mut entries = Vec::with_capacity(items.len());

    for (label, style) in items {
        let swatch = Bounds::new_from_top_left(
            Point::new(x, origin.y()),
            Size::new(font_size, font_size),
        );
        let text = metrics.text_size(label, font_size);
        let label_top = origin.y() + (font_size - text.height()) / 2.0;
        let label_bounds = Bounds::new_from_top_left(
            Point::new(swatch.max_x() + font_size / 2.0, label_top),
            text,
        );

        let entry = LegendEntry::new(
            swatch,
            label.clone(),
            label_bounds,
            font_size,
            style.fill(),
            style.outline(),
        );
        x = entry.bounds().max_x() + spacing;
        entries.push(entry);
    }

    entries
}
