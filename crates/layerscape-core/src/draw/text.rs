//! Text measurement for legend labels.
//!
//! Layout never rasterizes text; label extents come from a [`TextMetrics`]
//! implementation.
//!
//! - [`FontMetrics`] - shapes the text with real fonts through `cosmic-text`
//! - [`ApproximateMetrics`] - fixed per-character advance, font independent
//!
//! # Examples
//!
//! ```
//! # use layerscape_core::draw::{FontMetrics, TextMetrics};
//! let size = FontMetrics::default().text_size("Conv2D", 12.0);
//! assert!(size.width() > 0.0);
//! assert!(size.height() > 0.0);
//! ```

use std::{
    borrow::Cow,
    sync::{Mutex, OnceLock, PoisonError},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::{debug, info};

use crate::geometry::Size;

/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Estimates the extent of rendered text.
pub trait TextMetrics {
    /// Returns the size of `text` set at `font_size` pixels
    fn text_size(&self, text: &str, font_size: f32) -> Size;
}

/// Fixed per-character advance of `0.6 * font_size`, one line high.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl TextMetrics for ApproximateMetrics {
    fn text_size(&self, text: &str, font_size: f32) -> Size {
        let chars = text.chars().count() as f32;
        Size::new(chars * 0.6 * font_size, font_size)
    }
}

/// Measures text by shaping it with `cosmic-text`.
///
/// All instances share one process-wide [`FontSystem`], created on first use.
/// When no font yields glyphs for the text the measurement falls back to
/// [`ApproximateMetrics`].
#[derive(Debug, Clone)]
pub struct FontMetrics {
    family: Cow<'static, str>,
}

impl FontMetrics {
    /// Creates metrics for the given CSS font family.
    pub fn new(family: impl Into<Cow<'static, str>>) -> Self {
        Self {
            family: family.into(),
        }
    }

    /// Metrics for the `sans-serif` family the SVG exporter writes legend
    /// labels in.
    pub const fn sans_serif() -> Self {
        Self {
            family: Cow::Borrowed("sans-serif"),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    fn attrs(&self) -> Attrs<'_> {
        let family = match self.family.as_ref() {
            "sans-serif" => Family::SansSerif,
            "serif" => Family::Serif,
            "monospace" => Family::Monospace,
            name => Family::Name(name),
        };
        Attrs::new().family(family)
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::sans_serif()
    }
}

impl TextMetrics for FontMetrics {
    fn text_size(&self, text: &str, font_size: f32) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        let mut font_system = font_system()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT_FACTOR);
        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        buffer.set_size(None, None);
        buffer.set_text(text, &self.attrs(), Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                width = width.max(last.x + last.w);
            }
            height += metrics.line_height;
        }

        if width <= 0.0 {
            debug!(text, family = self.family.as_ref(); "No glyphs shaped, approximating");
            return ApproximateMetrics.text_size(text, font_size);
        }
        Size::new(width, height)
    }
}

fn font_system() -> &'static Mutex<FontSystem> {
    static FONT_SYSTEM: OnceLock<Mutex<FontSystem>> = OnceLock::new();
    FONT_SYSTEM.get_or_init(|| {
        info!("Initializing FontSystem");
        Mutex::new(FontSystem::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_metrics() {
        let size = ApproximateMetrics.text_size("Dense", 10.0);
        assert_eq!(size, Size::new(30.0, 10.0));
    }

    #[test]
    fn test_font_metrics_empty_text() {
        assert_eq!(FontMetrics::default().text_size("", 12.0), Size::default());
    }

    #[test]
    fn test_font_metrics_measures_labels() {
        let metrics = FontMetrics::default();
        let short = metrics.text_size("Dense", 12.0);
        let long = metrics.text_size("Dense Dense Dense", 12.0);

        assert!(short.width() > 0.0);
        assert!(short.height() >= 12.0);
        assert!(long.width() > short.width());
    }

    #[test]
    fn test_font_metrics_scale_with_size() {
        let metrics = FontMetrics::default();
        let small = metrics.text_size("Conv2D", 10.0);
        let large = metrics.text_size("Conv2D", 20.0);
        assert!(large.width() > small.width());
        assert!(large.height() > small.height());
    }

    #[test]
    fn test_unknown_family_still_measures() {
        let metrics = FontMetrics::new("No Such Font Family");
        assert_eq!(metrics.family(), "No Such Font Family");
        assert!(metrics.text_size("Dense", 12.0).width() > 0.0);
    }
}
