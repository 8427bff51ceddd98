//! Fill and outline resolution per layer kind.

use layerscape_core::{
    color::{ColorWheel, Rgba},
    draw::ResolvedStyle,
};

use crate::{config::StyleConfig, error::LayerscapeError};

/// Looks up layer colors in the configured color map.
///
/// The color map is never modified; every resolved style is handed back to
/// the caller instead.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StyleResolver<'a> {
    style: &'a StyleConfig,
}

impl<'a> StyleResolver<'a> {
    pub(crate) fn new(style: &'a StyleConfig) -> Self {
        Self { style }
    }

    /// Style of a layered-view box: mapped fill or the next wheel color,
    /// mapped outline or black.
    ///
    /// The wheel is only consulted for kinds without a mapped fill, so mapped
    /// kinds do not use up palette colors.
    pub(crate) fn layered(
        &self,
        kind: &str,
        wheel: &mut ColorWheel,
    ) -> Result<ResolvedStyle, LayerscapeError> {
        let (fill, outline) = self.mapped(kind)?;
        Ok(ResolvedStyle::new(
            fill.unwrap_or_else(|| wheel.get_color(kind)),
            outline.unwrap_or(Rgba::BLACK),
        ))
    }

    /// Style of a graph-view node: mapped fill or orange, mapped outline or black.
    pub(crate) fn graph(&self, kind: &str) -> Result<ResolvedStyle, LayerscapeError> {
        let (fill, outline) = self.mapped(kind)?;
        Ok(ResolvedStyle::new(
            fill.unwrap_or(Rgba::ORANGE),
            outline.unwrap_or(Rgba::BLACK),
        ))
    }

    fn mapped(&self, kind: &str) -> Result<(Option<Rgba>, Option<Rgba>), LayerscapeError> {
        match self.style.kind_style(kind) {
            Some(kind_style) => Ok((kind_style.fill()?, kind_style.outline()?)),
            None => Ok((None, None)),
        }
    }
}
