//! Shape normalization.
//!
//! Models report output shapes in several forms: a flat tuple, one tuple per
//! output for multi-output layers, nothing at all, or occasionally something
//! that is not a shape. Everything downstream works on a single flat
//! [`Shape`], produced here.

use log::{debug, warn};

use layerscape_core::{
    draw::LayoutWarning,
    model::{Dim, LayerId, ModelIntrospection, RawShape, Shape},
};

use crate::error::LayerscapeError;

/// Reduces a raw shape value to a single flat [`Shape`].
///
/// - a flat tuple is returned as is;
/// - a collection of shapes keeps its first element, normalized recursively,
///   and reports [`LayoutWarning::MultiOutput`] if anything was dropped;
/// - a null value or an empty collection falls back to `(None, 1)` and
///   reports [`LayoutWarning::EmptyOrNullShape`].
///
/// Recovered conditions are logged and returned alongside the shape.
///
/// # Arguments
///
/// * `raw` - The shape value reported by the model.
/// * `layer` - Layer label used in warnings and errors.
///
/// # Errors
///
/// Returns [`LayerscapeError::UnsupportedShape`] for scalar or text values.
///
/// # Examples
///
/// ```
/// # use layerscape::shape::normalize;
/// # use layerscape::draw::LayoutWarning;
/// # use layerscape_core::model::RawShape;
/// let raw = RawShape::Multi(vec![
///     RawShape::Dims(vec![None, Some(197), Some(1024)]),
///     RawShape::Dims(vec![None, Some(16), None, None]),
/// ]);
///
/// let (shape, warnings) = normalize(&raw, "multi").unwrap();
/// assert_eq!(shape.dims(), &[None, Some(197), Some(1024)]);
/// assert!(matches!(warnings[0], LayoutWarning::MultiOutput { dropped: 1, .. }));
/// ```
pub fn normalize(raw: &RawShape, layer: &str) -> Result<(Shape, Vec<LayoutWarning>), LayerscapeError> {
    let mut warnings = Vec::new();
    let shape = normalize_into(raw, layer, &mut warnings)?;
    for warning in &warnings {
        warn!(layer; "{warning}");
    }
    Ok((shape, warnings))
}

fn normalize_into(
    raw: &RawShape,
    layer: &str,
    warnings: &mut Vec<LayoutWarning>,
) -> Result<Shape, LayerscapeError> {
    match raw {
        RawShape::Dims(dims) => Ok(Shape::new(dims.clone())),
        RawShape::Multi(shapes) => match shapes.split_first() {
            Some((primary, rest)) => {
                if !rest.is_empty() {
                    warnings.push(LayoutWarning::MultiOutput {
                        layer: layer.to_string(),
                        dropped: rest.len(),
                    });
                }
                normalize_into(primary, layer, warnings)
            }
            None => Ok(empty_or_null(layer, warnings)),
        },
        RawShape::Null => Ok(empty_or_null(layer, warnings)),
        RawShape::Scalar(_) | RawShape::Text(_) => {
            Err(LayerscapeError::unsupported_shape(layer, raw))
        }
    }
}

fn empty_or_null(layer: &str, warnings: &mut Vec<LayoutWarning>) -> Shape {
    warnings.push(LayoutWarning::EmptyOrNullShape {
        layer: layer.to_string(),
    });
    Shape::fallback()
}

/// Product of the concrete entries of `dims`.
///
/// Unknown entries are skipped; the result is 0 when no concrete entry
/// remains.
///
/// ```
/// # use layerscape::shape::element_count;
/// assert_eq!(element_count(&[Some(2), Some(3), Some(4)]), 24);
/// assert_eq!(element_count(&[None, Some(5)]), 5);
/// assert_eq!(element_count(&[None]), 0);
/// ```
pub fn element_count(dims: &[Dim]) -> u64 {
    let mut concrete = dims.iter().flatten().peekable();
    if concrete.peek().is_none() {
        return 0;
    }
    concrete.fold(1, |acc, dim| acc.saturating_mul(*dim))
}

/// Reads the output shape of `layer`.
///
/// The model's shape capabilities are tried in a fixed order: declared
/// output shape, output tensor shape, batch shape.
///
/// # Errors
///
/// Returns [`LayerscapeError::MissingShape`] if the model reports none of them.
pub fn resolve_output_shape<M>(model: &M, layer: LayerId) -> Result<RawShape, LayerscapeError>
where
    M: ModelIntrospection + ?Sized,
{
    let sources: [(&str, fn(&M, LayerId) -> Option<RawShape>); 3] = [
        ("output_shape", |m, l| m.output_shape(l)),
        ("output_tensor_shape", |m, l| m.output_tensor_shape(l)),
        ("batch_shape", |m, l| m.batch_shape(l)),
    ];

    for (source, read) in sources {
        if let Some(raw) = read(model, layer) {
            debug!(layer = model.name(layer), source; "Output shape found");
            return Ok(raw);
        }
    }

    Err(LayerscapeError::MissingShape {
        layer: model.name(layer).to_string(),
    })
}
