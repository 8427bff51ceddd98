//! Mapping of tensor shapes to pixel box extents.
//!
//! A normalized shape `(batch, d1, ..., dk)` becomes a box with a horizontal
//! extent `x`, a vertical extent `y` and a depth `z`. In the layered view the
//! depth runs along the drawing direction, so `z` is the on-screen width of a
//! box and `y` its height.

use log::trace;

use layerscape_core::model::{Dim, Shape};

use crate::{
    config::{OneDimAxis, SizingConfig, SizingMode},
    error::LayerscapeError,
};

/// Pixel extents of a layer box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDimensions {
    x: f32,
    y: f32,
    z: f32,
}

impl BoxDimensions {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }
}

/// Upper-bound category of an axis in [`SizingMode::Capped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapCategory {
    Channels,
    Sequence,
    General,
}

/// Scales shapes according to a [`SizingConfig`].
///
/// # Examples
///
/// ```
/// # use layerscape::config::{OneDimAxis, SizingConfig};
/// # use layerscape::layout::DimensionScaler;
/// # use layerscape_core::model::Shape;
/// let sizing = SizingConfig::default()
///     .with_scale(2.0, 3.0)
///     .with_min(1.0, 1.0)
///     .with_max(30.0, 30.0);
/// let scaler = DimensionScaler::new(&sizing);
///
/// let dims = scaler.scale(&Shape::new(vec![None, Some(4), Some(5)]), "conv").unwrap();
/// assert_eq!((dims.x(), dims.y(), dims.z()), (12.0, 15.0, 10.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DimensionScaler<'a> {
    sizing: &'a SizingConfig,
}

impl<'a> DimensionScaler<'a> {
    pub fn new(sizing: &'a SizingConfig) -> Self {
        Self { sizing }
    }

    /// Computes the box extents of `shape`.
    ///
    /// The batch entry is dropped. With one remaining dimension it goes to the
    /// configured axis and the other axes take their minimum. With two, `x` and
    /// `y` come from `d1` and `d2` and the depth repeats `d2`. With three or
    /// more the depth is the product of everything after `d2`. Unknown
    /// dimensions count as 0 and land on the minimum.
    ///
    /// # Arguments
    ///
    /// * `shape` - Normalized shape including the batch entry.
    /// * `layer` - Layer label used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`LayerscapeError::UnsupportedShape`] for a shape without any
    /// entry.
    pub fn scale(&self, shape: &Shape, layer: &str) -> Result<BoxDimensions, LayerscapeError> {
        if shape.is_empty() {
            return Err(LayerscapeError::unsupported_shape(layer, shape));
        }

        let s = self.sizing;
        let dims = shape.features();
        let min = BoxDimensions::new(s.min_xy(), s.min_xy(), s.min_z());

        let result = match dims {
            [] => min,
            [d1] => {
                let d1 = known(*d1);
                match s.one_dim_orientation() {
                    OneDimAxis::X => BoxDimensions {
                        x: self.spatial(d1, CapCategory::General),
                        ..min
                    },
                    OneDimAxis::Y => BoxDimensions {
                        y: self.spatial(d1, CapCategory::General),
                        ..min
                    },
                    OneDimAxis::Z => BoxDimensions {
                        z: self.depth(d1),
                        ..min
                    },
                }
            }
            [d1, d2] => BoxDimensions::new(
                self.spatial(known(*d1), CapCategory::Sequence),
                self.spatial(known(*d2), CapCategory::Sequence),
                self.depth(known(*d2)),
            ),
            [d1, d2, rest @ ..] => BoxDimensions::new(
                self.spatial(known(*d1), CapCategory::General),
                self.spatial(known(*d2), CapCategory::General),
                self.depth(depth_product(rest)),
            ),
        };

        trace!(
            layer,
            shape:% = shape,
            mode:% = s.sizing_mode(),
            x = result.x,
            y = result.y,
            z = result.z;
            "Scaled layer"
        );
        Ok(result)
    }

    fn spatial(&self, dim: f64, category: CapCategory) -> f32 {
        let s = self.sizing;
        self.extent(dim, s.scale_xy(), s.min_xy(), s.max_xy(), category)
    }

    fn depth(&self, dim: f64) -> f32 {
        let s = self.sizing;
        self.extent(dim, s.scale_z(), s.min_z(), s.max_z(), CapCategory::Channels)
    }

    fn extent(&self, dim: f64, scale: f32, min: f32, max: f32, category: CapCategory) -> f32 {
        let scale = f64::from(scale);
        let (value, max) = match self.sizing.sizing_mode() {
            SizingMode::Accurate => (dim * scale, max),
            SizingMode::Capped => (dim * scale, self.cap(category).unwrap_or(max)),
            SizingMode::Balanced => (balanced(dim, scale), max),
            SizingMode::Logarithmic => {
                if dim <= 1.0 {
                    return min;
                }
                (dim.log10() * scale * 20.0, max)
            }
            SizingMode::Relative => (dim * f64::from(self.sizing.relative_base_size()), max),
        };
        clamp(value as f32, min, max)
    }

    fn cap(&self, category: CapCategory) -> Option<f32> {
        let caps = self.sizing.dimension_caps();
        match category {
            CapCategory::Channels => caps.channels(),
            CapCategory::Sequence => caps.sequence(),
            CapCategory::General => caps.general(),
        }
    }
}

/// `min(max(value, min), max)`: the upper bound wins when the bounds cross.
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

fn known(dim: Dim) -> f64 {
    dim.map_or(0.0, |d| d as f64)
}

fn depth_product(dims: &[Dim]) -> f64 {
    dims.iter().map(|d| known(*d)).product()
}

/// Piecewise linear growth, continuous up to 2048 and logarithmic above.
fn balanced(dim: f64, scale: f64) -> f64 {
    const KNEES: [(f64, f64); 3] = [(64.0, 1.0), (512.0, 0.6), (2048.0, 0.3)];

    if dim > 2048.0 {
        return dim.log10() * scale * 15.0;
    }

    let mut value = 0.0;
    let mut start = 0.0;
    for (end, rate) in KNEES {
        if dim <= start {
            break;
        }
        value += (dim.min(end) - start) * rate;
        start = end;
    }
    value * scale
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use crate::config::DimensionCaps;

    use super::*;

    fn shape(dims: &[Option<u64>]) -> Shape {
        Shape::new(dims.to_vec())
    }

    fn xyz(dims: BoxDimensions) -> (f32, f32, f32) {
        (dims.x(), dims.y(), dims.z())
    }

    #[test]
    fn test_one_dim_y() {
        let sizing = SizingConfig::default()
            .with_scale(0.5, 1.0)
            .with_max(100.0, 100.0)
            .with_min(1.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::Y);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(10)]), "d").unwrap();
        assert_eq!(xyz(dims), (1.0, 10.0, 1.0));
    }

    #[test]
    fn test_one_dim_z_clamped_to_max() {
        let sizing = SizingConfig::default()
            .with_scale(0.5, 1.0)
            .with_max(5.0, 100.0)
            .with_min(2.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::Z);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(20)]), "d").unwrap();
        assert_eq!(xyz(dims), (1.0, 1.0, 5.0));
    }

    #[test]
    fn test_one_dim_x() {
        let sizing = SizingConfig::default()
            .with_scale(1.0, 2.0)
            .with_min(1.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::X);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(10)]), "d").unwrap();
        assert_eq!(xyz(dims), (20.0, 1.0, 1.0));
    }

    #[test]
    fn test_two_dims_depth_repeats_second() {
        let sizing = SizingConfig::default()
            .with_scale(2.0, 3.0)
            .with_max(30.0, 30.0)
            .with_min(1.0, 1.0);
        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, Some(4), Some(5)]), "d")
            .unwrap();
        assert_eq!(xyz(dims), (12.0, 15.0, 10.0));
    }

    #[test]
    fn test_three_dims() {
        let sizing = SizingConfig::default()
            .with_scale(1.0, 1.0)
            .with_max(100.0, 100.0)
            .with_min(1.0, 1.0);
        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, Some(2), Some(3), Some(4)]), "d")
            .unwrap();
        assert_eq!(xyz(dims), (2.0, 3.0, 4.0));

        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, Some(2), Some(3), Some(4), Some(5)]), "d")
            .unwrap();
        assert_eq!(dims.z(), 20.0);
    }

    #[test]
    fn test_capped() {
        let sizing = SizingConfig::default()
            .with_scale(10.0, 10.0)
            .with_max(999.0, 999.0)
            .with_min(1.0, 1.0)
            .with_sizing_mode(SizingMode::Capped)
            .with_dimension_caps(DimensionCaps::new(Some(50.0), Some(15.0), None));
        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, Some(10), Some(20)]), "d")
            .unwrap();
        assert_eq!(xyz(dims), (15.0, 15.0, 50.0));
    }

    #[test]
    fn test_capped_general_category_falls_back_to_max() {
        let sizing = SizingConfig::default()
            .with_scale(10.0, 10.0)
            .with_max(999.0, 300.0)
            .with_min(1.0, 1.0)
            .with_sizing_mode(SizingMode::Capped)
            .with_dimension_caps(DimensionCaps::new(None, Some(15.0), None));
        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, Some(100), Some(20), Some(3)]), "d")
            .unwrap();
        assert_eq!(xyz(dims), (300.0, 200.0, 30.0));
    }

    #[test]
    fn test_logarithmic_small_dimension() {
        let sizing = SizingConfig::default()
            .with_scale(1.0, 1.0)
            .with_max(10.0, 10.0)
            .with_min(2.0, 2.0)
            .with_one_dim_orientation(OneDimAxis::Y)
            .with_sizing_mode(SizingMode::Logarithmic);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(1)]), "d").unwrap();
        assert_eq!(xyz(dims), (2.0, 2.0, 2.0));
    }

    #[test]
    fn test_logarithmic_growth() {
        let sizing = SizingConfig::default()
            .with_scale(1.0, 1.0)
            .with_min(1.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::Y)
            .with_sizing_mode(SizingMode::Logarithmic);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(1000)]), "d").unwrap();
        assert!(approx_eq!(f32, dims.y(), 60.0, epsilon = 0.001));
    }

    #[test]
    fn test_balanced_shrinks_large_dimensions() {
        let base = SizingConfig::default()
            .with_scale(1.0, 1.0)
            .with_max(2000.0, 2000.0)
            .with_min(1.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::Y);
        let balanced = base.with_sizing_mode(SizingMode::Balanced);
        let input = shape(&[None, Some(1024), Some(512)]);

        let accurate = DimensionScaler::new(&base).scale(&input, "d").unwrap();
        let reduced = DimensionScaler::new(&balanced).scale(&input, "d").unwrap();
        assert!(reduced.x() < accurate.x());
        assert!(reduced.y() < accurate.y());
    }

    #[test]
    fn test_balanced_piecewise_values() {
        assert!(approx_eq!(f64, balanced(32.0, 1.0), 32.0));
        assert!(approx_eq!(f64, balanced(64.0, 1.0), 64.0));
        assert!(approx_eq!(f64, balanced(512.0, 1.0), 332.8, epsilon = 1e-9));
        assert!(approx_eq!(f64, balanced(2048.0, 1.0), 793.6, epsilon = 1e-9));
        assert!(approx_eq!(f64, balanced(10000.0, 2.0), 120.0, epsilon = 1e-9));
    }

    #[test]
    fn test_relative() {
        let sizing = SizingConfig::default()
            .with_min(1.0, 1.0)
            .with_one_dim_orientation(OneDimAxis::Y)
            .with_sizing_mode(SizingMode::Relative)
            .with_relative_base_size(3.0);
        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None, Some(10)]), "d").unwrap();
        assert_eq!(dims.y(), 30.0);
    }

    #[test]
    fn test_unknown_dims_land_on_minimum() {
        let sizing = SizingConfig::default();
        let dims = DimensionScaler::new(&sizing)
            .scale(&shape(&[None, None, None, None]), "d")
            .unwrap();
        assert_eq!(xyz(dims), (20.0, 20.0, 20.0));

        let dims = DimensionScaler::new(&sizing).scale(&shape(&[None]), "d").unwrap();
        assert_eq!(xyz(dims), (20.0, 20.0, 20.0));
    }

    #[test]
    fn test_rank_zero_shape_is_unsupported() {
        let sizing = SizingConfig::default();
        assert!(matches!(
            DimensionScaler::new(&sizing).scale(&Shape::default(), "empty"),
            Err(LayerscapeError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_crossed_bounds_take_the_maximum() {
        assert_eq!(clamp(5.0, 10.0, 8.0), 8.0);
    }
}
