//! Read-only view over a host neural-network model.
//!
//! Layout never owns or mutates the model it draws. Instead the host model is
//! wrapped by an adapter implementing [`ModelIntrospection`], which reports
//! layers as opaque [`LayerId`] handles together with their names, kinds,
//! tensor shapes and connectivity.
//!
//! Hosts differ in how much bookkeeping they expose. Every capability beyond
//! the layer name and kind is optional and defaults to "absent"; the layout
//! engine tries the alternatives in a fixed order and reports a typed error
//! when none of them is available.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Opaque handle of a layer, assigned by the model adapter.
///
/// Two layers are the same layer only if their handles are equal. Names are
/// labels and may collide across nested sub-models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(usize);

impl LayerId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index of this handle
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single tensor dimension; `None` is an unknown extent such as the batch size.
pub type Dim = Option<u64>;

/// A normalized tensor shape `(batch, d1, ..., dk)`.
///
/// The first entry is the batch dimension and never contributes to geometry.
///
/// # Examples
///
/// ```
/// # use layerscape_core::model::Shape;
/// let shape = Shape::new(vec![None, Some(28), Some(28), Some(3)]);
/// assert_eq!(shape.features(), &[Some(28), Some(28), Some(3)]);
/// assert_eq!(shape.to_string(), "(?, 28, 28, 3)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    /// The shape substituted for absent or empty shape values: `(None, 1)`.
    pub fn fallback() -> Self {
        Self::new(vec![None, Some(1)])
    }

    /// Returns every entry including the batch dimension
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Returns the entries after the batch dimension
    pub fn features(&self) -> &[Dim] {
        self.dims.get(1..).unwrap_or(&[])
    }

    /// Number of entries including the batch dimension
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

impl From<Vec<Dim>> for Shape {
    fn from(dims: Vec<Dim>) -> Self {
        Self::new(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match dim {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "?")?,
            }
        }
        write!(f, ")")
    }
}

/// A shape value exactly as a model reports it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawShape {
    /// No shape reported
    Null,
    /// A flat tuple of dimensions
    Dims(Vec<Dim>),
    /// One shape per output of a multi-output layer
    Multi(Vec<RawShape>),
    /// An integer where a tuple was expected
    Scalar(i64),
    /// Text where a tuple was expected
    Text(String),
}

impl fmt::Display for RawShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Dims(dims) => write!(f, "{}", Shape::new(dims.clone())),
            Self::Multi(shapes) => {
                write!(f, "[")?;
                for (i, shape) in shapes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{shape}")?;
                }
                write!(f, "]")
            }
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawShapeRepr {
    Null,
    Dims(Vec<Dim>),
    Multi(Vec<RawShapeRepr>),
    Scalar(i64),
    Text(String),
}

impl From<RawShapeRepr> for RawShape {
    fn from(repr: RawShapeRepr) -> Self {
        match repr {
            RawShapeRepr::Null => Self::Null,
            // `[]` reads as an empty list of outputs, not a rank-0 tuple
            RawShapeRepr::Dims(dims) if dims.is_empty() => Self::Multi(Vec::new()),
            RawShapeRepr::Dims(dims) => Self::Dims(dims),
            RawShapeRepr::Multi(shapes) => Self::Multi(shapes.into_iter().map(Self::from).collect()),
            RawShapeRepr::Scalar(value) => Self::Scalar(value),
            RawShapeRepr::Text(value) => Self::Text(value),
        }
    }
}

impl<'de> Deserialize<'de> for RawShape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawShapeRepr::deserialize(deserializer).map(Self::from)
    }
}

/// Either a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(values) => values.iter(),
        }
    }
}

/// One inbound connection record of a layer.
///
/// Older bookkeeping stores the producing layers under `inbound_layers`,
/// either as a single layer or as a list. Newer bookkeeping stores parent
/// nodes instead. A record normally carries exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboundNode {
    inbound_layers: Option<OneOrMany<LayerId>>,
    parent_nodes: Option<Vec<LayerId>>,
}

impl InboundNode {
    /// Creates a record in the older `inbound_layers` format
    pub fn legacy(inbound_layers: OneOrMany<LayerId>) -> Self {
        Self {
            inbound_layers: Some(inbound_layers),
            parent_nodes: None,
        }
    }

    /// Creates a record in the newer parent-node format
    pub fn with_parents(parent_nodes: Vec<LayerId>) -> Self {
        Self {
            inbound_layers: None,
            parent_nodes: Some(parent_nodes),
        }
    }

    pub fn inbound_layers(&self) -> Option<&OneOrMany<LayerId>> {
        self.inbound_layers.as_ref()
    }

    pub fn parent_nodes(&self) -> Option<&[LayerId]> {
        self.parent_nodes.as_deref()
    }
}

/// Read-only introspection interface over a host model.
///
/// Only [`name`](Self::name) and [`kind`](Self::kind) are mandatory. Every
/// other capability has a default implementation reporting it as absent.
pub trait ModelIntrospection {
    /// Gives lazily built models a chance to materialize their bookkeeping.
    ///
    /// Called once before any connectivity is read.
    fn ensure_built(&mut self) {}

    /// The tracked-layers collection, tried first.
    fn tracked_layers(&self) -> Option<Vec<LayerId>> {
        None
    }

    /// The public layers collection, used when no tracked collection exists.
    fn layers(&self) -> Option<Vec<LayerId>> {
        None
    }

    /// Human readable label of the layer
    fn name(&self, layer: LayerId) -> &str;

    /// Layer kind such as `"Dense"` or `"Conv2D"`, used for styling and legends
    fn kind(&self, layer: LayerId) -> &str;

    fn output_shape(&self, _layer: LayerId) -> Option<RawShape> {
        None
    }

    fn output_tensor_shape(&self, _layer: LayerId) -> Option<RawShape> {
        None
    }

    fn batch_shape(&self, _layer: LayerId) -> Option<RawShape> {
        None
    }

    fn input_shape(&self, _layer: LayerId) -> Option<RawShape> {
        None
    }

    fn inbound_nodes(&self, _layer: LayerId) -> Vec<InboundNode> {
        Vec::new()
    }

    /// Layers consuming this layer's output, one entry per outbound record.
    fn outbound_layers(&self, _layer: LayerId) -> Vec<LayerId> {
        Vec::new()
    }

    /// Number of units of a dense-style layer
    fn units(&self, _layer: LayerId) -> Option<u64> {
        None
    }

    /// Number of filters of a convolution-style layer
    fn filters(&self, _layer: LayerId) -> Option<u64> {
        None
    }

    /// Horizontal offset of a spacer pseudo-layer.
    ///
    /// Spacers only move subsequent layers and are never drawn.
    fn spacer_offset(&self, _layer: LayerId) -> Option<f32> {
        None
    }

    /// Declared model outputs, in declaration order.
    fn output_layers(&self) -> Option<Vec<LayerId>> {
        None
    }
}
