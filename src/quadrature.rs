//! Quadrature rules on reference elements and the providers that hand them out to local operators.
use crate::Real;
use gdt_quadrature::tensor::unit_cube_gauss_for_order;
use itertools::izip;
use nalgebra::{convert, DVector};
use serde::{Deserialize, Serialize};

/// Errors returned by quadrature methods.
pub use gdt_quadrature::Error as QuadratureError;

/// Reference elements supported by the crate.
///
/// Every reference element is a unit cube `[0, 1]^d`, with `d` given by [`ReferenceShape::dim`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceShape {
    Point,
    Line,
    Quadrilateral,
    Hexahedron,
}

impl ReferenceShape {
    /// The cube shape with the given dimension, if it exists.
    pub fn cube(dim: usize) -> Option<Self> {
        match dim {
            0 => Some(Self::Point),
            1 => Some(Self::Line),
            2 => Some(Self::Quadrilateral),
            3 => Some(Self::Hexahedron),
            _ => None,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Quadrilateral => 2,
            Self::Hexahedron => 3,
        }
    }

    /// Number of codim-1 faces of the reference element.
    pub fn num_faces(&self) -> usize {
        2 * self.dim()
    }

    /// Number of corners of the reference element.
    pub fn num_corners(&self) -> usize {
        1 << self.dim()
    }

    /// Coordinates of the given corner.
    ///
    /// Bit `a` of `corner` determines whether the corner sits at 0 or 1 along axis `a`.
    pub fn corner<T: Real>(&self, corner: usize) -> DVector<T> {
        assert!(corner < self.num_corners(), "corner index out of bounds");
        DVector::from_fn(self.dim(), |a, _| if (corner >> a) & 1 == 1 { T::one() } else { T::zero() })
    }

    /// The center of the reference element.
    pub fn center<T: Real>(&self) -> DVector<T> {
        DVector::repeat(self.dim(), convert::<f64, T>(0.5))
    }
}

/// A quadrature rule consisting of weights and points on a reference element.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<T: Real> {
    weights: Vec<T>,
    points: Vec<DVector<T>>,
}

impl<T: Real> QuadratureRule<T> {
    pub fn from_weights_and_points(weights: Vec<T>, points: Vec<DVector<T>>) -> Self {
        assert_eq!(
            weights.len(),
            points.len(),
            "Number of weights and points must be the same"
        );
        Self { weights, points }
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    pub fn points(&self) -> &[DVector<T>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, &DVector<T>)> {
        izip!(self.weights.iter().copied(), &self.points)
    }

    /// Approximates the integral of the given function over the reference element.
    pub fn integrate(&self, mut f: impl FnMut(&DVector<T>) -> T) -> T {
        self.iter().fold(T::zero(), |acc, (w, x)| acc + w * f(x))
    }
}

/// Hands out quadrature rules for a reference element and a polynomial degree.
pub trait QuadratureProvider<T: Real>: Send + Sync {
    /// Returns a rule on the given reference element that integrates polynomials of the given
    /// degree (in each coordinate) exactly.
    fn rule(&self, shape: ReferenceShape, order: usize) -> Result<QuadratureRule<T>, QuadratureError>;
}

impl<'a, T: Real, Q: QuadratureProvider<T> + ?Sized> QuadratureProvider<T> for &'a Q {
    fn rule(&self, shape: ReferenceShape, order: usize) -> Result<QuadratureRule<T>, QuadratureError> {
        (**self).rule(shape, order)
    }
}

/// Tensor-product Gauss–Legendre rules.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaussQuadrature;

impl<T: Real> QuadratureProvider<T> for GaussQuadrature {
    fn rule(&self, shape: ReferenceShape, order: usize) -> Result<QuadratureRule<T>, QuadratureError> {
        let (weights, points) = unit_cube_gauss_for_order(shape.dim(), order)?;
        let weights = weights.into_iter().map(convert::<f64, T>).collect();
        let points = points
            .into_iter()
            .map(|p| DVector::from_iterator(p.len(), p.into_iter().map(convert::<f64, T>)))
            .collect();
        Ok(QuadratureRule::from_weights_and_points(weights, points))
    }
}

/// Gauss rule on `[0, 1]` exact for polynomials of the given degree.
pub fn unit_interval_rule<T: Real>(order: usize) -> Result<QuadratureRule<T>, QuadratureError> {
    GaussQuadrature.rule(ReferenceShape::Line, order)
}
