use crate::flux::{FluxFunction, Parameter};
use crate::Real;
use nalgebra::{convert, DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Linear transport of a scalar quantity: `f(u) = u a^T` for a constant velocity `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransportFlux<T: Real> {
    velocity: DVector<T>,
}

impl<T: Real> LinearTransportFlux<T> {
    pub fn new(velocity: DVector<T>) -> Self {
        assert!(!velocity.is_empty(), "Velocity must have at least one component");
        Self { velocity }
    }

    pub fn velocity(&self) -> &DVector<T> {
        &self.velocity
    }
}

impl<T: Real> FluxFunction<T> for LinearTransportFlux<T> {
    fn state_dim(&self) -> usize {
        1
    }

    fn domain_dim(&self) -> usize {
        self.velocity.len()
    }

    fn order(&self) -> usize {
        1
    }

    fn evaluate(&self, u: &DVector<T>, _param: &Parameter<T>) -> DMatrix<T> {
        DMatrix::from_fn(1, self.velocity.len(), |_, s| self.velocity[s] * u[0])
    }

    fn jacobian(&self, _u: &DVector<T>, _param: &Parameter<T>) -> Vec<DMatrix<T>> {
        self.velocity
            .iter()
            .map(|&a| DMatrix::from_element(1, 1, a))
            .collect()
    }
}

/// Burgers flux `f(u) = u^2 / 2 a^T` along a constant direction `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct BurgersFlux<T: Real> {
    direction: DVector<T>,
}

impl<T: Real> BurgersFlux<T> {
    pub fn new(direction: DVector<T>) -> Self {
        assert!(!direction.is_empty(), "Direction must have at least one component");
        Self { direction }
    }
}

impl<T: Real> FluxFunction<T> for BurgersFlux<T> {
    fn state_dim(&self) -> usize {
        1
    }

    fn domain_dim(&self) -> usize {
        self.direction.len()
    }

    fn order(&self) -> usize {
        2
    }

    fn evaluate(&self, u: &DVector<T>, _param: &Parameter<T>) -> DMatrix<T> {
        let half_u_squared = u[0] * u[0] * convert::<f64, T>(0.5);
        DMatrix::from_fn(1, self.direction.len(), |_, s| self.direction[s] * half_u_squared)
    }

    fn jacobian(&self, u: &DVector<T>, _param: &Parameter<T>) -> Vec<DMatrix<T>> {
        self.direction
            .iter()
            .map(|&a| DMatrix::from_element(1, 1, a * u[0]))
            .collect()
    }
}

/// A linear hyperbolic system `f(u) = [A_1 u, ..., A_d u]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystemFlux<T: Real> {
    matrices: Vec<DMatrix<T>>,
}

impl<T: Real> LinearSystemFlux<T> {
    /// Creates the flux from one square matrix per spatial dimension.
    pub fn new(matrices: Vec<DMatrix<T>>) -> Self {
        assert!(!matrices.is_empty(), "Need at least one spatial dimension");
        let m = matrices[0].nrows();
        assert!(
            matrices.iter().all(|a| a.nrows() == m && a.ncols() == m),
            "All matrices must be square and of the same size"
        );
        Self { matrices }
    }
}

impl<T: Real> FluxFunction<T> for LinearSystemFlux<T> {
    fn state_dim(&self) -> usize {
        self.matrices[0].nrows()
    }

    fn domain_dim(&self) -> usize {
        self.matrices.len()
    }

    fn order(&self) -> usize {
        1
    }

    fn evaluate(&self, u: &DVector<T>, _param: &Parameter<T>) -> DMatrix<T> {
        let mut result = DMatrix::zeros(self.state_dim(), self.domain_dim());
        for (s, a) in self.matrices.iter().enumerate() {
            result.set_column(s, &(a * u));
        }
        result
    }

    fn jacobian(&self, _u: &DVector<T>, _param: &Parameter<T>) -> Vec<DMatrix<T>> {
        self.matrices.clone()
    }
}

/// A flux function given by closures for its value and its jacobian.
#[derive(Clone)]
pub struct LambdaFluxFunction<F, J> {
    state_dim: usize,
    domain_dim: usize,
    order: usize,
    flux: F,
    jacobian: J,
}

impl<F, J> LambdaFluxFunction<F, J> {
    pub fn new(state_dim: usize, domain_dim: usize, order: usize, flux: F, jacobian: J) -> Self {
        Self {
            state_dim,
            domain_dim,
            order,
            flux,
            jacobian,
        }
    }
}

impl<F, J> Debug for LambdaFluxFunction<F, J> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaFluxFunction")
            .field("state_dim", &self.state_dim)
            .field("domain_dim", &self.domain_dim)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<T, F, J> FluxFunction<T> for LambdaFluxFunction<F, J>
where
    T: Real,
    F: Fn(&DVector<T>, &Parameter<T>) -> DMatrix<T> + Send + Sync,
    J: Fn(&DVector<T>, &Parameter<T>) -> Vec<DMatrix<T>> + Send + Sync,
{
    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn domain_dim(&self) -> usize {
        self.domain_dim
    }

    fn order(&self) -> usize {
        self.order
    }

    fn evaluate(&self, u: &DVector<T>, param: &Parameter<T>) -> DMatrix<T> {
        let value = (self.flux)(u, param);
        assert_eq!(value.shape(), (self.state_dim, self.domain_dim), "Flux closure returned wrong shape");
        value
    }

    fn jacobian(&self, u: &DVector<T>, param: &Parameter<T>) -> Vec<DMatrix<T>> {
        let jacobian = (self.jacobian)(u, param);
        assert_eq!(jacobian.len(), self.domain_dim, "Jacobian closure returned wrong number of matrices");
        jacobian
    }
}
