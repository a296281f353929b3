//! Physical flux functions and numerical fluxes for face terms of hyperbolic problems.
//!
//! A physical flux is a map `f: R^m -> R^{m x d}` from a state with `m` components to one
//! flux column per spatial dimension. A numerical flux approximates the normal flux
//! `f(w) n` across a face from the two states `u` (inside) and `v` (outside).
use crate::quadrature::QuadratureError;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};

mod engquist_osher;
mod lambda;
mod lax_friedrichs;
mod physical;
mod upwind;
mod vijayasundaram;

pub use engquist_osher::EngquistOsher;
pub use lambda::NumericalLambdaFlux;
pub use lax_friedrichs::LaxFriedrichs;
pub use physical::{BurgersFlux, LambdaFluxFunction, LinearSystemFlux, LinearTransportFlux};
pub use upwind::Upwind;
pub use vijayasundaram::{real_eigen_decomposition, EigenDecomposition, Vijayasundaram};

/// Errors produced by numerical fluxes.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FluxError {
    /// The flux is not implemented for the given combination of dimensions.
    NotAvailableForDimensions {
        flux: &'static str,
        domain_dim: usize,
        state_dim: usize,
    },
    /// The dissipation parameter of the Lax–Friedrichs flux vanishes.
    DegenerateDissipation,
    /// The normal flux jacobian could not be diagonalized over the reals.
    EigenDecomposition { reason: &'static str },
    /// No quadrature rule is available for the integral of the flux derivative.
    Quadrature(QuadratureError),
}

impl Display for FluxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailableForDimensions {
                flux,
                domain_dim,
                state_dim,
            } => write!(
                f,
                "{flux} flux not available for these dimensions (domain dim {domain_dim}, state dim {state_dim})"
            ),
            Self::DegenerateDissipation => {
                write!(f, "Lax-Friedrichs dissipation vanishes: flux jacobian is zero in both states")
            }
            Self::EigenDecomposition { reason } => {
                write!(f, "eigendecomposition of the normal flux jacobian failed: {reason}")
            }
            Self::Quadrature(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FluxError {}

impl From<QuadratureError> for FluxError {
    fn from(err: QuadratureError) -> Self {
        Self::Quadrature(err)
    }
}

/// Named parameter values passed through fluxes, e.g. the current time `"t"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter<T> {
    values: BTreeMap<String, Vec<T>>,
}

impl<T> Default for Parameter<T> {
    fn default() -> Self {
        Self { values: BTreeMap::new() }
    }
}

impl<T: Real> Parameter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, values: Vec<T>) -> Self {
        self.set(key, values);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, values: Vec<T>) {
        self.values.insert(key.into(), values);
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// The single value stored under `key`, if it has exactly one value.
    pub fn scalar(&self, key: &str) -> Option<T> {
        match self.get(key) {
            Some(&[value]) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// A physical flux `f: R^m -> R^{m x d}`.
pub trait FluxFunction<T: Real>: Send + Sync {
    /// Number of state components `m`.
    fn state_dim(&self) -> usize;

    /// Number of spatial dimensions `d`.
    fn domain_dim(&self) -> usize;

    /// Polynomial order of the flux in the state.
    fn order(&self) -> usize;

    /// Evaluates the flux, an `m x d` matrix.
    fn evaluate(&self, u: &DVector<T>, param: &Parameter<T>) -> DMatrix<T>;

    /// The jacobian of each flux column with respect to the state, `d` matrices of size `m x m`.
    fn jacobian(&self, u: &DVector<T>, param: &Parameter<T>) -> Vec<DMatrix<T>>;
}

/// Numerical flux `g(u, v, n)` approximating the flux across a face with unit normal `n`.
pub trait NumericalFlux<T: Real>: Send + Sync {
    fn state_dim(&self) -> usize;

    fn domain_dim(&self) -> usize;

    /// Evaluates the flux for inside state `u`, outside state `v` and unit outer normal `n`.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions of the arguments do not match the flux.
    fn apply(
        &self,
        u: &DVector<T>,
        v: &DVector<T>,
        n: &DVector<T>,
        param: &Parameter<T>,
    ) -> Result<DVector<T>, FluxError>;

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>>;
}

impl<T: Real> Clone for Box<dyn NumericalFlux<T>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The normal flux `f(u) n`.
pub fn normal_flux<T: Real>(
    flux: &dyn FluxFunction<T>,
    u: &DVector<T>,
    n: &DVector<T>,
    param: &Parameter<T>,
) -> DVector<T> {
    flux.evaluate(u, param) * n
}

/// The normal jacobian `sum_s n_s df_s/du`, an `m x m` matrix.
pub fn normal_jacobian<T: Real>(
    flux: &dyn FluxFunction<T>,
    u: &DVector<T>,
    n: &DVector<T>,
    param: &Parameter<T>,
) -> DMatrix<T> {
    let m = flux.state_dim();
    flux.jacobian(u, param)
        .iter()
        .zip(n.iter())
        .fold(DMatrix::zeros(m, m), |acc, (jacobian, &n_s)| acc + jacobian * n_s)
}

fn check_scalar<T: Real>(flux_name: &'static str, flux: &dyn FluxFunction<T>) -> Result<(), FluxError> {
    if flux.state_dim() == 1 {
        Ok(())
    } else {
        Err(FluxError::NotAvailableForDimensions {
            flux: flux_name,
            domain_dim: flux.domain_dim(),
            state_dim: flux.state_dim(),
        })
    }
}

fn assert_arguments<T: Real>(flux: &dyn FluxFunction<T>, u: &DVector<T>, v: &DVector<T>, n: &DVector<T>) {
    assert_eq!(u.len(), flux.state_dim(), "Inside state has wrong dimension");
    assert_eq!(v.len(), flux.state_dim(), "Outside state has wrong dimension");
    assert_eq!(n.len(), flux.domain_dim(), "Normal has wrong dimension");
}
