//! Quadrature rules for tensor-product reference domains.
//!
//! All reference domains handled here are unit cubes `[0, 1]^d` for `d = 0, 1, 2, 3`.
//! The zero-dimensional cube is a single point, which is needed for the faces of
//! one-dimensional grids.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A rule whose dimension is only known at runtime.
///
/// Every point has the same number of coordinates.
pub type DynRule = (Vec<f64>, Vec<Vec<f64>>);
