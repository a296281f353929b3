//! Discretization toolkit built around a grid walker.
//!
//! Local operators compute small dense blocks on single cells or faces, numerical fluxes
//! couple neighboring states, and the [`assembly::SystemAssembler`] walks a grid once to
//! accumulate all registered contributions into global matrices and vectors.
use nalgebra::RealField;

pub mod assembly;
pub mod error;
pub mod flux;
pub mod function;
pub mod grid;
pub mod products;
pub mod quadrature;
pub mod space;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar type used throughout the crate.
///
/// Used as a trait alias for the traits frequently needed by generic routines.
pub trait Real: RealField + Copy + Send + Sync {}

impl<T> Real for T where T: RealField + Copy + Send + Sync {}
