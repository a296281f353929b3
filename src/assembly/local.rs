//! Local operators computing dense blocks on single entities and intersections.
//!
//! All operators accumulate into the output they are handed: callers zero the output before the
//! first operator is applied. Temporaries are taken from a [`ScratchPool`], which must hold at
//! least [`num_tmp_objects_required`](LocalVolumeMatrixOperator::num_tmp_objects_required)
//! matrices (or vectors, for functionals) of at least the size of the output.
use crate::assembly::buffers::{BasisBuffers, ScratchPool, ScratchRequirements};
use crate::grid::{Geometry, Intersection};
use crate::space::BaseFunctionSet;
use crate::Real;
use nalgebra::{DMatrixViewMut, DVector, DVectorViewMut};

mod advection;
mod elliptic;
mod face;
mod integral;
mod ipdg;
mod product;
mod source;

pub use advection::*;
pub use elliptic::*;
pub use face::*;
pub use integral::*;
pub use ipdg::*;
pub use product::*;
pub use source::*;

/// The four blocks produced by a local coupling operator.
///
/// `inside_outside` pairs inside test functions with outside ansatz functions, and so on.
#[derive(Debug)]
pub struct CouplingMatrixBlocks<'a, T: Real> {
    pub inside_inside: DMatrixViewMut<'a, T>,
    pub outside_outside: DMatrixViewMut<'a, T>,
    pub inside_outside: DMatrixViewMut<'a, T>,
    pub outside_inside: DMatrixViewMut<'a, T>,
}

/// Computes a local matrix on an entity from a test and an ansatz base function set.
pub trait LocalVolumeMatrixOperator<T: Real>: Send + Sync {
    fn num_tmp_objects_required(&self) -> usize;

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        output: DMatrixViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()>;
}

/// Computes a local vector on an entity from a test base function set.
pub trait LocalVolumeVectorOperator<T: Real>: Send + Sync {
    fn num_tmp_objects_required(&self) -> usize;

    fn apply(&self, test: &dyn BaseFunctionSet<T>, output: DVectorViewMut<T>, pool: &mut ScratchPool<T>)
        -> eyre::Result<()>;
}

/// Computes the four coupling blocks on an intersection between two entities.
pub trait LocalCouplingMatrixOperator<T: Real>: Send + Sync {
    fn num_tmp_objects_required(&self) -> usize;

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        test_inside: &dyn BaseFunctionSet<T>,
        ansatz_inside: &dyn BaseFunctionSet<T>,
        test_outside: &dyn BaseFunctionSet<T>,
        ansatz_outside: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        output: CouplingMatrixBlocks<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()>;
}

/// Computes a local matrix on an intersection using only the inside entity.
pub trait LocalBoundaryMatrixOperator<T: Real>: Send + Sync {
    fn num_tmp_objects_required(&self) -> usize;

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        output: DMatrixViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()>;
}

/// Computes a local vector on an intersection using only the inside entity.
pub trait LocalFaceVectorOperator<T: Real>: Send + Sync {
    fn num_tmp_objects_required(&self) -> usize;

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        output: DVectorViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()>;
}

/// Applies an operator to a source function on an intersection with two sides.
///
/// Unlike the matrix operators, the result depends on the local coefficients of the source on
/// both entities and is written to the local coefficients of a range function.
pub trait LocalCouplingOperator<T: Real>: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        source_inside: &DVector<T>,
        source_outside: &DVector<T>,
        intersection: &dyn Intersection<T>,
        inside_geometry: &dyn Geometry<T>,
        outside_geometry: &dyn Geometry<T>,
        range_inside: DVectorViewMut<T>,
        range_outside: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Applies an operator to a source function on a boundary intersection.
pub trait LocalBoundaryOperator<T: Real>: Send + Sync {
    fn apply(
        &self,
        source_inside: &DVector<T>,
        intersection: &dyn Intersection<T>,
        inside_geometry: &dyn Geometry<T>,
        range_inside: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// A bilinear integrand on an entity, evaluated at a single reference point.
pub trait VolumeBilinearEvaluation<T: Real>: Send + Sync {
    /// Polynomial order of the integrand.
    fn order(&self, test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> usize;

    /// Overwrites `result` with the integrand for every pair of test and ansatz functions.
    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        local: &DVector<T>,
        basis: &mut BasisBuffers<T>,
        result: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// A linear integrand on an entity, evaluated at a single reference point.
pub trait VolumeLinearEvaluation<T: Real>: Send + Sync {
    fn order(&self, test: &dyn BaseFunctionSet<T>) -> usize;

    /// Overwrites `result` with the integrand for every test function.
    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        local: &DVector<T>,
        basis: &mut BasisBuffers<T>,
        result: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Reference coordinates of a face quadrature point.
#[derive(Debug, Clone, Copy)]
pub struct FacePoint<'a, T: Real> {
    /// Coordinates in the face reference element.
    pub face: &'a DVector<T>,
    /// Coordinates in the inside reference element.
    pub inside: &'a DVector<T>,
    /// Coordinates in the outside reference element, for intersections with a neighbor.
    pub outside: Option<&'a DVector<T>>,
}

/// A bilinear integrand coupling the two sides of an intersection.
pub trait CouplingBilinearEvaluation<T: Real>: Send + Sync {
    fn order(
        &self,
        test_inside: &dyn BaseFunctionSet<T>,
        ansatz_inside: &dyn BaseFunctionSet<T>,
        test_outside: &dyn BaseFunctionSet<T>,
        ansatz_outside: &dyn BaseFunctionSet<T>,
    ) -> usize;

    /// Overwrites all four blocks with the integrand.
    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        test_inside: &dyn BaseFunctionSet<T>,
        ansatz_inside: &dyn BaseFunctionSet<T>,
        test_outside: &dyn BaseFunctionSet<T>,
        ansatz_outside: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        result: CouplingMatrixBlocks<T>,
    ) -> eyre::Result<()>;
}

/// A bilinear integrand on an intersection using the inside entity only.
pub trait BoundaryBilinearEvaluation<T: Real>: Send + Sync {
    fn order(&self, test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> usize;

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        result: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// A linear integrand on an intersection using the inside entity only.
pub trait FaceLinearEvaluation<T: Real>: Send + Sync {
    fn order(&self, test: &dyn BaseFunctionSet<T>) -> usize;

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        result: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Scratch requirements of an operator needing `count` temporaries for blocks of the given size.
pub fn scratch_requirements(count: usize, rows: usize, cols: usize) -> ScratchRequirements {
    ScratchRequirements {
        matrices: count,
        vectors: count,
        rows,
        cols,
    }
}
