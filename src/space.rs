//! Discrete function spaces: base function sets bound to entities and local-to-global DOF maps.
use crate::grid::Geometry;
use crate::Real;
use nalgebra::{DMatrix, DVector};

mod basis;
mod finite_volume;
mod lagrange;
mod mapper;

pub use basis::*;
pub use finite_volume::FiniteVolumeSpace;
pub use lagrange::{ContinuousLagrangeSpace, DiscontinuousLagrangeSpace};
pub use mapper::{BlockMapper, VertexMapper};

/// Maps the local degrees of freedom of each entity to global indices.
pub trait Mapper: Send + Sync {
    /// Total number of global degrees of freedom.
    fn size(&self) -> usize;

    /// The largest number of local degrees of freedom over all entities.
    fn max_local_size(&self) -> usize;

    fn local_size(&self, entity: usize) -> usize;

    fn global_index(&self, entity: usize, local_index: usize) -> usize;

    /// Replaces the contents of `indices` with the global indices of all local DOFs of the entity.
    fn populate_global_indices(&self, entity: usize, indices: &mut Vec<usize>) {
        indices.clear();
        indices.extend((0..self.local_size(entity)).map(|i| self.global_index(entity, i)));
    }
}

/// The local basis functions of a space restricted to a single entity.
///
/// Values and reference gradients are evaluated at points in the reference element of the
/// entity.
pub trait BaseFunctionSet<T: Real> {
    fn entity(&self) -> usize;

    fn geometry(&self) -> &dyn Geometry<T>;

    /// Number of local basis functions.
    fn size(&self) -> usize;

    /// Polynomial order in each reference coordinate.
    fn order(&self) -> usize;

    /// Number of components of each basis function.
    fn range_dim(&self) -> usize;

    /// Evaluates all basis functions into `values`, resized to `range_dim x size`.
    fn populate_values(&self, local: &DVector<T>, values: &mut DMatrix<T>);

    /// Evaluates reference gradients of all basis functions into `gradients`, resized to
    /// `mydim x size`.
    ///
    /// # Panics
    ///
    /// Panics if the set is not scalar-valued.
    fn populate_reference_gradients(&self, local: &DVector<T>, gradients: &mut DMatrix<T>);
}

/// A discrete function space on a grid view.
pub trait DiscreteFunctionSpace<T: Real>: Sync {
    type Mapper: Mapper;
    type Basis<'b>: BaseFunctionSet<T>
    where
        Self: 'b;

    fn mapper(&self) -> &Self::Mapper;

    fn base_function_set(&self, entity: usize) -> Self::Basis<'_>;

    fn range_dim(&self) -> usize;

    fn order(&self) -> usize;

    /// Whether the space consists of piecewise constant functions.
    fn is_finite_volume(&self) -> bool {
        self.order() == 0
    }
}

/// Evaluates the discrete function with global coefficients `u` at a reference point of an entity.
pub fn evaluate_discrete_function<T, Space>(
    space: &Space,
    u: &DVector<T>,
    entity: usize,
    local: &DVector<T>,
) -> DVector<T>
where
    T: Real,
    Space: DiscreteFunctionSpace<T>,
{
    assert_eq!(u.len(), space.mapper().size(), "Coefficient vector must match the space dimension");
    let basis = space.base_function_set(entity);
    let mut values = DMatrix::zeros(0, 0);
    basis.populate_values(local, &mut values);
    let coefficients = DVector::from_fn(basis.size(), |i, _| u[space.mapper().global_index(entity, i)]);
    values * coefficients
}
