//! Constraints overriding the assembled rows of selected degrees of freedom.
use crate::assembly::filter::{IntersectionFilter, NonPeriodicBoundaryIntersections};
use crate::function::Function;
use crate::grid::{Geometry, GridView, Intersection};
use crate::space::{lagrange_nodes, BaseFunctionSet, DiscreteFunctionSpace, Mapper};
use crate::Real;
use nalgebra::DVector;
use std::collections::BTreeMap;

/// Constraints collected per entity during a walk.
pub trait Constraints<T: Real, G: GridView<T>>: Send + Sync {
    /// Number of degrees of freedom of the constrained space.
    fn num_dofs(&self) -> usize;

    /// Appends pairs of constrained global index and prescribed value for the entity.
    fn populate_local_constraints(&self, grid: &G, entity: usize, constraints: &mut Vec<(usize, T)>);
}

/// Dirichlet constraints for the degrees of freedom of a nodal space on boundary faces.
///
/// A local basis function is constrained on a face if its Lagrange node lies in the closure of
/// the face. Applied to a matrix the constrained rows become unit rows, applied to a
/// vector the constrained entries receive the prescribed values.
#[derive(Debug, Clone)]
pub struct DirichletConstraints<T: Real> {
    num_dofs: usize,
    local_constraints: Vec<Vec<(usize, T)>>,
}

impl<T: Real> DirichletConstraints<T> {
    /// Constraints with value zero on all non-periodic boundary faces.
    pub fn homogeneous<G, S>(grid: &G, space: &S) -> Self
    where
        G: GridView<T>,
        S: DiscreteFunctionSpace<T>,
    {
        Self::compute(grid, space, &NonPeriodicBoundaryIntersections, |_| T::zero())
    }

    /// Constraints with values `g` at the nodes on all non-periodic boundary faces.
    pub fn from_function<G, S>(grid: &G, space: &S, g: &dyn Function<T>) -> Self
    where
        G: GridView<T>,
        S: DiscreteFunctionSpace<T>,
    {
        Self::compute(grid, space, &NonPeriodicBoundaryIntersections, |x| g.evaluate(x))
    }

    /// Constraints with values `g` on all intersections accepted by `filter`.
    pub fn from_function_on<G, S>(
        grid: &G,
        space: &S,
        g: &dyn Function<T>,
        filter: &impl IntersectionFilter<T, G>,
    ) -> Self
    where
        G: GridView<T>,
        S: DiscreteFunctionSpace<T>,
    {
        Self::compute(grid, space, filter, |x| g.evaluate(x))
    }

    fn compute<G, S>(
        grid: &G,
        space: &S,
        filter: &impl IntersectionFilter<T, G>,
        value_at: impl Fn(&DVector<T>) -> T,
    ) -> Self
    where
        G: GridView<T>,
        S: DiscreteFunctionSpace<T>,
    {
        assert_eq!(space.range_dim(), 1, "Dirichlet constraints require a scalar space");
        let mut local_constraints = vec![Vec::new(); grid.num_entities()];

        for (entity, constraints) in local_constraints.iter_mut().enumerate() {
            let basis = space.base_function_set(entity);
            let geometry = grid.entity_geometry(entity);
            let nodes = lagrange_nodes::<T>(basis.order(), geometry.mydim());
            let mut constrained = BTreeMap::new();
            for intersection in grid.intersections(entity) {
                if !filter.contains(grid, intersection) {
                    continue;
                }
                let embedding = intersection.geometry_in_inside();
                for (i, node) in nodes.iter().enumerate() {
                    if lies_on_face(embedding, node) {
                        let dof = space.mapper().global_index(entity, i);
                        constrained
                            .entry(dof)
                            .or_insert_with(|| value_at(&geometry.global(node)));
                    }
                }
            }
            constraints.extend(constrained);
        }

        Self {
            num_dofs: space.mapper().size(),
            local_constraints,
        }
    }

    /// Global indices of all constrained degrees of freedom, in increasing order.
    pub fn dofs(&self) -> Vec<usize> {
        let mut dofs: Vec<_> = self
            .local_constraints
            .iter()
            .flatten()
            .map(|&(dof, _)| dof)
            .collect();
        dofs.sort_unstable();
        dofs.dedup();
        dofs
    }

    /// The prescribed value of every constrained degree of freedom.
    pub fn values(&self) -> BTreeMap<usize, T> {
        self.local_constraints.iter().flatten().copied().collect()
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn is_empty(&self) -> bool {
        self.local_constraints.iter().all(Vec::is_empty)
    }
}

impl<T: Real, G: GridView<T>> Constraints<T, G> for DirichletConstraints<T> {
    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn populate_local_constraints(&self, _grid: &G, entity: usize, constraints: &mut Vec<(usize, T)>) {
        constraints.extend_from_slice(&self.local_constraints[entity]);
    }
}

/// Whether a reference point of the inside entity lies on the face given by its embedding.
fn lies_on_face<T: Real>(embedding: &dyn Geometry<T>, point: &DVector<T>) -> bool {
    let tol = T::default_epsilon().sqrt();
    let face_origin = DVector::zeros(embedding.mydim());
    let origin = embedding.global(&face_origin);
    let local = embedding
        .jacobian_inverse_transposed(&face_origin)
        .tr_mul(&(point - origin));
    let inside_face = local
        .iter()
        .all(|&x| x >= -tol && x <= T::one() + tol);
    inside_face && (embedding.global(&local) - point).norm() <= tol
}
