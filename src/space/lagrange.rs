use crate::function::Function;
use crate::grid::{GridView, Intersection};
use crate::space::{lagrange_nodes, BlockMapper, DiscreteFunctionSpace, LagrangeBasis, Mapper, VertexMapper};
use crate::Real;
use nalgebra::DVector;
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// Discontinuous tensor-product Lagrange functions of degree `k >= 1`.
#[derive(Debug)]
pub struct DiscontinuousLagrangeSpace<'a, T: Real, G> {
    grid: &'a G,
    degree: usize,
    mapper: BlockMapper,
    marker: PhantomData<T>,
}

impl<'a, T: Real, G: GridView<T>> DiscontinuousLagrangeSpace<'a, T, G> {
    pub fn new(grid: &'a G, degree: usize) -> Self {
        assert!(degree >= 1, "Use a finite volume space for piecewise constants");
        let local_size = (degree + 1).pow(grid.dim() as u32);
        Self {
            grid,
            degree,
            mapper: BlockMapper::new(grid.num_entities(), local_size),
            marker: PhantomData,
        }
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    /// Nodal interpolation of `f` on every entity.
    pub fn interpolate(&self, f: &dyn Function<T>) -> DVector<T> {
        let nodes = lagrange_nodes(self.degree, self.grid.dim());
        let mut coefficients = DVector::zeros(self.mapper.size());
        for entity in 0..self.grid.num_entities() {
            let geometry = self.grid.entity_geometry(entity);
            for (i, node) in nodes.iter().enumerate() {
                coefficients[self.mapper.global_index(entity, i)] = f.evaluate(&geometry.global(node));
            }
        }
        coefficients
    }
}

impl<'a, T: Real, G: GridView<T>> DiscreteFunctionSpace<T> for DiscontinuousLagrangeSpace<'a, T, G> {
    type Mapper = BlockMapper;
    type Basis<'b> = LagrangeBasis<'b, T> where Self: 'b;

    fn mapper(&self) -> &Self::Mapper {
        &self.mapper
    }

    fn base_function_set(&self, entity: usize) -> Self::Basis<'_> {
        LagrangeBasis::new(entity, self.grid.entity_geometry(entity), self.degree, 1)
    }

    fn range_dim(&self) -> usize {
        1
    }

    fn order(&self) -> usize {
        self.degree
    }
}

/// Continuous piecewise multilinear (Q1) functions with one degree of freedom per vertex.
#[derive(Debug)]
pub struct ContinuousLagrangeSpace<'a, T: Real, G> {
    grid: &'a G,
    mapper: VertexMapper,
    marker: PhantomData<T>,
}

impl<'a, T: Real, G: GridView<T>> ContinuousLagrangeSpace<'a, T, G> {
    pub fn new(grid: &'a G) -> Self {
        let vertices_per_entity = 1 << grid.dim();
        let entity_vertices = (0..grid.num_entities())
            .flat_map(|entity| grid.entity_vertices(entity).iter().copied())
            .collect();
        Self {
            grid,
            mapper: VertexMapper::new(grid.num_vertices(), vertices_per_entity, entity_vertices),
            marker: PhantomData,
        }
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    /// Local indices of the basis functions that do not vanish on the given face of an entity.
    pub fn local_face_dofs(&self, face: usize) -> impl Iterator<Item = usize> {
        let d = self.grid.dim();
        assert!(face < 2 * d, "Face index out of bounds");
        let (axis, side) = (face / 2, face % 2);
        (0..1 << d).filter(move |corner| (corner >> axis) & 1 == side)
    }

    /// Global indices of all degrees of freedom on non-periodic boundary faces.
    pub fn boundary_dofs(&self) -> BTreeSet<usize> {
        let mut dofs = BTreeSet::new();
        for entity in 0..self.grid.num_entities() {
            for intersection in self.grid.intersections(entity) {
                if intersection.boundary() && !intersection.neighbor() {
                    for local in self.local_face_dofs(intersection.index_in_inside()) {
                        dofs.insert(self.mapper.global_index(entity, local));
                    }
                }
            }
        }
        dofs
    }

    /// Nodal interpolation of `f` at the grid vertices.
    pub fn interpolate(&self, f: &dyn Function<T>) -> DVector<T> {
        let mut coefficients = DVector::zeros(self.mapper.size());
        for entity in 0..self.grid.num_entities() {
            let geometry = self.grid.entity_geometry(entity);
            for corner in 0..geometry.reference_shape().num_corners() {
                coefficients[self.mapper.global_index(entity, corner)] = f.evaluate(&geometry.corner(corner));
            }
        }
        coefficients
    }
}

impl<'a, T: Real, G: GridView<T>> DiscreteFunctionSpace<T> for ContinuousLagrangeSpace<'a, T, G> {
    type Mapper = VertexMapper;
    type Basis<'b> = LagrangeBasis<'b, T> where Self: 'b;

    fn mapper(&self) -> &Self::Mapper {
        &self.mapper
    }

    fn base_function_set(&self, entity: usize) -> Self::Basis<'_> {
        LagrangeBasis::new(entity, self.grid.entity_geometry(entity), 1, 1)
    }

    fn range_dim(&self) -> usize {
        1
    }

    fn order(&self) -> usize {
        1
    }
}
