use crate::grid::GridView;
use crate::space::{BlockMapper, DiscreteFunctionSpace, LagrangeBasis};
use crate::Real;
use nalgebra::DVector;
use std::marker::PhantomData;

/// Piecewise constant functions with `range_dim` components.
///
/// The degrees of freedom of an entity are the components of the cell value.
#[derive(Debug)]
pub struct FiniteVolumeSpace<'a, T: Real, G> {
    grid: &'a G,
    mapper: BlockMapper,
    range_dim: usize,
    marker: PhantomData<T>,
}

impl<'a, T: Real, G: GridView<T>> FiniteVolumeSpace<'a, T, G> {
    /// Scalar finite volume space.
    pub fn new(grid: &'a G) -> Self {
        Self::vector_valued(grid, 1)
    }

    pub fn vector_valued(grid: &'a G, range_dim: usize) -> Self {
        assert!(range_dim > 0, "Range dimension must be positive");
        Self {
            grid,
            mapper: BlockMapper::new(grid.num_entities(), range_dim),
            range_dim,
            marker: PhantomData,
        }
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    /// Coefficients of the function whose value in each cell is `f` at the cell center.
    pub fn interpolate(&self, f: impl Fn(&DVector<T>) -> DVector<T>) -> DVector<T> {
        let m = self.range_dim;
        let mut coefficients = DVector::zeros(m * self.grid.num_entities());
        for entity in 0..self.grid.num_entities() {
            let value = f(&self.grid.entity_geometry(entity).center());
            assert_eq!(value.len(), m, "Interpolated function has wrong number of components");
            coefficients.rows_mut(m * entity, m).copy_from(&value);
        }
        coefficients
    }
}

impl<'a, T: Real, G: GridView<T>> DiscreteFunctionSpace<T> for FiniteVolumeSpace<'a, T, G> {
    type Mapper = BlockMapper;
    type Basis<'b> = LagrangeBasis<'b, T> where Self: 'b;

    fn mapper(&self) -> &Self::Mapper {
        &self.mapper
    }

    fn base_function_set(&self, entity: usize) -> Self::Basis<'_> {
        LagrangeBasis::new(entity, self.grid.entity_geometry(entity), 0, self.range_dim)
    }

    fn range_dim(&self) -> usize {
        self.range_dim
    }

    fn order(&self) -> usize {
        0
    }
}
