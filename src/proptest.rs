//! Proptest strategies for grids and face normals.
use crate::grid::StructuredGrid;
use ::proptest::prelude::*;
use nalgebra::DVector;

/// Parameters of an arbitrary [`StructuredGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredGridParams {
    pub dim: usize,
    pub max_cells_per_dim: usize,
    pub allow_periodic: bool,
}

impl Default for StructuredGridParams {
    fn default() -> Self {
        Self {
            dim: 2,
            max_cells_per_dim: 5,
            allow_periodic: true,
        }
    }
}

impl StructuredGridParams {
    pub fn with_dim(self, dim: usize) -> Self {
        Self { dim, ..self }
    }

    pub fn with_max_cells_per_dim(self, max_cells_per_dim: usize) -> Self {
        Self {
            max_cells_per_dim,
            ..self
        }
    }

    pub fn without_periodicity(self) -> Self {
        Self {
            allow_periodic: false,
            ..self
        }
    }
}

impl Arbitrary for StructuredGrid<f64> {
    type Parameters = StructuredGridParams;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let d = params.dim;
        assert!((1..=3).contains(&d), "Structured grids must be one-, two- or three-dimensional");
        assert!(params.max_cells_per_dim > 0);
        // Keep the box reasonably sized, so that cell volumes stay well away from zero
        let lower = prop::collection::vec(-5.0..5.0, d);
        let extents = prop::collection::vec(0.5..5.0, d);
        let cells = prop::collection::vec(1..=params.max_cells_per_dim, d);
        let periodic = if params.allow_periodic {
            prop::collection::vec(any::<bool>(), d).boxed()
        } else {
            Just(vec![false; d]).boxed()
        };
        (lower, extents, cells, periodic)
            .prop_map(|(lower, extents, cells, periodic)| {
                let upper: Vec<_> = lower.iter().zip(&extents).map(|(l, e)| l + e).collect();
                StructuredGrid::with_periodicity(&lower, &upper, &cells, &periodic)
            })
            .boxed()
    }
}

/// Unit vectors in `dim` dimensions.
pub fn unit_normal(dim: usize) -> impl Strategy<Value = DVector<f64>> {
    prop::collection::vec(-1.0..1.0, dim)
        .prop_map(DVector::from_vec)
        .prop_filter("Normal must not be degenerate", |n| n.norm() > 1e-3)
        .prop_map(|n| n.normalize())
}

/// Vectors with `dim` components in a moderate range.
pub fn state(dim: usize) -> impl Strategy<Value = DVector<f64>> {
    prop::collection::vec(-10.0..10.0, dim).prop_map(DVector::from_vec)
}
