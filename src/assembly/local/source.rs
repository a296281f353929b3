use crate::assembly::buffers::BasisBuffers;
use crate::assembly::local::VolumeLinearEvaluation;
use crate::function::Function;
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::bail;
use nalgebra::{DVector, DVectorViewMut};

/// The integrand `f φ_i` of a source functional.
#[derive(Debug, Clone)]
pub struct SourceProduct<F> {
    source: F,
}

impl<F> SourceProduct<F> {
    pub fn new(source: F) -> Self {
        Self { source }
    }
}

impl<T, F> VolumeLinearEvaluation<T> for SourceProduct<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>) -> usize {
        self.source.order() + test.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        local: &DVector<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        if test.range_dim() != 1 {
            bail!("source product requires scalar base functions, got range dimension {}", test.range_dim());
        }
        basis.test.populate_values(test, local);
        let f = self.source.evaluate(&test.geometry().global(local));
        for (r, &phi) in result.iter_mut().zip(basis.test.values().row(0).iter()) {
            *r = f * phi;
        }
        Ok(())
    }
}
