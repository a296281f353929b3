use crate::assembly::buffers::BasisBuffers;
use crate::assembly::local::VolumeBilinearEvaluation;
use crate::function::Function;
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::bail;
use nalgebra::{DMatrixViewMut, DVector};

/// The integrand `f φ_i · ψ_j` of a weighted L2 product.
///
/// Vector-valued base functions are multiplied component-wise, so test and ansatz sets must have
/// the same range dimension.
#[derive(Debug, Clone)]
pub struct Product<F> {
    function: F,
}

impl<F> Product<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }

    pub fn function(&self) -> &F {
        &self.function
    }
}

impl<T, F> VolumeBilinearEvaluation<T> for Product<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> usize {
        self.function.order() + test.order() + ansatz.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        local: &DVector<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        if test.range_dim() != ansatz.range_dim() {
            bail!(
                "product of base functions with range dimensions {} and {}",
                test.range_dim(),
                ansatz.range_dim()
            );
        }
        basis.test.populate_values(test, local);
        basis.ansatz.populate_values(ansatz, local);
        let f = self.function.evaluate(&test.geometry().global(local));
        result.gemm_tr(f, basis.test.values(), basis.ansatz.values(), T::zero());
        Ok(())
    }
}
