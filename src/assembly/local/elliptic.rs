use crate::assembly::buffers::BasisBuffers;
use crate::assembly::local::VolumeBilinearEvaluation;
use crate::function::Function;
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::bail;
use nalgebra::{DMatrixViewMut, DVector};

/// The integrand `a ∇φ_i · ∇ψ_j` of a scalar diffusion operator.
#[derive(Debug, Clone)]
pub struct Elliptic<F> {
    diffusion: F,
}

impl<F> Elliptic<F> {
    pub fn new(diffusion: F) -> Self {
        Self { diffusion }
    }

    pub fn diffusion(&self) -> &F {
        &self.diffusion
    }
}

impl<T, F> VolumeBilinearEvaluation<T> for Elliptic<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> usize {
        self.diffusion.order() + test.order() + ansatz.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        local: &DVector<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        if test.range_dim() != 1 || ansatz.range_dim() != 1 {
            bail!(
                "elliptic evaluation requires scalar base functions, got range dimensions {} and {}",
                test.range_dim(),
                ansatz.range_dim()
            );
        }
        basis.test.populate_gradients(test, local);
        basis.ansatz.populate_gradients(ansatz, local);
        let a = self.diffusion.evaluate(&test.geometry().global(local));
        result.gemm_tr(a, basis.test.gradients(), basis.ansatz.gradients(), T::zero());
        Ok(())
    }
}
