use crate::assembly::buffers::BasisBuffers;
use crate::assembly::local::{
    BoundaryBilinearEvaluation, CouplingBilinearEvaluation, CouplingMatrixBlocks, FaceLinearEvaluation, FacePoint,
};
use crate::function::Function;
use crate::grid::Intersection;
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::{bail, eyre};
use nalgebra::{convert, DMatrixViewMut, DVectorViewMut};

fn ensure_same_range<T: Real>(test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> eyre::Result<()> {
    if test.range_dim() != ansatz.range_dim() {
        bail!(
            "product of base functions with range dimensions {} and {}",
            test.range_dim(),
            ansatz.range_dim()
        );
    }
    Ok(())
}

/// Interior penalty `σ / h [φ_i] · [ψ_j]` on the jump `[φ] = φ_inside - φ_outside`.
///
/// The local mesh size is `h = (|K_in| + |K_out|) / (2 |F|)`. On boundary intersections the jump is
/// the trace itself and `h = |K_in| / |F|`.
#[derive(Debug, Clone)]
pub struct JumpPenalty<F> {
    penalty: F,
}

impl<F> JumpPenalty<F> {
    pub fn new(penalty: F) -> Self {
        Self { penalty }
    }
}

impl<T, F> CouplingBilinearEvaluation<T> for JumpPenalty<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(
        &self,
        test_inside: &dyn BaseFunctionSet<T>,
        ansatz_inside: &dyn BaseFunctionSet<T>,
        test_outside: &dyn BaseFunctionSet<T>,
        ansatz_outside: &dyn BaseFunctionSet<T>,
    ) -> usize {
        let test_order = test_inside.order().max(test_outside.order());
        let ansatz_order = ansatz_inside.order().max(ansatz_outside.order());
        self.penalty.order() + test_order + ansatz_order
    }

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
    ) -> eyre::Result<()> {
        ensure_same_range(test_inside, ansatz_inside)?;
        ensure_same_range(test_inside, ansatz_outside)?;
        ensure_same_range(test_outside, ansatz_inside)?;
        let outside = point
            .outside
            .ok_or_else(|| eyre!("jump penalty on intersection without outside entity"))?;

        basis.test.populate_values(test_inside, point.inside);
        basis.ansatz.populate_values(ansatz_inside, point.inside);
        basis.test_outside.populate_values(test_outside, outside);
        basis.ansatz_outside.populate_values(ansatz_outside, outside);

        let face = intersection.geometry();
        let h = (test_inside.geometry().volume() + test_outside.geometry().volume())
            / (convert::<f64, T>(2.0) * face.volume());
        let sigma = self.penalty.evaluate(&face.global(point.face)) / h;

        let CouplingMatrixBlocks {
            mut inside_inside,
            mut outside_outside,
            mut inside_outside,
            mut outside_inside,
        } = result;
        let (ti, ai) = (basis.test.values(), basis.ansatz.values());
        let (to, ao) = (basis.test_outside.values(), basis.ansatz_outside.values());
        inside_inside.gemm_tr(sigma, ti, ai, T::zero());
        outside_outside.gemm_tr(sigma, to, ao, T::zero());
        inside_outside.gemm_tr(-sigma, ti, ao, T::zero());
        outside_inside.gemm_tr(-sigma, to, ai, T::zero());
        Ok(())
    }
}

impl<T, F> BoundaryBilinearEvaluation<T> for JumpPenalty<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>, ansatz: &dyn BaseFunctionSet<T>) -> usize {
        self.penalty.order() + test.order() + ansatz.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        ensure_same_range(test, ansatz)?;
        basis.test.populate_values(test, point.inside);
        basis.ansatz.populate_values(ansatz, point.inside);
        let face = intersection.geometry();
        let h = test.geometry().volume() / face.volume();
        let sigma = self.penalty.evaluate(&face.global(point.face)) / h;
        result.gemm_tr(sigma, basis.test.values(), basis.ansatz.values(), T::zero());
        Ok(())
    }
}

/// The integrand `f φ_i · ψ_j` on a face.
#[derive(Debug, Clone)]
pub struct BoundaryProduct<F> {
    function: F,
}

impl<F> BoundaryProduct<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<T, F> BoundaryBilinearEvaluation<T> for BoundaryProduct<F>
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
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        ensure_same_range(test, ansatz)?;
        basis.test.populate_values(test, point.inside);
        basis.ansatz.populate_values(ansatz, point.inside);
        let f = self
            .function
            .evaluate(&intersection.geometry().global(point.face));
        result.gemm_tr(f, basis.test.values(), basis.ansatz.values(), T::zero());
        Ok(())
    }
}

/// The integrand `g φ_i` on a face, e.g. for Neumann data.
#[derive(Debug, Clone)]
pub struct BoundarySource<F> {
    function: F,
}

impl<F> BoundarySource<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<T, F> FaceLinearEvaluation<T> for BoundarySource<F>
where
    T: Real,
    F: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>) -> usize {
        self.function.order() + test.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        if test.range_dim() != 1 {
            bail!("boundary source requires scalar base functions, got range dimension {}", test.range_dim());
        }
        basis.test.populate_values(test, point.inside);
        let g = self
            .function
            .evaluate(&intersection.geometry().global(point.face));
        for (r, &phi) in result.iter_mut().zip(basis.test.values().row(0).iter()) {
            *r = g * phi;
        }
        Ok(())
    }
}
