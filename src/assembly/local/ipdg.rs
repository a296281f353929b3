use crate::assembly::buffers::BasisBuffers;
use crate::assembly::local::{
    BoundaryBilinearEvaluation, CouplingBilinearEvaluation, CouplingMatrixBlocks, FaceLinearEvaluation, FacePoint,
};
use crate::function::Function;
use crate::grid::Intersection;
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::{bail, eyre};
use nalgebra::{convert, DMatrix, DMatrixViewMut, DVector, DVectorViewMut};

fn ensure_scalar<T: Real>(sets: &[&dyn BaseFunctionSet<T>]) -> eyre::Result<()> {
    if let Some(set) = sets.iter().find(|set| set.range_dim() != 1) {
        bail!(
            "interior penalty terms require scalar base functions, got range dimension {}",
            set.range_dim()
        );
    }
    Ok(())
}

/// Normal derivatives `∇φ_i · n`, as a row with one column per function.
fn normal_derivatives<T: Real>(gradients: &DMatrix<T>, normal: &DVector<T>) -> DMatrix<T> {
    DMatrix::from_fn(1, gradients.ncols(), |_, j| gradients.column(j).dot(normal))
}

/// The symmetric consistency terms of the interior penalty discretization of `-∇ · (a ∇u)`.
///
/// On an intersection with a neighbor the integrand is
/// `-{a ∇ψ_j · n} [φ_i] - [ψ_j] {a ∇φ_i · n}` with the jump `[φ] = φ_inside - φ_outside` and the
/// average `{φ} = (φ_inside + φ_outside) / 2`, where `n` is the unit outer normal of the inside
/// entity. On boundary intersections jump and average reduce to the trace, which imposes
/// Dirichlet conditions weakly. Combine with [`JumpPenalty`](super::JumpPenalty) for a coercive
/// operator, and with [`EllipticIpdgDirichlet`] for the matching right hand side.
#[derive(Debug, Clone)]
pub struct EllipticIpdgConsistency<F> {
    diffusion: F,
}

impl<F> EllipticIpdgConsistency<F> {
    pub fn new(diffusion: F) -> Self {
        Self { diffusion }
    }
}

impl<T, F> CouplingBilinearEvaluation<T> for EllipticIpdgConsistency<F>
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
        self.diffusion.order() + test_order + ansatz_order
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
        ensure_scalar(&[test_inside, ansatz_inside, test_outside, ansatz_outside])?;
        let outside = point
            .outside
            .ok_or_else(|| eyre!("interior penalty consistency on intersection without outside entity"))?;

        basis.test.populate_values(test_inside, point.inside);
        basis.test.populate_gradients(test_inside, point.inside);
        basis.ansatz.populate_values(ansatz_inside, point.inside);
        basis.ansatz.populate_gradients(ansatz_inside, point.inside);
        basis.test_outside.populate_values(test_outside, outside);
        basis.test_outside.populate_gradients(test_outside, outside);
        basis.ansatz_outside.populate_values(ansatz_outside, outside);
        basis.ansatz_outside.populate_gradients(ansatz_outside, outside);

        let face = intersection.geometry();
        let normal = intersection.unit_outer_normal(point.face);
        let half_a = self.diffusion.evaluate(&face.global(point.face)) * convert::<f64, T>(0.5);

        let (ti, ai) = (basis.test.values(), basis.ansatz.values());
        let (to, ao) = (basis.test_outside.values(), basis.ansatz_outside.values());
        let dti = normal_derivatives(basis.test.gradients(), &normal);
        let dai = normal_derivatives(basis.ansatz.gradients(), &normal);
        let dto = normal_derivatives(basis.test_outside.gradients(), &normal);
        let dao = normal_derivatives(basis.ansatz_outside.gradients(), &normal);

        let CouplingMatrixBlocks {
            mut inside_inside,
            mut outside_outside,
            mut inside_outside,
            mut outside_inside,
        } = result;
        inside_inside.gemm_tr(-half_a, ti, &dai, T::zero());
        inside_inside.gemm_tr(-half_a, &dti, ai, T::one());
        outside_outside.gemm_tr(half_a, to, &dao, T::zero());
        outside_outside.gemm_tr(half_a, &dto, ao, T::one());
        inside_outside.gemm_tr(-half_a, ti, &dao, T::zero());
        inside_outside.gemm_tr(half_a, &dti, ao, T::one());
        outside_inside.gemm_tr(half_a, to, &dai, T::zero());
        outside_inside.gemm_tr(-half_a, &dto, ai, T::one());
        Ok(())
    }
}

impl<T, F> BoundaryBilinearEvaluation<T> for EllipticIpdgConsistency<F>
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
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        ensure_scalar(&[test, ansatz])?;
        basis.test.populate_values(test, point.inside);
        basis.test.populate_gradients(test, point.inside);
        basis.ansatz.populate_values(ansatz, point.inside);
        basis.ansatz.populate_gradients(ansatz, point.inside);

        let face = intersection.geometry();
        let normal = intersection.unit_outer_normal(point.face);
        let a = self.diffusion.evaluate(&face.global(point.face));
        let dt = normal_derivatives(basis.test.gradients(), &normal);
        let da = normal_derivatives(basis.ansatz.gradients(), &normal);
        result.gemm_tr(-a, basis.test.values(), &da, T::zero());
        result.gemm_tr(-a, &dt, basis.ansatz.values(), T::one());
        Ok(())
    }
}

/// Right hand side for weakly imposed Dirichlet data `g` in the interior penalty discretization:
/// `g (σ / h φ_i - a ∇φ_i · n)` with `h = |K| / |F|` as in [`JumpPenalty`](super::JumpPenalty).
#[derive(Debug, Clone)]
pub struct EllipticIpdgDirichlet<G, F, P> {
    dirichlet: G,
    diffusion: F,
    penalty: P,
}

impl<G, F, P> EllipticIpdgDirichlet<G, F, P> {
    pub fn new(dirichlet: G, diffusion: F, penalty: P) -> Self {
        Self {
            dirichlet,
            diffusion,
            penalty,
        }
    }
}

impl<T, G, F, P> FaceLinearEvaluation<T> for EllipticIpdgDirichlet<G, F, P>
where
    T: Real,
    G: Function<T>,
    F: Function<T>,
    P: Function<T>,
{
    fn order(&self, test: &dyn BaseFunctionSet<T>) -> usize {
        let data_order = self.diffusion.order().max(self.penalty.order());
        self.dirichlet.order() + data_order + test.order()
    }

    fn evaluate(
        &self,
        test: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        point: FacePoint<T>,
        basis: &mut BasisBuffers<T>,
        mut result: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        ensure_scalar(&[test])?;
        basis.test.populate_values(test, point.inside);
        basis.test.populate_gradients(test, point.inside);

        let face = intersection.geometry();
        let x = face.global(point.face);
        let normal = intersection.unit_outer_normal(point.face);
        let h = test.geometry().volume() / face.volume();
        let g = self.dirichlet.evaluate(&x);
        let sigma = self.penalty.evaluate(&x) / h;
        let a = self.diffusion.evaluate(&x);

        let derivatives = normal_derivatives(basis.test.gradients(), &normal);
        let values = basis.test.values().row(0);
        for ((r, &phi), &dphi) in result.iter_mut().zip(values.iter()).zip(derivatives.iter()) {
            *r = g * (sigma * phi - a * dphi);
        }
        Ok(())
    }
}
