use crate::assembly::buffers::ScratchPool;
use crate::assembly::local::{
    BoundaryBilinearEvaluation, CouplingBilinearEvaluation, CouplingMatrixBlocks, FaceLinearEvaluation, FacePoint,
    LocalBoundaryMatrixOperator, LocalCouplingMatrixOperator, LocalFaceVectorOperator, LocalVolumeMatrixOperator,
    LocalVolumeVectorOperator, VolumeBilinearEvaluation, VolumeLinearEvaluation,
};
use crate::grid::Intersection;
use crate::quadrature::{GaussQuadrature, QuadratureProvider, QuadratureRule, ReferenceShape};
use crate::space::BaseFunctionSet;
use crate::Real;
use eyre::{eyre, WrapErr};
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut};

macro_rules! impl_integral_builder {
    ($integral:ident) => {
        impl<E> $integral<E> {
            pub fn new(evaluation: E) -> Self {
                Self {
                    evaluation,
                    quadrature: GaussQuadrature,
                    over_integrate: 0,
                }
            }
        }

        impl<E, Q> $integral<E, Q> {
            /// Raises the quadrature order above the order of the integrand.
            pub fn with_over_integrate(mut self, over_integrate: usize) -> Self {
                self.over_integrate = over_integrate;
                self
            }

            pub fn with_quadrature<Q2>(self, quadrature: Q2) -> $integral<E, Q2> {
                $integral {
                    evaluation: self.evaluation,
                    quadrature,
                    over_integrate: self.over_integrate,
                }
            }

            pub fn evaluation(&self) -> &E {
                &self.evaluation
            }

            pub fn over_integrate(&self) -> usize {
                self.over_integrate
            }
        }
    };
}

/// Integral of a bilinear evaluation over an entity.
#[derive(Debug, Clone)]
pub struct Codim0Integral<E, Q = GaussQuadrature> {
    evaluation: E,
    quadrature: Q,
    over_integrate: usize,
}

/// Integral of a linear evaluation over an entity.
#[derive(Debug, Clone)]
pub struct Codim0FunctionalIntegral<E, Q = GaussQuadrature> {
    evaluation: E,
    quadrature: Q,
    over_integrate: usize,
}

/// Integral of a coupling evaluation over an intersection with a neighbor.
#[derive(Debug, Clone)]
pub struct Codim1CouplingIntegral<E, Q = GaussQuadrature> {
    evaluation: E,
    quadrature: Q,
    over_integrate: usize,
}

/// Integral of a bilinear evaluation over an intersection, seen from the inside entity.
#[derive(Debug, Clone)]
pub struct Codim1BoundaryIntegral<E, Q = GaussQuadrature> {
    evaluation: E,
    quadrature: Q,
    over_integrate: usize,
}

/// Integral of a linear evaluation over an intersection, seen from the inside entity.
#[derive(Debug, Clone)]
pub struct Codim1FunctionalIntegral<E, Q = GaussQuadrature> {
    evaluation: E,
    quadrature: Q,
    over_integrate: usize,
}

impl_integral_builder!(Codim0Integral);
impl_integral_builder!(Codim0FunctionalIntegral);
impl_integral_builder!(Codim1CouplingIntegral);
impl_integral_builder!(Codim1BoundaryIntegral);
impl_integral_builder!(Codim1FunctionalIntegral);

fn quadrature_rule<T: Real>(
    quadrature: &impl QuadratureProvider<T>,
    shape: ReferenceShape,
    order: usize,
) -> eyre::Result<QuadratureRule<T>> {
    quadrature
        .rule(shape, order)
        .wrap_err_with(|| format!("no quadrature rule of order {order} on {shape:?}"))
}

fn tmp_matrix<T: Real>(matrices: &mut [DMatrix<T>], rows: usize, cols: usize) -> &mut DMatrix<T> {
    let Some(matrix) = matrices.first_mut() else {
        panic!("Local operator requires a temporary matrix, but the scratch pool holds none");
    };
    assert_tmp_shape(matrix, rows, cols);
    matrix
}

fn tmp_vector<T: Real>(vectors: &mut [DVector<T>], len: usize) -> &mut DVector<T> {
    let Some(vector) = vectors.first_mut() else {
        panic!("Local operator requires a temporary vector, but the scratch pool holds none");
    };
    assert!(
        vector.len() >= len,
        "Temporary vector of length {} is too small for a local vector of length {len}",
        vector.len()
    );
    vector
}

fn assert_tmp_shape<T: Real>(matrix: &DMatrix<T>, rows: usize, cols: usize) {
    assert!(
        matrix.nrows() >= rows && matrix.ncols() >= cols,
        "Temporary matrix of size {:?} is too small for a local block of size {:?}",
        matrix.shape(),
        (rows, cols)
    );
}

fn assert_block_shape<T: Real>(
    block: &DMatrixViewMut<T>,
    test: &dyn BaseFunctionSet<T>,
    ansatz: &dyn BaseFunctionSet<T>,
) {
    assert_eq!(
        block.shape(),
        (test.size(), ansatz.size()),
        "Local block must have one row per test function and one column per ansatz function"
    );
}

impl<T, E, Q> LocalVolumeMatrixOperator<T> for Codim0Integral<E, Q>
where
    T: Real,
    E: VolumeBilinearEvaluation<T>,
    Q: QuadratureProvider<T>,
{
    fn num_tmp_objects_required(&self) -> usize {
        1
    }

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        mut output: DMatrixViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()> {
        assert_block_shape(&output, test, ansatz);
        let shape @ (rows, cols) = output.shape();
        let geometry = test.geometry();
        let order = self.evaluation.order(test, ansatz) + self.over_integrate;
        let rule = quadrature_rule(&self.quadrature, geometry.reference_shape(), order)?;

        let (matrices, _, basis) = pool.split_mut();
        let tmp = tmp_matrix(matrices, rows, cols);
        for (w, x) in rule.iter() {
            self.evaluation
                .evaluate(test, ansatz, x, basis, tmp.view_mut((0, 0), shape))?;
            let factor = w * geometry.integration_element(x);
            output.zip_apply(&tmp.view((0, 0), shape), |out, value| *out += factor * value);
        }
        Ok(())
    }
}

impl<T, E, Q> LocalVolumeVectorOperator<T> for Codim0FunctionalIntegral<E, Q>
where
    T: Real,
    E: VolumeLinearEvaluation<T>,
    Q: QuadratureProvider<T>,
{
    fn num_tmp_objects_required(&self) -> usize {
        1
    }

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        mut output: DVectorViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()> {
        assert_eq!(output.len(), test.size(), "Local vector must have one entry per test function");
        let len = output.len();
        let geometry = test.geometry();
        let order = self.evaluation.order(test) + self.over_integrate;
        let rule = quadrature_rule(&self.quadrature, geometry.reference_shape(), order)?;

        let (_, vectors, basis) = pool.split_mut();
        let tmp = tmp_vector(vectors, len);
        for (w, x) in rule.iter() {
            self.evaluation
                .evaluate(test, x, basis, tmp.rows_mut(0, len))?;
            let factor = w * geometry.integration_element(x);
            output.axpy(factor, &tmp.rows(0, len), T::one());
        }
        Ok(())
    }
}

impl<T, E, Q> LocalCouplingMatrixOperator<T> for Codim1CouplingIntegral<E, Q>
where
    T: Real,
    E: CouplingBilinearEvaluation<T>,
    Q: QuadratureProvider<T>,
{
    fn num_tmp_objects_required(&self) -> usize {
        4
    }

    fn apply(
        &self,
        test_inside: &dyn BaseFunctionSet<T>,
        ansatz_inside: &dyn BaseFunctionSet<T>,
        test_outside: &dyn BaseFunctionSet<T>,
        ansatz_outside: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        output: CouplingMatrixBlocks<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()> {
        let CouplingMatrixBlocks {
            mut inside_inside,
            mut outside_outside,
            mut inside_outside,
            mut outside_inside,
        } = output;
        assert_block_shape(&inside_inside, test_inside, ansatz_inside);
        assert_block_shape(&outside_outside, test_outside, ansatz_outside);
        assert_block_shape(&inside_outside, test_inside, ansatz_outside);
        assert_block_shape(&outside_inside, test_outside, ansatz_inside);

        let face = intersection.geometry();
        let inside_embedding = intersection.geometry_in_inside();
        let outside_embedding = intersection
            .geometry_in_outside()
            .ok_or_else(|| eyre!("coupling integral on intersection without outside entity"))?;
        let order = self
            .evaluation
            .order(test_inside, ansatz_inside, test_outside, ansatz_outside)
            + self.over_integrate;
        let rule = quadrature_rule(&self.quadrature, face.reference_shape(), order)?;

        let (matrices, _, basis) = pool.split_mut();
        let num_matrices = matrices.len();
        let [ii, oo, io, oi, ..] = matrices else {
            panic!("Coupling integral requires 4 temporary matrices, but the scratch pool holds {num_matrices}");
        };
        let (shape_ii, shape_oo) = (inside_inside.shape(), outside_outside.shape());
        let (shape_io, shape_oi) = (inside_outside.shape(), outside_inside.shape());
        assert_tmp_shape(ii, shape_ii.0, shape_ii.1);
        assert_tmp_shape(oo, shape_oo.0, shape_oo.1);
        assert_tmp_shape(io, shape_io.0, shape_io.1);
        assert_tmp_shape(oi, shape_oi.0, shape_oi.1);

        for (w, x) in rule.iter() {
            let x_inside = inside_embedding.global(x);
            let x_outside = outside_embedding.global(x);
            let point = FacePoint {
                face: x,
                inside: &x_inside,
                outside: Some(&x_outside),
            };
            let blocks = CouplingMatrixBlocks {
                inside_inside: ii.view_mut((0, 0), shape_ii),
                outside_outside: oo.view_mut((0, 0), shape_oo),
                inside_outside: io.view_mut((0, 0), shape_io),
                outside_inside: oi.view_mut((0, 0), shape_oi),
            };
            self.evaluation.evaluate(
                test_inside,
                ansatz_inside,
                test_outside,
                ansatz_outside,
                intersection,
                point,
                basis,
                blocks,
            )?;
            let factor = w * face.integration_element(x);
            inside_inside.zip_apply(&ii.view((0, 0), shape_ii), |out, value| *out += factor * value);
            outside_outside.zip_apply(&oo.view((0, 0), shape_oo), |out, value| *out += factor * value);
            inside_outside.zip_apply(&io.view((0, 0), shape_io), |out, value| *out += factor * value);
            outside_inside.zip_apply(&oi.view((0, 0), shape_oi), |out, value| *out += factor * value);
        }
        Ok(())
    }
}

impl<T, E, Q> LocalBoundaryMatrixOperator<T> for Codim1BoundaryIntegral<E, Q>
where
    T: Real,
    E: BoundaryBilinearEvaluation<T>,
    Q: QuadratureProvider<T>,
{
    fn num_tmp_objects_required(&self) -> usize {
        1
    }

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        ansatz: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        mut output: DMatrixViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()> {
        assert_block_shape(&output, test, ansatz);
        let shape @ (rows, cols) = output.shape();
        let face = intersection.geometry();
        let inside_embedding = intersection.geometry_in_inside();
        let order = self.evaluation.order(test, ansatz) + self.over_integrate;
        let rule = quadrature_rule(&self.quadrature, face.reference_shape(), order)?;

        let (matrices, _, basis) = pool.split_mut();
        let tmp = tmp_matrix(matrices, rows, cols);
        for (w, x) in rule.iter() {
            let x_inside = inside_embedding.global(x);
            let point = FacePoint {
                face: x,
                inside: &x_inside,
                outside: None,
            };
            self.evaluation
                .evaluate(test, ansatz, intersection, point, basis, tmp.view_mut((0, 0), shape))?;
            let factor = w * face.integration_element(x);
            output.zip_apply(&tmp.view((0, 0), shape), |out, value| *out += factor * value);
        }
        Ok(())
    }
}

impl<T, E, Q> LocalFaceVectorOperator<T> for Codim1FunctionalIntegral<E, Q>
where
    T: Real,
    E: FaceLinearEvaluation<T>,
    Q: QuadratureProvider<T>,
{
    fn num_tmp_objects_required(&self) -> usize {
        1
    }

    fn apply(
        &self,
        test: &dyn BaseFunctionSet<T>,
        intersection: &dyn Intersection<T>,
        mut output: DVectorViewMut<T>,
        pool: &mut ScratchPool<T>,
    ) -> eyre::Result<()> {
        assert_eq!(output.len(), test.size(), "Local vector must have one entry per test function");
        let len = output.len();
        let face = intersection.geometry();
        let inside_embedding = intersection.geometry_in_inside();
        let order = self.evaluation.order(test) + self.over_integrate;
        let rule = quadrature_rule(&self.quadrature, face.reference_shape(), order)?;

        let (_, vectors, basis) = pool.split_mut();
        let tmp = tmp_vector(vectors, len);
        for (w, x) in rule.iter() {
            let x_inside = inside_embedding.global(x);
            let point = FacePoint {
                face: x,
                inside: &x_inside,
                outside: None,
            };
            self.evaluation
                .evaluate(test, intersection, point, basis, tmp.rows_mut(0, len))?;
            let factor = w * face.integration_element(x);
            output.axpy(factor, &tmp.rows(0, len), T::one());
        }
        Ok(())
    }
}
