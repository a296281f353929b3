use fenris_gdt::flux::{
    normal_flux, normal_jacobian, real_eigen_decomposition, BurgersFlux, EngquistOsher, FluxError, FluxFunction,
    LambdaFluxFunction, LaxFriedrichs, LinearSystemFlux, LinearTransportFlux, NumericalFlux, NumericalLambdaFlux,
    Parameter, Upwind, Vijayasundaram,
};
use fenris_gdt::proptest::{state, unit_normal};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{dmatrix, dvector, DMatrix, DVector};
use proptest::prelude::*;
use std::sync::Arc;

fn transport(velocity: DVector<f64>) -> Arc<dyn FluxFunction<f64>> {
    Arc::new(LinearTransportFlux::new(velocity))
}

fn burgers(direction: DVector<f64>) -> Arc<dyn FluxFunction<f64>> {
    Arc::new(BurgersFlux::new(direction))
}

/// The symmetric wave system `u_t + A u_x = 0` with `A = [[0, 1], [1, 0]]`.
fn wave_system() -> Arc<dyn FluxFunction<f64>> {
    Arc::new(LinearSystemFlux::new(vec![dmatrix![0.0, 1.0; 1.0, 0.0]]))
}

#[test]
fn parameter_lookup() {
    let param = Parameter::new()
        .with("t", vec![0.5])
        .with("velocity", vec![1.0, 2.0]);
    assert_eq!(param.scalar("t"), Some(0.5));
    assert_eq!(param.scalar("velocity"), None);
    assert_eq!(param.get("velocity"), Some(&[1.0, 2.0][..]));
    assert_eq!(param.get("mu"), None);
    assert_eq!(param.keys().collect::<Vec<_>>(), vec!["t", "velocity"]);
    assert!(Parameter::<f64>::default().is_empty());
}

#[test]
fn scalar_fluxes_evaluate_to_one_row_per_state() {
    let param = Parameter::default();
    let u = dvector![3.0];
    let transport = LinearTransportFlux::new(dvector![1.0, -2.0, 0.5]);
    assert_eq!(transport.evaluate(&u, &param), dmatrix![3.0, -6.0, 1.5]);
    let burgers = BurgersFlux::new(dvector![2.0, 1.0]);
    assert_eq!(burgers.evaluate(&u, &param), dmatrix![9.0, 4.5]);
}

#[test]
fn normal_flux_and_jacobian_of_burgers() {
    let flux = BurgersFlux::new(dvector![1.0, 2.0]);
    let param = Parameter::default();
    let n = dvector![0.6, 0.8];
    let u = dvector![3.0];
    // f(u) n = u^2 / 2 (a · n), f'(u) n = u (a · n)
    assert_matrix_eq!(normal_flux(&flux, &u, &n, &param), dvector![4.5 * 2.2], comp = abs, tol = 1e-13);
    assert_matrix_eq!(normal_jacobian(&flux, &u, &n, &param), dmatrix![3.0 * 2.2], comp = abs, tol = 1e-13);
}

#[test]
fn scalar_fluxes_reject_systems() {
    let constructors: [fn(Arc<dyn FluxFunction<f64>>) -> Result<(), FluxError>; 3] = [
        |f| Upwind::new(f).map(|_| ()),
        |f| LaxFriedrichs::new(f).map(|_| ()),
        |f| EngquistOsher::new(f).map(|_| ()),
    ];
    for constructor in constructors {
        let result = constructor(wave_system());
        assert!(matches!(
            result,
            Err(FluxError::NotAvailableForDimensions {
                domain_dim: 1,
                state_dim: 2,
                ..
            })
        ));
    }
}

#[test]
fn upwind_selects_state_from_flow_direction() {
    let upwind = Upwind::new(transport(dvector![2.0, -1.0])).unwrap();
    let param = Parameter::default();
    let (u, v) = (dvector![3.0], dvector![-5.0]);

    // n · a = 2 > 0 takes the inside state
    let g = upwind.apply(&u, &v, &dvector![1.0, 0.0], &param).unwrap();
    assert_matrix_eq!(g, dvector![6.0], comp = abs, tol = 1e-14);

    // n · a = -1 < 0 takes the outside state
    let g = upwind.apply(&u, &v, &dvector![0.0, 1.0], &param).unwrap();
    assert_matrix_eq!(g, dvector![5.0], comp = abs, tol = 1e-14);
}

#[test]
fn upwind_takes_outside_state_for_vanishing_derivative() {
    // Flux value f(u) = u, but a jacobian that claims f' = 0
    let flux = LambdaFluxFunction::new(
        1,
        1,
        1,
        |u: &DVector<f64>, _: &Parameter<f64>| DMatrix::from_element(1, 1, u[0]),
        |_: &DVector<f64>, _: &Parameter<f64>| vec![DMatrix::zeros(1, 1)],
    );
    let upwind = Upwind::new(Arc::new(flux)).unwrap();
    let g = upwind
        .apply(&dvector![1.0], &dvector![7.0], &dvector![1.0], &Parameter::default())
        .unwrap();
    assert_matrix_eq!(g, dvector![7.0]);
}

#[test]
fn upwind_uses_mean_state_for_nonlinear_flux() {
    let upwind = Upwind::new(burgers(dvector![1.0])).unwrap();
    let param = Parameter::default();
    let n = dvector![1.0];
    // Mean state 0.5 > 0, so the inside state is upwind
    let g = upwind.apply(&dvector![2.0], &dvector![-1.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![2.0], comp = abs, tol = 1e-14);
    // Mean state -0.5 < 0
    let g = upwind.apply(&dvector![1.0], &dvector![-2.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![2.0], comp = abs, tol = 1e-14);
    let g = upwind.apply(&dvector![3.0], &dvector![-4.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![8.0], comp = abs, tol = 1e-14);
}

#[test]
fn lax_friedrichs_of_linear_transport() {
    let lf = LaxFriedrichs::new(transport(dvector![1.0, -3.0])).unwrap();
    let n = dvector![0.0, 1.0];
    let (u, v) = (dvector![2.0], dvector![1.0]);
    // Central part 1/2 (2 + 1) (-3), dissipation 1/2 (2 - 1) (|1| + |-3|)
    let g = lf.apply(&u, &v, &n, &Parameter::default()).unwrap();
    assert_matrix_eq!(g, dvector![-4.5 + 2.0], comp = abs, tol = 1e-14);
}

#[test]
fn lax_friedrichs_with_vanishing_jacobian_is_degenerate() {
    let lf = LaxFriedrichs::new(burgers(dvector![1.0])).unwrap();
    let result = lf.apply(&dvector![0.0], &dvector![0.0], &dvector![1.0], &Parameter::default());
    assert_eq!(result, Err(FluxError::DegenerateDissipation));

    let lf = LaxFriedrichs::new(transport(dvector![0.0, 0.0])).unwrap();
    let result = lf.apply(&dvector![1.0], &dvector![2.0], &dvector![1.0, 0.0], &Parameter::default());
    assert_eq!(result, Err(FluxError::DegenerateDissipation));
}

#[test]
fn engquist_osher_for_burgers() {
    let eo = EngquistOsher::new(burgers(dvector![1.0])).unwrap();
    let param = Parameter::default();
    let n = dvector![1.0];
    // Both states right-moving: the flux of the inside state
    let g = eo.apply(&dvector![2.0], &dvector![1.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![2.0], comp = abs, tol = 1e-13);
    // Transonic shock: int_0^1 s ds + int_0^-1 s ds
    let g = eo.apply(&dvector![1.0], &dvector![-1.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![1.0], comp = abs, tol = 1e-13);
    // Transonic rarefaction: both integrals vanish
    let g = eo.apply(&dvector![-1.0], &dvector![1.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![0.0], comp = abs, tol = 1e-13);
    // Both states left-moving: the integral runs from 0 down to the state, giving f(v)
    let g = eo.apply(&dvector![-2.0], &dvector![-2.0], &n, &param).unwrap();
    assert_matrix_eq!(g, dvector![2.0], comp = abs, tol = 1e-13);
}

#[test]
fn vijayasundaram_splits_wave_system() {
    let flux = Vijayasundaram::new(wave_system()).unwrap();
    assert_eq!(flux.state_dim(), 2);
    let (u, v) = (dvector![1.0, 2.0], dvector![3.0, -1.0]);
    // A+ = (A + I) / 2 and A- = (A - I) / 2
    let g = flux.apply(&u, &v, &dvector![1.0], &Parameter::default()).unwrap();
    assert_matrix_eq!(g, dvector![-0.5, 3.5], comp = abs, tol = 1e-12);

    // Flipping the normal swaps the roles of the characteristics
    let g = flux.apply(&u, &v, &dvector![-1.0], &Parameter::default()).unwrap();
    assert_matrix_eq!(g, dvector![-1.5, -0.5], comp = abs, tol = 1e-12);
}

#[test]
fn vijayasundaram_with_custom_decomposition() {
    let flux = Vijayasundaram::new(wave_system())
        .unwrap()
        .with_eigen_decomposition(|p: &DMatrix<f64>| {
            let s = std::f64::consts::FRAC_1_SQRT_2;
            let eigenvectors = dmatrix![s, s; s, -s];
            let eigenvalues = dvector![p[(0, 1)], -p[(0, 1)]];
            Ok((eigenvalues, eigenvectors.clone(), eigenvectors))
        });
    let g = flux
        .apply(&dvector![1.0, 2.0], &dvector![3.0, -1.0], &dvector![1.0], &Parameter::default())
        .unwrap();
    assert_matrix_eq!(g, dvector![-0.5, 3.5], comp = abs, tol = 1e-12);
}

#[test]
fn vijayasundaram_rejects_complex_eigenvalues() {
    let rotation: Arc<dyn FluxFunction<f64>> = Arc::new(LinearSystemFlux::new(vec![dmatrix![0.0, -1.0; 1.0, 0.0]]));
    let flux = Vijayasundaram::new(rotation).unwrap();
    let result = flux.apply(&dvector![1.0, 0.0], &dvector![0.0, 1.0], &dvector![1.0], &Parameter::default());
    assert!(matches!(result, Err(FluxError::EigenDecomposition { .. })));
}

#[test]
fn real_eigen_decomposition_reconstructs_matrix() {
    let p = dmatrix![2.0, 1.0, 0.0;
                     0.0, -1.0, 3.0;
                     0.0, 0.0, 0.5];
    let (eigenvalues, eigenvectors, inverse) = real_eigen_decomposition(&p, 1e-10).unwrap();
    let reconstructed = &eigenvectors * DMatrix::from_diagonal(&eigenvalues) * &inverse;
    assert_matrix_eq!(reconstructed, p, comp = abs, tol = 1e-10);
    assert_matrix_eq!(&eigenvectors * &inverse, DMatrix::identity(3, 3), comp = abs, tol = 1e-10);

    // A Jordan block is not diagonalizable
    let jordan = dmatrix![1.0, 1.0; 0.0, 1.0];
    assert!(matches!(
        real_eigen_decomposition(&jordan, 1e-10),
        Err(FluxError::EigenDecomposition { .. })
    ));
}

#[test]
fn lambda_flux_is_cloneable_behind_box() {
    let g = |u: &DVector<f64>, v: &DVector<f64>, n: &DVector<f64>, p: &Parameter<f64>| {
        let t = p.scalar("t").unwrap_or(0.0);
        dvector![u[0] - v[0] + n[1] + t]
    };
    let flux = NumericalLambdaFlux::new(1, 2, g);
    let boxed: Box<dyn NumericalFlux<f64>> = Box::new(flux);
    let cloned = boxed.clone();
    let param = Parameter::new().with("t", vec![10.0]);
    let g = cloned
        .apply(&dvector![3.0], &dvector![1.0], &dvector![0.0, 1.0], &param)
        .unwrap();
    assert_matrix_eq!(g, dvector![13.0]);
    assert_eq!(cloned.domain_dim(), 2);
}

proptest! {
    #[test]
    fn lax_friedrichs_is_consistent(u in state(1), n in unit_normal(2)) {
        let flux = burgers(dvector![1.0, -0.5]);
        let lf = LaxFriedrichs::new(flux.clone()).unwrap();
        let param = Parameter::default();
        prop_assume!(u[0].abs() > 1e-8);
        let g = lf.apply(&u, &u, &n, &param).unwrap();
        let expected = normal_flux(flux.as_ref(), &u, &n, &param);
        prop_assert!((g - expected).norm() <= 1e-12);
    }

    #[test]
    fn fluxes_are_consistent_for_linear_transport(u in state(1), n in unit_normal(2)) {
        let flux = transport(dvector![1.0, -2.0]);
        let param = Parameter::default();
        let expected = normal_flux(flux.as_ref(), &u, &n, &param);
        let fluxes: Vec<Box<dyn NumericalFlux<f64>>> = vec![
            Box::new(Upwind::new(flux.clone()).unwrap()),
            Box::new(LaxFriedrichs::new(flux.clone()).unwrap()),
            Box::new(EngquistOsher::new(flux.clone()).unwrap()),
            Box::new(Vijayasundaram::new(flux.clone()).unwrap()),
        ];
        for numerical_flux in fluxes {
            let g = numerical_flux.apply(&u, &u, &n, &param).unwrap();
            prop_assert!((g - &expected).norm() <= 1e-10 * (1.0 + expected.norm()));
        }
    }

    #[test]
    fn engquist_osher_reduces_to_upwind_for_linear_flux(u in state(1), v in state(1), n in unit_normal(2)) {
        let flux = transport(dvector![1.0, -2.0]);
        let param = Parameter::default();
        let upwind = Upwind::new(flux.clone()).unwrap().apply(&u, &v, &n, &param).unwrap();
        let eo = EngquistOsher::new(flux).unwrap().apply(&u, &v, &n, &param).unwrap();
        prop_assert!((upwind - eo).norm() <= 1e-10);
    }

    #[test]
    fn fluxes_are_conservative(u in state(1), v in state(1), n in unit_normal(1)) {
        // g(u, v, n) = -g(v, u, -n)
        let flux = burgers(dvector![1.0]);
        let param = Parameter::default();
        let lf = LaxFriedrichs::new(flux.clone()).unwrap();
        prop_assume!(u[0].abs() + v[0].abs() > 1e-8);
        let forward = lf.apply(&u, &v, &n, &param).unwrap();
        let backward = lf.apply(&v, &u, &(-&n), &param).unwrap();
        prop_assert!((forward + backward).norm() <= 1e-10);

        let eo = EngquistOsher::new(flux).unwrap();
        let forward = eo.apply(&u, &v, &n, &param).unwrap();
        let backward = eo.apply(&v, &u, &(-&n), &param).unwrap();
        prop_assert!((forward + backward).norm() <= 1e-9);
    }
}
