//! Explicit finite volume discretizations of conservation laws `u_t + div f(u) = 0`.
use fenris_gdt::assembly::local::{AdvectionFvBoundaryOperator, AdvectionFvCouplingOperator};
use fenris_gdt::assembly::SystemAssembler;
use fenris_gdt::flux::{BurgersFlux, FluxFunction, LaxFriedrichs, LinearTransportFlux, NumericalFlux, Upwind};
use fenris_gdt::grid::{GridView, StructuredGrid};
use fenris_gdt::space::{DiscreteFunctionSpace, FiniteVolumeSpace, Mapper};
use matrixcompare::assert_matrix_eq;
use nalgebra::{dvector, DVector};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

fn upwind(velocity: DVector<f64>) -> Upwind<f64> {
    Upwind::new(Arc::new(LinearTransportFlux::new(velocity))).unwrap()
}

/// Evaluates the discrete divergence `div f(u_h)` on a grid without non-periodic boundary.
fn periodic_divergence(
    grid: &StructuredGrid<f64>,
    space: &FiniteVolumeSpace<f64, StructuredGrid<f64>>,
    flux: impl NumericalFlux<f64> + 'static,
    u: &DVector<f64>,
    num_partitions: Option<usize>,
) -> DVector<f64> {
    let mut range = DVector::zeros(u.len());
    {
        let mut assembler = SystemAssembler::from_space(space, grid);
        let operator = AdvectionFvCouplingOperator::new(flux, space).unwrap();
        assembler.add_coupling_operator(operator, u, &mut range);
        match num_partitions {
            Some(n) => assembler.assemble_partitioned(n).unwrap(),
            None => assembler.assemble_serial().unwrap(),
        }
    }
    range
}

#[test]
fn periodic_upwind_euler_step() {
    let n = 16;
    let h = 1.0 / n as f64;
    let grid = StructuredGrid::with_periodicity(&[0.0], &[1.0], &[n], &[true]);
    let space = FiniteVolumeSpace::new(&grid);
    let u0 = space.interpolate(|x| dvector![(2.0 * PI * x[0]).sin()]);

    let range = periodic_divergence(&grid, &space, upwind(dvector![1.0]), &u0, None);
    let expected = DVector::from_fn(n, |i, _| (u0[i] - u0[(i + n - 1) % n]) / h);
    assert_matrix_eq!(range, expected, comp = abs, tol = 1e-12);

    let dt = 0.5 * h;
    let u1 = &u0 - dt * &range;
    let expected_u1 = DVector::from_fn(n, |i, _| 0.5 * u0[i] + 0.5 * u0[(i + n - 1) % n]);
    assert_matrix_eq!(u1, expected_u1, comp = abs, tol = 1e-12);

    // Upwinding conserves the total mass
    assert!((u1.sum() - u0.sum()).abs() < 1e-12);
}

#[test]
fn upwind_against_the_grid_direction() {
    let n = 8;
    let h = 2.0 / n as f64;
    let grid = StructuredGrid::with_periodicity(&[-1.0], &[1.0], &[n], &[true]);
    let space = FiniteVolumeSpace::new(&grid);
    let u = DVector::from_fn(n, |i, _| (i * i) as f64);
    let range = periodic_divergence(&grid, &space, upwind(dvector![-2.0]), &u, Some(3));
    let expected = DVector::from_fn(n, |i, _| -2.0 * (u[(i + 1) % n] - u[i]) / h);
    assert_matrix_eq!(range, expected, comp = abs, tol = 1e-12);
}

#[test]
fn transport_in_channel_with_walls() {
    // Periodic in x, walls at y = 0 and y = 1 with no flux through them
    let (nx, ny) = (6, 3);
    let grid = StructuredGrid::with_periodicity(&[0.0, 0.0], &[3.0, 1.0], &[nx, ny], &[true, false]);
    let space = FiniteVolumeSpace::new(&grid);
    let u = space.interpolate(|x| dvector![x[0] * x[0] + x[1]]);

    let range = Mutex::new(DVector::<f64>::zeros(u.len()));
    {
        let mut assembler = SystemAssembler::from_space(&space, &grid);
        let coupling = AdvectionFvCouplingOperator::new(upwind(dvector![1.0, 0.0]), &space).unwrap();
        let walls = AdvectionFvBoundaryOperator::by_custom_flux(&space, 1, |u: &DVector<f64>, n: &DVector<f64>, _: &_| {
            dvector![u[0] * n[0]]
        })
        .unwrap();
        assembler.add_coupling_operator(coupling, &u, &range);
        assembler.add_boundary_operator(walls, &u, &range);
        assembler.assemble().unwrap();
    }
    let range = range.into_inner().unwrap();

    // Every row of cells behaves like an independent one-dimensional problem
    let h = 3.0 / nx as f64;
    for j in 0..ny {
        for i in 0..nx {
            let cell = i + nx * j;
            let upstream = (i + nx - 1) % nx + nx * j;
            assert!((range[cell] - (u[cell] - u[upstream]) / h).abs() < 1e-12);
        }
    }
}

#[test]
fn constant_inflow_state_is_stationary() {
    let n = 5;
    let grid = StructuredGrid::new(&[0.0], &[1.0], &[n]);
    let space = FiniteVolumeSpace::new(&grid);
    let u = DVector::repeat(n, 1.0);

    let range = Mutex::new(DVector::<f64>::zeros(n));
    {
        let mut assembler = SystemAssembler::from_space(&space, &grid);
        let coupling = AdvectionFvCouplingOperator::new(upwind(dvector![1.0]), &space).unwrap();
        // Inflow of u = 1 on the left, outflow of the inside state on the right
        let boundary = AdvectionFvBoundaryOperator::by_boundary_state(
            upwind(dvector![1.0]),
            &space,
            |u: &DVector<f64>, x: &DVector<f64>, _: &_| if x[0] < 0.5 { dvector![1.0] } else { u.clone() },
        )
        .unwrap();
        assembler.add_coupling_operator(coupling, &u, &range);
        assembler.add_boundary_operator(boundary, &u, &range);
        assembler.assemble_partitioned(2).unwrap();
    }
    let range = range.into_inner().unwrap();
    assert!(range.amax() < 1e-14);
}

#[test]
fn lax_friedrichs_burgers_is_conservative() {
    let grid = StructuredGrid::with_periodicity(&[0.0, 0.0], &[1.0, 2.0], &[5, 7], &[true, true]);
    let space = FiniteVolumeSpace::new(&grid);
    let u = space.interpolate(|x| dvector![(PI * x[0]).cos() + x[1] * x[1]]);
    let burgers: Arc<dyn FluxFunction<f64>> = Arc::new(BurgersFlux::new(dvector![1.0, -0.5]));

    let serial = periodic_divergence(&grid, &space, LaxFriedrichs::new(burgers.clone()).unwrap(), &u, None);
    let partitioned = periodic_divergence(&grid, &space, LaxFriedrichs::new(burgers).unwrap(), &u, Some(4));
    assert_eq!(serial, partitioned);

    // All cells have the same volume, so the fluxes across the faces cancel in the sum
    let total: f64 = (0..grid.num_entities()).map(|cell| serial[cell]).sum();
    assert!(total.abs() < 1e-10);
    assert_eq!(space.mapper().size(), grid.num_entities());
}
