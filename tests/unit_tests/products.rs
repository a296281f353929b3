use fenris_gdt::function::{ConstantFunction, LambdaFunction};
use fenris_gdt::grid::StructuredGrid;
use fenris_gdt::products::{boundary_l2_product_matrix, elliptic_matrix, l2_product_matrix};
use fenris_gdt::space::{
    ContinuousLagrangeSpace, DiscontinuousLagrangeSpace, DiscreteFunctionSpace, FiniteVolumeSpace, Mapper,
};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};

#[test]
fn finite_volume_mass_matrix_is_diagonal_of_volumes() {
    let grid = StructuredGrid::<f64>::new(&[0.0, 0.0], &[2.0, 1.0], &[4, 2]);
    let space = FiniteVolumeSpace::new(&grid);
    let mass = DMatrix::from(&l2_product_matrix(&grid, &space).unwrap());
    assert_matrix_eq!(mass, DMatrix::from_diagonal_element(8, 8, 0.25), comp = abs, tol = 1e-14);
}

#[test]
fn mass_matrices_integrate_constants() {
    let grid = StructuredGrid::<f64>::new(&[0.0, 0.0], &[2.0, 1.0], &[4, 3]);
    for degree in 1..=2 {
        let space = DiscontinuousLagrangeSpace::new(&grid, degree);
        let one = DVector::repeat(space.mapper().size(), 1.0);
        let mass = l2_product_matrix(&grid, &space).unwrap();
        assert_scalar_eq!(one.dot(&(&mass * &one)), 2.0, comp = abs, tol = 1e-12);

        let boundary_mass = boundary_l2_product_matrix(&grid, &space).unwrap();
        assert_scalar_eq!(one.dot(&(&boundary_mass * &one)), 6.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn boundary_mass_ignores_periodic_faces() {
    let grid = StructuredGrid::<f64>::with_periodicity(&[0.0, 0.0], &[2.0, 1.0], &[4, 3], &[true, false]);
    let space = ContinuousLagrangeSpace::new(&grid);
    let one = DVector::repeat(space.mapper().size(), 1.0);
    let boundary_mass = boundary_l2_product_matrix(&grid, &space).unwrap();
    // Only the bottom and top faces of length 2
    assert_scalar_eq!(one.dot(&(&boundary_mass * &one)), 4.0, comp = abs, tol = 1e-12);
}

#[test]
fn elliptic_matrix_annihilates_constants() {
    let grid = StructuredGrid::<f64>::unit_cube(2, 4);
    let space = ContinuousLagrangeSpace::new(&grid);
    let stiffness = elliptic_matrix(&grid, &space, ConstantFunction::new(2.0)).unwrap();
    let one = DVector::repeat(space.mapper().size(), 1.0);
    assert!((&stiffness * &one).amax() <= 1e-13);

    // The energy of u = x is ∫ 2 |∇u|^2 = 2
    let u = space.interpolate(&LambdaFunction::new(1, |x: &DVector<f64>| x[0]));
    assert_scalar_eq!(u.dot(&(&stiffness * &u)), 2.0, comp = abs, tol = 1e-12);
}

#[test]
fn product_matrices_are_symmetric() {
    let grid = StructuredGrid::<f64>::new(&[-1.0, 0.0, 0.0], &[1.0, 1.0, 0.5], &[2, 2, 1]);
    let space = ContinuousLagrangeSpace::new(&grid);
    let diffusion = LambdaFunction::new(1, |x: &DVector<f64>| 2.0 + x[0]);
    for matrix in [
        l2_product_matrix(&grid, &space).unwrap(),
        boundary_l2_product_matrix(&grid, &space).unwrap(),
        elliptic_matrix(&grid, &space, &diffusion).unwrap(),
    ] {
        let dense = DMatrix::from(&matrix);
        assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-13);
    }
}
