//! Assembly of complete systems, compared between serial and partitioned traversal.
use fenris_gdt::assembly::constraints::DirichletConstraints;
use fenris_gdt::assembly::local::{
    BoundarySource, Codim0FunctionalIntegral, Codim0Integral, Codim1BoundaryIntegral, Codim1CouplingIntegral,
    Codim1FunctionalIntegral, Elliptic, JumpPenalty, Product, SourceProduct,
};
use fenris_gdt::assembly::pattern::{csr_from_pattern, face_sparsity_pattern, volume_sparsity_pattern};
use fenris_gdt::assembly::{AssemblyOptions, SystemAssembler, TraversalMode};
use fenris_gdt::function::{ConstantFunction, LambdaFunction};
use fenris_gdt::grid::StructuredGrid;
use fenris_gdt::proptest::StructuredGridParams;
use fenris_gdt::space::{ContinuousLagrangeSpace, DiscontinuousLagrangeSpace, DiscreteFunctionSpace, Mapper};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use proptest::prelude::*;
use std::sync::Mutex;

/// Interior penalty system of a DG space: volume and face terms share one matrix.
fn assemble_interior_penalty(
    grid: &StructuredGrid<f64>,
    space: &DiscontinuousLagrangeSpace<f64, StructuredGrid<f64>>,
    mode: TraversalMode,
) -> (CsrMatrix<f64>, DVector<f64>) {
    let matrix = Mutex::new(csr_from_pattern(face_sparsity_pattern(grid, space, space)));
    let rhs = Mutex::new(DVector::zeros(space.mapper().size()));
    let diffusion = LambdaFunction::new(1, |x: &DVector<f64>| 1.0 + x.norm_squared());
    let source = LambdaFunction::new(2, |x: &DVector<f64>| x.iter().product::<f64>() - 1.0);
    {
        let options = AssemblyOptions {
            mode,
            clear_stack: true,
        };
        let mut assembler = SystemAssembler::from_space(space, grid).with_options(options);
        assembler.add_volume_matrix(Codim0Integral::new(Elliptic::new(&diffusion)), &matrix);
        assembler.add_volume_matrix(Codim0Integral::new(Product::new(ConstantFunction::new(0.5))), &matrix);
        let penalty = ConstantFunction::new(20.0);
        assembler.add_coupling_matrix(Codim1CouplingIntegral::new(JumpPenalty::new(penalty)), &matrix);
        assembler.add_boundary_matrix(Codim1BoundaryIntegral::new(JumpPenalty::new(penalty)), &matrix);
        assembler.add_volume_vector(Codim0FunctionalIntegral::new(SourceProduct::new(&source)), &rhs);
        assembler.add_face_vector(Codim1FunctionalIntegral::new(BoundarySource::new(ConstantFunction::new(2.0))), &rhs);
        assembler.assemble().unwrap();
    }
    (matrix.into_inner().unwrap(), rhs.into_inner().unwrap())
}

#[test]
fn partitioned_interior_penalty_matches_serial() {
    let grid = StructuredGrid::with_periodicity(&[0.0, -1.0], &[2.0, 1.0], &[5, 4], &[true, false]);
    let space = DiscontinuousLagrangeSpace::new(&grid, 1);
    let (serial_matrix, serial_rhs) = assemble_interior_penalty(&grid, &space, TraversalMode::Serial);
    for num_partitions in [1, 2, 3, 7, 20, 64] {
        let (matrix, rhs) = assemble_interior_penalty(&grid, &space, TraversalMode::Partitioned { num_partitions });
        // Identical traversal order gives bitwise identical results
        assert_eq!(matrix, serial_matrix);
        assert_eq!(rhs, serial_rhs);
    }
}

#[test]
fn interior_penalty_matrix_is_symmetric_and_annihilates_constants() {
    let grid = StructuredGrid::with_periodicity(&[0.0, 0.0], &[1.0, 1.0], &[4, 4], &[true, true]);
    let space = DiscontinuousLagrangeSpace::new(&grid, 2);
    let n = space.mapper().size();
    let matrix = Mutex::new(csr_from_pattern(face_sparsity_pattern(&grid, &space, &space)));
    {
        let mut assembler = SystemAssembler::from_space(&space, &grid);
        assembler.add_volume_matrix(Codim0Integral::new(Elliptic::new(ConstantFunction::one())), &matrix);
        assembler.add_coupling_matrix(
            Codim1CouplingIntegral::new(JumpPenalty::new(ConstantFunction::new(10.0))),
            &matrix,
        );
        assembler.assemble_partitioned(4).unwrap();
    }
    let dense = DMatrix::from(&matrix.into_inner().unwrap());
    assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-12);

    // A fully periodic domain has no boundary, so constants lie in the kernel
    let one = DVector::repeat(n, 1.0);
    assert!((&dense * &one).amax() < 1e-11);
    let u = space.interpolate(&LambdaFunction::new(1, |x: &DVector<f64>| x[0]));
    assert!(u.dot(&(&dense * &u)) > 0.0);
}

#[test]
fn continuous_poisson_system_with_constraints() {
    let grid = StructuredGrid::<f64>::new(&[0.0, 0.0, 0.0], &[1.0, 2.0, 1.0], &[3, 4, 2]);
    let space = ContinuousLagrangeSpace::new(&grid);
    let g = LambdaFunction::new(1, |x: &DVector<f64>| x[0] - x[1] + 2.0 * x[2]);
    let constraints = DirichletConstraints::from_function(&grid, &space, &g);
    let pattern = volume_sparsity_pattern(&grid, &space, &space);

    let mut results = Vec::new();
    for mode in [TraversalMode::Serial, TraversalMode::Partitioned { num_partitions: 5 }] {
        let matrix = Mutex::new(csr_from_pattern(pattern.clone()));
        let mut rhs = DVector::zeros(space.mapper().size());
        {
            let mut assembler = SystemAssembler::from_space(&space, &grid).with_options(AssemblyOptions {
                mode,
                clear_stack: true,
            });
            assembler.add_volume_matrix(Codim0Integral::new(Elliptic::new(ConstantFunction::one())), &matrix);
            assembler.add_matrix_constraints(&constraints, &matrix);
            assembler.add_vector_constraints(&constraints, &mut rhs);
            assembler.assemble().unwrap();
        }
        results.push((matrix.into_inner().unwrap(), rhs));
    }
    assert_eq!(results[0], results[1]);

    // An affine function is discretely harmonic, so it solves the constrained system
    let (matrix, rhs) = &results[0];
    let u = space.interpolate(&g);
    let residual = matrix * &u - rhs;
    assert!(residual.amax() < 1e-12);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn partitioned_assembly_matches_serial_on_arbitrary_grids(
        grid in (1usize..=3).prop_flat_map(|dim| {
            any_with::<StructuredGrid<f64>>(StructuredGridParams::default().with_dim(dim).with_max_cells_per_dim(3))
        }),
        num_partitions in 1usize..8,
    ) {
        let space = DiscontinuousLagrangeSpace::new(&grid, 1);
        let (serial_matrix, serial_rhs) = assemble_interior_penalty(&grid, &space, TraversalMode::Serial);
        let (matrix, rhs) = assemble_interior_penalty(&grid, &space, TraversalMode::Partitioned { num_partitions });
        prop_assert_eq!(matrix, serial_matrix);
        prop_assert_eq!(rhs, serial_rhs);
    }
}
