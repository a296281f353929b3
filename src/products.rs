//! Frequently needed global matrices, assembled into CSR matrices with matching sparsity.
use crate::assembly::local::{BoundaryProduct, Codim0Integral, Codim1BoundaryIntegral, Elliptic, Product};
use crate::assembly::pattern::{csr_from_pattern, volume_sparsity_pattern};
use crate::assembly::SystemAssembler;
use crate::function::{ConstantFunction, Function};
use crate::grid::GridView;
use crate::space::DiscreteFunctionSpace;
use crate::Real;
use eyre::WrapErr;
use nalgebra_sparse::CsrMatrix;

/// The mass matrix `M_ij = ∫ φ_i · φ_j dx`.
pub fn l2_product_matrix<T, G, S>(grid: &G, space: &S) -> eyre::Result<CsrMatrix<T>>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    let mut matrix = csr_from_pattern(volume_sparsity_pattern(grid, space, space));
    {
        let mut assembler = SystemAssembler::from_space(space, grid);
        assembler.add_volume_matrix(Codim0Integral::new(Product::new(ConstantFunction::one())), &mut matrix);
        assembler
            .assemble()
            .wrap_err("failed to assemble L2 product matrix")?;
    }
    Ok(matrix)
}

/// The boundary mass matrix `M_ij = ∫_Γ φ_i · φ_j ds` over all non-periodic boundary faces.
pub fn boundary_l2_product_matrix<T, G, S>(grid: &G, space: &S) -> eyre::Result<CsrMatrix<T>>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    let mut matrix = csr_from_pattern(volume_sparsity_pattern(grid, space, space));
    {
        let mut assembler = SystemAssembler::from_space(space, grid);
        assembler.add_boundary_matrix(
            Codim1BoundaryIntegral::new(BoundaryProduct::new(ConstantFunction::one())),
            &mut matrix,
        );
        assembler
            .assemble()
            .wrap_err("failed to assemble boundary L2 product matrix")?;
    }
    Ok(matrix)
}

/// The stiffness matrix `A_ij = ∫ a ∇φ_i · ∇φ_j dx` of a scalar space.
pub fn elliptic_matrix<T, G, S>(grid: &G, space: &S, diffusion: impl Function<T>) -> eyre::Result<CsrMatrix<T>>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    let mut matrix = csr_from_pattern(volume_sparsity_pattern(grid, space, space));
    {
        let mut assembler = SystemAssembler::from_space(space, grid);
        assembler.add_volume_matrix(Codim0Integral::new(Elliptic::new(diffusion)), &mut matrix);
        assembler
            .assemble()
            .wrap_err("failed to assemble elliptic matrix")?;
    }
    Ok(matrix)
}
