//! Functionality for error estimation.
use crate::function::Function;
use crate::grid::GridView;
use crate::quadrature::{GaussQuadrature, QuadratureProvider, QuadratureRule};
use crate::space::{BaseFunctionSet, DiscreteFunctionSpace, Mapper};
use crate::Real;
use eyre::{bail, WrapErr};
use nalgebra::{DMatrix, DVector};

fn local_coefficients<T: Real>(mapper: &impl Mapper, u_h: &DVector<T>, entity: usize) -> DVector<T> {
    DVector::from_fn(mapper.local_size(entity), |i, _| u_h[mapper.global_index(entity, i)])
}

/// Estimates the $L^2$ error $\norm{u_h - u}_{L^2}$ of a scalar discrete function.
///
/// Each entity is integrated with a Gauss rule exact for polynomials of the given order.
#[allow(non_snake_case)]
pub fn estimate_L2_error<T, G, S>(
    grid: &G,
    space: &S,
    u_h: &DVector<T>,
    u: &dyn Function<T>,
    order: usize,
) -> eyre::Result<T>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    assert_eq!(u_h.len(), space.mapper().size(), "Coefficient vector must match the space dimension");
    if space.range_dim() != 1 {
        bail!("L2 error estimation requires a scalar space, got range dimension {}", space.range_dim());
    }

    let mut values = DMatrix::zeros(0, 0);
    let mut result = T::zero();
    for entity in 0..grid.num_entities() {
        let geometry = grid.entity_geometry(entity);
        let basis = space.base_function_set(entity);
        let coefficients = local_coefficients(space.mapper(), u_h, entity);
        let rule: QuadratureRule<T> = GaussQuadrature
            .rule(geometry.reference_shape(), order)
            .wrap_err_with(|| format!("no quadrature rule for entity {entity}"))?;
        for (w, xi) in rule.iter() {
            basis.populate_values(xi, &mut values);
            let u_h_at_x = (&values * &coefficients)[0];
            let error = u_h_at_x - u.evaluate(&geometry.global(xi));
            result += w * error * error * geometry.integration_element(xi);
        }
    }
    Ok(result.sqrt())
}

/// Estimates the $H^1$ *seminorm* error $\seminorm{u_h - u}_{H^1}$ of a scalar discrete function,
/// given the exact gradient `u_grad`.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error<T, G, S>(
    grid: &G,
    space: &S,
    u_h: &DVector<T>,
    u_grad: impl Fn(&DVector<T>) -> DVector<T>,
    order: usize,
) -> eyre::Result<T>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    assert_eq!(u_h.len(), space.mapper().size(), "Coefficient vector must match the space dimension");
    if space.range_dim() != 1 {
        bail!("H1 error estimation requires a scalar space, got range dimension {}", space.range_dim());
    }

    let mut reference_gradients = DMatrix::zeros(0, 0);
    let mut result = T::zero();
    for entity in 0..grid.num_entities() {
        let geometry = grid.entity_geometry(entity);
        let basis = space.base_function_set(entity);
        let coefficients = local_coefficients(space.mapper(), u_h, entity);
        let rule: QuadratureRule<T> = GaussQuadrature
            .rule(geometry.reference_shape(), order)
            .wrap_err_with(|| format!("no quadrature rule for entity {entity}"))?;
        for (w, xi) in rule.iter() {
            basis.populate_reference_gradients(xi, &mut reference_gradients);
            let grad_u_h = geometry.jacobian_inverse_transposed(xi) * (&reference_gradients * &coefficients);
            let error = grad_u_h - u_grad(&geometry.global(xi));
            result += w * error.norm_squared() * geometry.integration_element(xi);
        }
    }
    Ok(result.sqrt())
}
