use fenris_gdt::quadrature::{unit_interval_rule, GaussQuadrature, QuadratureProvider, QuadratureRule, ReferenceShape};
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;

fn gauss_rule(shape: ReferenceShape, order: usize) -> QuadratureRule<f64> {
    GaussQuadrature.rule(shape, order).unwrap()
}

#[test]
fn reference_shapes() {
    assert_eq!(ReferenceShape::cube(2), Some(ReferenceShape::Quadrilateral));
    assert_eq!(ReferenceShape::cube(4), None);
    assert_eq!(ReferenceShape::Hexahedron.num_faces(), 6);
    assert_eq!(ReferenceShape::Hexahedron.num_corners(), 8);
    assert_eq!(ReferenceShape::Quadrilateral.corner::<f64>(2), DVector::from_column_slice(&[0.0, 1.0]));
    assert_eq!(ReferenceShape::Line.center::<f64>(), DVector::from_element(1, 0.5));
}

#[test]
fn weights_sum_to_reference_volume() {
    let shapes = [
        ReferenceShape::Point,
        ReferenceShape::Line,
        ReferenceShape::Quadrilateral,
        ReferenceShape::Hexahedron,
    ];
    for shape in shapes {
        for order in 0..8 {
            let rule = gauss_rule(shape, order);
            assert!(!rule.is_empty());
            assert!(rule.points().iter().all(|p| p.len() == shape.dim()));
            assert_scalar_eq!(rule.weights().iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_rules_are_exact_for_their_order() {
    for order in 0..10 {
        let rule = unit_interval_rule::<f64>(order).unwrap();
        let integral = rule.integrate(|x| x[0].powi(order as i32));
        assert_scalar_eq!(integral, 1.0 / (order as f64 + 1.0), comp = abs, tol = 1e-13);
    }

    // ∫∫ x^3 y^2 over the unit square
    let rule = gauss_rule(ReferenceShape::Quadrilateral, 3);
    let integral = rule.integrate(|x| x[0].powi(3) * x[1].powi(2));
    assert_scalar_eq!(integral, 1.0 / 12.0, comp = abs, tol = 1e-14);

    // ∫∫∫ x^2 y z^4 over the unit cube
    let rule = gauss_rule(ReferenceShape::Hexahedron, 4);
    let integral = rule.integrate(|x| x[0].powi(2) * x[1] * x[2].powi(4));
    assert_scalar_eq!(integral, 1.0 / 30.0, comp = abs, tol = 1e-14);
}

#[test]
fn excessive_order_is_an_error() {
    assert!(unit_interval_rule::<f64>(10_000).is_err());
}
