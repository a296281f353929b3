use fenris_gdt::grid::{visit_from_inside, GridView, Intersection, StructuredGrid};
use fenris_gdt::proptest::StructuredGridParams;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{dvector, DVector};
use proptest::prelude::*;
use util::assert_panics;

fn visited_intersections(grid: &StructuredGrid<f64>) -> Vec<(usize, usize)> {
    (0..grid.num_entities())
        .flat_map(|entity| grid.intersections(entity))
        .filter(|intersection| visit_from_inside::<f64, _>(*intersection))
        .map(|intersection| (intersection.inside(), intersection.index_in_inside()))
        .collect()
}

#[test]
fn unit_square_entities_and_faces() {
    let grid = StructuredGrid::<f64>::unit_cube(2, 3);
    assert_eq!(grid.dim(), 2);
    assert_eq!(grid.num_entities(), 9);
    assert_eq!(grid.num_vertices(), 16);

    for entity in 0..grid.num_entities() {
        let geometry = grid.entity_geometry(entity);
        assert_scalar_eq!(geometry.volume(), 1.0 / 9.0, comp = abs, tol = 1e-14);
        assert_eq!(grid.intersections(entity).len(), 4);
        for intersection in grid.intersections(entity) {
            assert_eq!(intersection.inside(), entity);
            assert_scalar_eq!(intersection.geometry().volume(), 1.0 / 3.0, comp = abs, tol = 1e-14);
            assert!(!intersection.periodic());
        }
    }

    // 12 inner faces and 12 boundary faces
    assert_eq!(visited_intersections(&grid).len(), 24);
    let num_boundary: usize = (0..grid.num_entities())
        .map(|entity| {
            grid.intersections(entity)
                .iter()
                .filter(|i| i.boundary())
                .count()
        })
        .sum();
    assert_eq!(num_boundary, 12);
    assert!(!grid.entity_on_boundary(grid.entity_index(&[1, 1])));
    assert!(grid.entity_on_boundary(grid.entity_index(&[0, 1])));
}

#[test]
fn entity_numbering_runs_first_axis_fastest() {
    let grid = StructuredGrid::<f64>::new(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0], &[2, 3, 4]);
    assert_eq!(grid.entity_index(&[1, 0, 0]), 1);
    assert_eq!(grid.entity_index(&[0, 1, 0]), 2);
    assert_eq!(grid.entity_index(&[0, 0, 1]), 6);
    for entity in 0..grid.num_entities() {
        assert_eq!(grid.entity_index(&grid.multi_index(entity)), entity);
    }
    assert_matrix_eq!(grid.cell_widths(), dvector![0.5, 2.0 / 3.0, 0.75], comp = abs, tol = 1e-14);
}

#[test]
fn faces_are_numbered_by_axis_and_side() {
    let grid = StructuredGrid::<f64>::new(&[0.0, 0.0], &[2.0, 1.0], &[2, 1]);
    let intersections = grid.intersections(0);

    // Face 1 is the upper face along the first axis, shared with entity 1
    let upper_x = &intersections[1];
    assert_eq!(upper_x.index_in_inside(), 1);
    assert_eq!(upper_x.outside(), Some(1));
    assert_eq!(upper_x.index_in_outside(), Some(0));
    assert!(!upper_x.boundary());
    assert_matrix_eq!(upper_x.center_unit_outer_normal(), dvector![1.0, 0.0]);
    assert_matrix_eq!(upper_x.geometry().center(), dvector![1.0, 0.5], comp = abs, tol = 1e-14);

    // Face 2 is the lower face along the second axis, on the boundary
    let lower_y = &intersections[2];
    assert_eq!(lower_y.outside(), None);
    assert!(lower_y.boundary());
    assert_matrix_eq!(lower_y.center_unit_outer_normal(), dvector![0.0, -1.0]);
    assert_scalar_eq!(lower_y.geometry().volume(), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn face_embeddings_agree_with_physical_face() {
    let grid = StructuredGrid::<f64>::new(&[-1.0, 0.0], &[1.0, 3.0], &[4, 3]);
    for entity in 0..grid.num_entities() {
        let inside = grid.entity_geometry(entity);
        for intersection in grid.intersections(entity) {
            let face = intersection.geometry();
            for xi in [dvector![0.0], dvector![0.3], dvector![1.0]] {
                let x = face.global(&xi);
                let from_inside = inside.global(&intersection.geometry_in_inside().global(&xi));
                assert_matrix_eq!(from_inside, x, comp = abs, tol = 1e-12);
                if let (Some(outside), Some(embedding)) = (intersection.outside(), intersection.geometry_in_outside()) {
                    let from_outside = grid.entity_geometry(outside).global(&embedding.global(&xi));
                    assert_matrix_eq!(from_outside, x, comp = abs, tol = 1e-12);
                }
            }
        }
    }
}

#[test]
fn periodic_axis_wraps_around() {
    let grid = StructuredGrid::<f64>::with_periodicity(&[0.0, 0.0], &[1.0, 1.0], &[4, 2], &[true, false]);
    let first = grid.entity_index(&[0, 1]);
    let last = grid.entity_index(&[3, 1]);

    let lower_x = &grid.intersections(first)[0];
    assert!(lower_x.boundary());
    assert!(lower_x.periodic());
    assert_eq!(lower_x.outside(), Some(last));
    assert_eq!(lower_x.index_in_outside(), Some(1));

    let upper_y = &grid.intersections(first)[3];
    assert!(upper_y.boundary());
    assert!(!upper_y.periodic());

    // 4 faces per row along the periodic axis, 3 faces per column along the other
    assert_eq!(visited_intersections(&grid).len(), 2 * 4 + 4 * 3);
}

#[test]
fn single_periodic_cell_is_its_own_neighbor() {
    let grid = StructuredGrid::<f64>::with_periodicity(&[0.0], &[1.0], &[1], &[true]);
    let intersections = grid.intersections(0);
    assert_eq!(intersections.len(), 2);
    assert!(intersections.iter().all(|i| i.outside() == Some(0)));

    // The two faces are the same periodic face, visited once
    assert_eq!(visited_intersections(&grid), vec![(0, 0)]);
}

#[test]
fn invalid_grids_panic() {
    assert_panics!(StructuredGrid::<f64>::new(&[0.0], &[1.0], &[0]));
    assert_panics!(StructuredGrid::<f64>::new(&[1.0], &[0.0], &[2]));
    assert_panics!(StructuredGrid::<f64>::new(&[0.0, 0.0], &[1.0], &[2, 2]));
    assert_panics!(StructuredGrid::<f64>::unit_cube(4, 2));
}

proptest! {
    #[test]
    fn every_face_is_visited_exactly_once(
        grid in any_with::<StructuredGrid<f64>>(StructuredGridParams::default().with_dim(2))
    ) {
        let mut boundary_sightings = 0;
        let mut neighbor_sightings = 0;
        for entity in 0..grid.num_entities() {
            for intersection in grid.intersections(entity) {
                if intersection.neighbor() {
                    neighbor_sightings += 1;
                } else {
                    boundary_sightings += 1;
                }
            }
        }
        prop_assert_eq!(neighbor_sightings % 2, 0);

        let mut visited = visited_intersections(&grid);
        prop_assert_eq!(visited.len(), boundary_sightings + neighbor_sightings / 2);
        visited.sort_unstable();
        visited.dedup();
        prop_assert_eq!(visited.len(), boundary_sightings + neighbor_sightings / 2);
    }

    #[test]
    fn cell_volumes_sum_to_box_volume(grid in any::<StructuredGrid<f64>>()) {
        let total: f64 = (0..grid.num_entities())
            .map(|entity| grid.entity_geometry(entity).volume())
            .sum();
        let expected: f64 = (grid.upper() - grid.lower()).product();
        prop_assert!((total - expected).abs() <= 1e-10 * expected);
    }

    #[test]
    fn outer_normals_are_opposite_across_faces(
        grid in any_with::<StructuredGrid<f64>>(StructuredGridParams::default().with_dim(3).with_max_cells_per_dim(3))
    ) {
        for entity in 0..grid.num_entities() {
            for intersection in grid.intersections(entity) {
                let neighbor = (intersection.outside(), intersection.index_in_outside());
                if let (Some(outside), Some(index_in_outside)) = neighbor {
                    let opposite = &grid.intersections(outside)[index_in_outside];
                    prop_assert_eq!(opposite.outside(), Some(entity));
                    let sum: DVector<f64> =
                        intersection.center_unit_outer_normal() + opposite.center_unit_outer_normal();
                    prop_assert!(sum.norm() <= 1e-14);
                }
            }
        }
    }
}
