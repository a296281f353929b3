use fenris_gdt::assembly::filter::{
    AllEntities, AllIntersections, BoundaryEntities, BoundaryIntersections, CouplingIntersections, EntityFilter,
    EntityFilterFn, FilterCombinators, InnerIntersections, IntersectionFilter, IntersectionFilterFn,
    NonPeriodicBoundaryIntersections, PeriodicIntersections,
};
use fenris_gdt::grid::{GridView, Intersection, StructuredGrid, StructuredIntersection};

type Grid = StructuredGrid<f64>;

fn count_entities(grid: &Grid, filter: &impl EntityFilter<f64, Grid>) -> usize {
    (0..grid.num_entities())
        .filter(|&entity| filter.contains(grid, entity))
        .count()
}

/// Number of (entity, face) pairs accepted by the filter, i.e. every intersection with an
/// outside entity is counted from both sides.
fn count_intersections(grid: &Grid, filter: &impl IntersectionFilter<f64, Grid>) -> usize {
    (0..grid.num_entities())
        .flat_map(|entity| grid.intersections(entity))
        .filter(|intersection| filter.contains(grid, intersection))
        .count()
}

fn periodic_grid() -> Grid {
    StructuredGrid::with_periodicity(&[0.0, 0.0], &[1.0, 1.0], &[3, 3], &[true, false])
}

#[test]
fn entity_filters() {
    let grid = StructuredGrid::<f64>::unit_cube(2, 3);
    assert_eq!(count_entities(&grid, &AllEntities), 9);
    assert_eq!(count_entities(&grid, &BoundaryEntities), 8);
    assert!(!EntityFilter::<f64, Grid>::contains(&BoundaryEntities, &grid, 4));

    let even = EntityFilterFn(|_: &Grid, entity: usize| entity % 2 == 0);
    assert_eq!(count_entities(&grid, &even), 5);
}

#[test]
fn intersection_filters_without_periodicity() {
    let grid = StructuredGrid::<f64>::unit_cube(2, 3);
    assert_eq!(count_intersections(&grid, &AllIntersections), 36);
    assert_eq!(count_intersections(&grid, &BoundaryIntersections), 12);
    assert_eq!(count_intersections(&grid, &NonPeriodicBoundaryIntersections), 12);
    assert_eq!(count_intersections(&grid, &PeriodicIntersections), 0);
    assert_eq!(count_intersections(&grid, &InnerIntersections), 24);
    assert_eq!(count_intersections(&grid, &CouplingIntersections), 24);
}

#[test]
fn intersection_filters_with_periodicity() {
    let grid = periodic_grid();
    assert_eq!(count_intersections(&grid, &AllIntersections), 36);
    assert_eq!(count_intersections(&grid, &BoundaryIntersections), 12);
    assert_eq!(count_intersections(&grid, &NonPeriodicBoundaryIntersections), 6);
    assert_eq!(count_intersections(&grid, &PeriodicIntersections), 6);
    assert_eq!(count_intersections(&grid, &InnerIntersections), 24);
    assert_eq!(count_intersections(&grid, &CouplingIntersections), 30);
}

#[test]
fn combinators_agree_with_named_filters() {
    let grid = periodic_grid();
    let non_periodic_boundary = BoundaryIntersections.and(PeriodicIntersections.not());
    let coupling = InnerIntersections.or(PeriodicIntersections);
    for entity in 0..grid.num_entities() {
        for intersection in grid.intersections(entity) {
            assert_eq!(
                IntersectionFilter::<f64, Grid>::contains(&non_periodic_boundary, &grid, intersection),
                IntersectionFilter::<f64, Grid>::contains(&NonPeriodicBoundaryIntersections, &grid, intersection)
            );
            assert_eq!(
                IntersectionFilter::<f64, Grid>::contains(&coupling, &grid, intersection),
                IntersectionFilter::<f64, Grid>::contains(&CouplingIntersections, &grid, intersection)
            );
        }
    }
    assert_eq!(count_intersections(&grid, &AllIntersections.not()), 0);
    // Only the center entity touches neither the periodic nor the physical boundary
    assert_eq!(count_entities(&grid, &BoundaryEntities.not().or(AllEntities.not())), 1);
}

#[test]
fn closures_compose_with_named_filters() {
    let grid = StructuredGrid::<f64>::unit_cube(2, 3);
    // Faces on the left boundary x = 0
    let left = IntersectionFilterFn(|_: &Grid, intersection: &StructuredIntersection<f64>| {
        intersection.index_in_inside() == 0
    })
    .and(BoundaryIntersections);
    assert_eq!(count_intersections(&grid, &left), 3);

    let first_row = || EntityFilterFn(|_: &Grid, entity: usize| entity < 3);
    assert_eq!(count_entities(&grid, &first_row().and(BoundaryEntities)), 3);
    assert_eq!(count_entities(&grid, &first_row().not().and(BoundaryEntities)), 5);
}
