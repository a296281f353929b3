use crate::grid::{AffineGeometry, Geometry, GridView, Intersection};
use crate::quadrature::ReferenceShape;
use crate::Real;
use nalgebra::{convert, DMatrix, DVector};

/// A face of a [`StructuredGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredIntersection<T: Real> {
    inside: usize,
    outside: Option<usize>,
    index_in_inside: usize,
    index_in_outside: Option<usize>,
    boundary: bool,
    geometry: AffineGeometry<T>,
    geometry_in_inside: AffineGeometry<T>,
    geometry_in_outside: Option<AffineGeometry<T>>,
    normal: DVector<T>,
}

impl<T: Real> Intersection<T> for StructuredIntersection<T> {
    fn inside(&self) -> usize {
        self.inside
    }

    fn outside(&self) -> Option<usize> {
        self.outside
    }

    fn boundary(&self) -> bool {
        self.boundary
    }

    fn index_in_inside(&self) -> usize {
        self.index_in_inside
    }

    fn index_in_outside(&self) -> Option<usize> {
        self.index_in_outside
    }

    fn geometry(&self) -> &dyn Geometry<T> {
        &self.geometry
    }

    fn geometry_in_inside(&self) -> &dyn Geometry<T> {
        &self.geometry_in_inside
    }

    fn geometry_in_outside(&self) -> Option<&dyn Geometry<T>> {
        self.geometry_in_outside
            .as_ref()
            .map(|geometry| geometry as &dyn Geometry<T>)
    }

    fn unit_outer_normal(&self, _local: &DVector<T>) -> DVector<T> {
        self.normal.clone()
    }
}

/// A uniform axis-aligned grid of the box `[lower, upper]` in one, two or three dimensions.
///
/// Cells are numbered lexicographically with the first axis running fastest. Face `2a + s` of
/// a cell is the face orthogonal to axis `a`, at the lower (`s = 0`) or upper (`s = 1`) end.
/// Axes may be periodic, in which case the faces at the two ends of the axis are identified.
#[derive(Debug, Clone)]
pub struct StructuredGrid<T: Real> {
    lower: DVector<T>,
    upper: DVector<T>,
    cells: Vec<usize>,
    periodic: Vec<bool>,
    geometries: Vec<AffineGeometry<T>>,
    intersections: Vec<Vec<StructuredIntersection<T>>>,
    entity_vertices: Vec<usize>,
    num_vertices: usize,
}

impl<T: Real> StructuredGrid<T> {
    /// Creates a grid without periodic axes.
    pub fn new(lower: &[T], upper: &[T], cells: &[usize]) -> Self {
        Self::with_periodicity(lower, upper, cells, &vec![false; cells.len()])
    }

    /// Creates a grid with `cells_per_dim` cells along each axis of the unit cube `[0, 1]^dim`.
    pub fn unit_cube(dim: usize, cells_per_dim: usize) -> Self {
        Self::new(&vec![T::zero(); dim], &vec![T::one(); dim], &vec![cells_per_dim; dim])
    }

    /// Creates a grid where the axes flagged in `periodic` wrap around.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions of the arguments disagree, if the dimension is not one, two or
    /// three, if an axis has no cells or if the box is empty.
    pub fn with_periodicity(lower: &[T], upper: &[T], cells: &[usize], periodic: &[bool]) -> Self {
        let d = cells.len();
        assert!((1..=3).contains(&d), "Structured grids must be one-, two- or three-dimensional");
        assert_eq!(lower.len(), d, "Lower corner must have one coordinate per axis");
        assert_eq!(upper.len(), d, "Upper corner must have one coordinate per axis");
        assert_eq!(periodic.len(), d, "Periodicity must be given for every axis");
        assert!(cells.iter().all(|&n| n > 0), "Every axis must have at least one cell");
        assert!(
            lower.iter().zip(upper).all(|(l, u)| l < u),
            "Lower corner must be strictly smaller than upper corner"
        );

        let mut grid = Self {
            lower: DVector::from_column_slice(lower),
            upper: DVector::from_column_slice(upper),
            cells: cells.to_vec(),
            periodic: periodic.to_vec(),
            geometries: Vec::new(),
            intersections: Vec::new(),
            entity_vertices: Vec::new(),
            num_vertices: cells.iter().map(|n| n + 1).product(),
        };
        grid.build_entities();
        grid
    }

    pub fn cells_per_dim(&self) -> &[usize] {
        &self.cells
    }

    pub fn lower(&self) -> &DVector<T> {
        &self.lower
    }

    pub fn upper(&self) -> &DVector<T> {
        &self.upper
    }

    pub fn periodic(&self) -> &[bool] {
        &self.periodic
    }

    /// Width of the cells along each axis.
    pub fn cell_widths(&self) -> DVector<T> {
        let n = DVector::from_iterator(self.cells.len(), self.cells.iter().map(|&n| convert::<f64, T>(n as f64)));
        (&self.upper - &self.lower).component_div(&n)
    }

    /// Linear index of the cell with the given multi-index.
    pub fn entity_index(&self, multi_index: &[usize]) -> usize {
        assert_eq!(multi_index.len(), self.cells.len());
        multi_index
            .iter()
            .zip(&self.cells)
            .rev()
            .fold(0, |index, (&i, &n)| {
                assert!(i < n, "Multi-index out of bounds");
                index * n + i
            })
    }

    /// Multi-index of the cell with the given linear index.
    pub fn multi_index(&self, entity: usize) -> Vec<usize> {
        let mut remainder = entity;
        self.cells
            .iter()
            .map(|&n| {
                let i = remainder % n;
                remainder /= n;
                i
            })
            .collect()
    }

    fn vertex_index(&self, vertex_multi_index: &[usize]) -> usize {
        vertex_multi_index
            .iter()
            .zip(&self.cells)
            .rev()
            .fold(0, |index, (&i, &n)| index * (n + 1) + i)
    }

    fn build_entities(&mut self) {
        let d = self.cells.len();
        let h = self.cell_widths();
        let num_entities = self.cells.iter().product();
        let shape = ReferenceShape::cube(d).expect("Dimension was checked on construction");
        let face_shape = ReferenceShape::cube(d - 1).expect("Dimension was checked on construction");

        self.geometries = Vec::with_capacity(num_entities);
        self.intersections = Vec::with_capacity(num_entities);
        self.entity_vertices = Vec::with_capacity(num_entities * shape.num_corners());

        for entity in 0..num_entities {
            let multi_index = self.multi_index(entity);
            let origin = DVector::from_fn(d, |a, _| self.lower[a] + h[a] * convert::<f64, T>(multi_index[a] as f64));
            let cell_geometry = AffineGeometry::new(shape, origin.clone(), DMatrix::from_diagonal(&h));

            for corner in 0..shape.num_corners() {
                let vertex: Vec<_> = (0..d).map(|a| multi_index[a] + ((corner >> a) & 1)).collect();
                let vertex = self.vertex_index(&vertex);
                self.entity_vertices.push(vertex);
            }

            let mut intersections = Vec::with_capacity(shape.num_faces());
            for axis in 0..d {
                for side in 0..2 {
                    let face = 2 * axis + side;
                    let tangential_axes: Vec<_> = (0..d).filter(|&b| b != axis).collect();
                    let side_value = if side == 1 { T::one() } else { T::zero() };

                    // Reference embeddings of the face in a cell, at either end of the axis
                    let embedding = |at_upper: bool| {
                        let mut origin = DVector::zeros(d);
                        if at_upper {
                            origin[axis] = T::one();
                        }
                        let mut jacobian = DMatrix::zeros(d, d - 1);
                        for (column, &b) in tangential_axes.iter().enumerate() {
                            jacobian[(b, column)] = T::one();
                        }
                        AffineGeometry::new(face_shape, origin, jacobian)
                    };

                    let mut face_origin = origin.clone();
                    face_origin[axis] += side_value * h[axis];
                    let mut face_jacobian = DMatrix::zeros(d, d - 1);
                    for (column, &b) in tangential_axes.iter().enumerate() {
                        face_jacobian[(b, column)] = h[b];
                    }
                    let geometry = AffineGeometry::new(face_shape, face_origin, face_jacobian);

                    let mut normal = DVector::zeros(d);
                    normal[axis] = if side == 1 { T::one() } else { -T::one() };

                    let n = self.cells[axis];
                    let i = multi_index[axis];
                    let at_boundary = (side == 0 && i == 0) || (side == 1 && i + 1 == n);
                    let neighbor_i = if !at_boundary {
                        Some(if side == 1 { i + 1 } else { i - 1 })
                    } else if self.periodic[axis] {
                        Some(if side == 1 { 0 } else { n - 1 })
                    } else {
                        None
                    };
                    let outside = neighbor_i.map(|neighbor_i| {
                        let mut neighbor = multi_index.clone();
                        neighbor[axis] = neighbor_i;
                        self.entity_index(&neighbor)
                    });

                    intersections.push(StructuredIntersection {
                        inside: entity,
                        outside,
                        index_in_inside: face,
                        index_in_outside: outside.map(|_| 2 * axis + (1 - side)),
                        boundary: at_boundary,
                        geometry,
                        geometry_in_inside: embedding(side == 1),
                        geometry_in_outside: outside.map(|_| embedding(side == 0)),
                        normal,
                    });
                }
            }

            self.geometries.push(cell_geometry);
            self.intersections.push(intersections);
        }
    }
}

impl<T: Real> GridView<T> for StructuredGrid<T> {
    type Intersection = StructuredIntersection<T>;

    fn dim(&self) -> usize {
        self.cells.len()
    }

    fn num_entities(&self) -> usize {
        self.geometries.len()
    }

    fn entity_geometry(&self, entity: usize) -> &dyn Geometry<T> {
        &self.geometries[entity]
    }

    fn intersections(&self, entity: usize) -> &[Self::Intersection] {
        &self.intersections[entity]
    }

    fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    fn entity_vertices(&self, entity: usize) -> &[usize] {
        let n = 1 << self.dim();
        &self.entity_vertices[n * entity..n * (entity + 1)]
    }
}
