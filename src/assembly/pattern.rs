//! Sparsity patterns of global matrices.
use crate::grid::{GridView, Intersection};
use crate::space::{DiscreteFunctionSpace, Mapper};
use crate::Real;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeSet;

fn insert_entity_pair(
    entries: &mut BTreeSet<(usize, usize)>,
    test: &impl Mapper,
    ansatz: &impl Mapper,
    test_entity: usize,
    ansatz_entity: usize,
    rows: &mut Vec<usize>,
    cols: &mut Vec<usize>,
) {
    test.populate_global_indices(test_entity, rows);
    ansatz.populate_global_indices(ansatz_entity, cols);
    for &i in rows.iter() {
        for &j in cols.iter() {
            entries.insert((i, j));
        }
    }
}

fn pattern_from_entries(num_rows: usize, num_cols: usize, entries: BTreeSet<(usize, usize)>) -> SparsityPattern {
    let mut offsets = Vec::with_capacity(num_rows + 1);
    let mut column_indices = Vec::with_capacity(entries.len());

    offsets.push(0);
    for (i, j) in entries {
        // Loop to handle consecutive empty rows
        while i + 1 > offsets.len() {
            offsets.push(column_indices.len());
        }
        column_indices.push(j);
    }

    while offsets.len() < (num_rows + 1) {
        offsets.push(column_indices.len());
    }

    SparsityPattern::try_from_offsets_and_indices(num_rows, num_cols, offsets, column_indices)
        .expect("Entries are sorted and unique, so the pattern must be valid")
}

/// Couplings between the test and ansatz functions of every entity.
pub fn volume_sparsity_pattern<T, G, TS, AS>(grid: &G, test: &TS, ansatz: &AS) -> SparsityPattern
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
{
    let (test_mapper, ansatz_mapper) = (test.mapper(), ansatz.mapper());
    let mut entries = BTreeSet::new();
    let (mut rows, mut cols) = (Vec::new(), Vec::new());
    for entity in 0..grid.num_entities() {
        insert_entity_pair(&mut entries, test_mapper, ansatz_mapper, entity, entity, &mut rows, &mut cols);
    }
    pattern_from_entries(test_mapper.size(), ansatz_mapper.size(), entries)
}

/// Volume couplings plus the couplings across every intersection with an outside entity.
pub fn face_sparsity_pattern<T, G, TS, AS>(grid: &G, test: &TS, ansatz: &AS) -> SparsityPattern
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
{
    let (test_mapper, ansatz_mapper) = (test.mapper(), ansatz.mapper());
    let mut entries = BTreeSet::new();
    let (mut rows, mut cols) = (Vec::new(), Vec::new());
    for entity in 0..grid.num_entities() {
        insert_entity_pair(&mut entries, test_mapper, ansatz_mapper, entity, entity, &mut rows, &mut cols);
        for intersection in grid.intersections(entity) {
            if let Some(outside) = intersection.outside() {
                insert_entity_pair(&mut entries, test_mapper, ansatz_mapper, entity, outside, &mut rows, &mut cols);
            }
        }
    }
    pattern_from_entries(test_mapper.size(), ansatz_mapper.size(), entries)
}

/// A CSR matrix with the given pattern and all stored entries zero.
pub fn csr_from_pattern<T: Real>(pattern: SparsityPattern) -> CsrMatrix<T> {
    let values = vec![T::zero(); pattern.nnz()];
    CsrMatrix::try_from_pattern_and_values(pattern, values)
        .expect("Number of values matches the number of pattern entries")
}
