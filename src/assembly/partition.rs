use num::integer::div_ceil;
use std::ops::Range;

/// A partitioning of the indices `0 .. len` into contiguous, non-empty ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPartitioning {
    offsets: Vec<usize>,
}

impl IndexPartitioning {
    /// Splits `0 .. len` into at most `num_partitions` ranges of (nearly) equal size.
    ///
    /// Fewer partitions are created if there are fewer indices than requested partitions.
    ///
    /// # Panics
    ///
    /// Panics if `num_partitions` is zero.
    pub fn contiguous(len: usize, num_partitions: usize) -> Self {
        assert!(num_partitions > 0, "Number of partitions must be positive");
        let chunk_size = div_ceil(len, num_partitions).max(1);
        let mut offsets: Vec<_> = (0..len).step_by(chunk_size).collect();
        offsets.push(len);
        Self { offsets }
    }

    /// Creates a partitioning from the start of each range followed by the total length.
    ///
    /// # Panics
    ///
    /// Panics if the offsets do not start at zero or are not strictly increasing.
    pub fn from_offsets(offsets: Vec<usize>) -> Self {
        assert_eq!(offsets.first(), Some(&0), "Offsets must start at zero");
        assert!(
            offsets.windows(2).all(|w| w[0] < w[1]),
            "Offsets must be strictly increasing"
        );
        Self { offsets }
    }

    /// Number of partitioned indices.
    pub fn index_len(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn num_partitions(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn range(&self, partition: usize) -> Range<usize> {
        self.offsets[partition]..self.offsets[partition + 1]
    }

    pub fn ranges(&self) -> impl ExactSizeIterator<Item = Range<usize>> + '_ {
        self.offsets.windows(2).map(|w| w[0]..w[1])
    }

    /// The partition containing the given index.
    pub fn partition_of(&self, index: usize) -> Option<usize> {
        if index >= self.index_len() {
            None
        } else {
            Some(self.offsets.partition_point(|&offset| offset <= index) - 1)
        }
    }
}
