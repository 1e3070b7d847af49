//! How the phase-space mesh is divided among the processes.

use std::fmt;
use std::ops::Range;
use mpi::Count;

use crate::error::DiagnosticError;

/// Which axis of phase space is currently split across processes.
///
/// - `ByPosition`: each process owns a contiguous slab of positions
/// and every velocity sample at those positions.
/// - `ByVelocity`: each process owns a contiguous slab of velocities
/// and every position at those velocities.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum LayoutMode {
    ByPosition,
    ByVelocity,
}

impl LayoutMode {
    pub fn other(self) -> LayoutMode {
        match self {
            LayoutMode::ByPosition => LayoutMode::ByVelocity,
            LayoutMode::ByVelocity => LayoutMode::ByPosition,
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayoutMode::ByPosition => write!(f, "partitioned-by-position"),
            LayoutMode::ByVelocity => write!(f, "partitioned-by-velocity"),
        }
    }
}

/// Maps each rank to the contiguous range of indices it owns along
/// the split axis.
///
/// Ranges are stored in rank order and are guaranteed, by construction,
/// to tile `0..size` in increasing index order. Gathered data can
/// therefore be concatenated rank by rank without reordering.
#[derive(Clone, Debug, PartialEq)]
pub struct DecompositionTable {
    size: usize,
    ranges: Vec<Range<usize>>,
}

impl DecompositionTable {
    /// Splits `size` indices as evenly as possible among `nranks`
    /// processes, with the lower ranks taking one extra index each
    /// when the split is not exact.
    pub fn balanced(size: usize, nranks: usize) -> Result<Self, DiagnosticError> {
        if nranks == 0 || nranks > size {
            return Err(DiagnosticError::Unsplittable { size: size, nranks: nranks });
        }

        let base = size / nranks;
        let rem = size % nranks;
        let ranges = (0..nranks)
            .scan(0usize, |start, r| {
                let n = if r < rem {base + 1} else {base};
                let range = *start..(*start + n);
                *start += n;
                Some(range)
            })
            .collect();

        DecompositionTable::from_ranges(size, ranges)
    }

    /// Builds a table from explicit per-rank ranges, checking that they
    /// are non-empty and cover `0..size` exactly once, in rank order.
    pub fn from_ranges(size: usize, ranges: Vec<Range<usize>>) -> Result<Self, DiagnosticError> {
        if ranges.is_empty() {
            return Err(DiagnosticError::Unsplittable { size: size, nranks: 0 });
        }

        let mut expected = 0;
        for (rank, r) in ranges.iter().enumerate() {
            if r.start != expected || r.end <= r.start {
                return Err(DiagnosticError::OutOfOrder {
                    rank: rank,
                    start: r.start,
                    end: r.end,
                    expected: expected,
                });
            }
            expected = r.end;
        }

        if expected != size {
            return Err(DiagnosticError::Unsplittable { size: size, nranks: ranges.len() });
        }

        Ok(DecompositionTable {
            size: size,
            ranges: ranges,
        })
    }

    /// Total number of indices along the split axis.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nranks(&self) -> usize {
        self.ranges.len()
    }

    /// Indices owned by `rank`.
    pub fn range(&self, rank: usize) -> Range<usize> {
        self.ranges[rank].clone()
    }

    /// First index owned by `rank`.
    pub fn i_min(&self, rank: usize) -> usize {
        self.ranges[rank].start
    }

    /// Last index owned by `rank`, inclusive.
    pub fn i_max(&self, rank: usize) -> usize {
        self.ranges[rank].end - 1
    }

    pub fn len_of(&self, rank: usize) -> usize {
        self.ranges[rank].len()
    }

    pub fn max_len(&self) -> usize {
        self.ranges.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Receive counts for an all-gather in which every index along the
    /// split axis carries `stride` elements.
    pub fn counts(&self, stride: usize) -> Vec<Count> {
        self.ranges
            .iter()
            .map(|r| (r.len() * stride) as Count)
            .collect()
    }

    /// Displacements matching `counts(stride)`.
    pub fn displs(&self, stride: usize) -> Vec<Count> {
        self.ranges
            .iter()
            .map(|r| (r.start * stride) as Count)
            .collect()
    }
}

/// Tables for both layout modes of an `nx` by `nv` phase-space mesh.
#[derive(Clone, Debug)]
pub struct Decomposition {
    pub by_position: DecompositionTable,
    pub by_velocity: DecompositionTable,
}

impl Decomposition {
    pub fn balanced(nx: usize, nv: usize, nranks: usize) -> Result<Self, DiagnosticError> {
        Ok(Decomposition {
            by_position: DecompositionTable::balanced(nx, nranks)?,
            by_velocity: DecompositionTable::balanced(nv, nranks)?,
        })
    }

    pub fn table(&self, mode: LayoutMode) -> &DecompositionTable {
        match mode {
            LayoutMode::ByPosition => &self.by_position,
            LayoutMode::ByVelocity => &self.by_velocity,
        }
    }
}
