//! The distribution function, as stored on one process

use ndarray::prelude::*;
use tracing::debug;

use crate::comm::Collective;
use crate::error::DiagnosticError;
use crate::layout::*;
use crate::mesh::Mesh;

mod gather;
mod remap;

/// Reusable communication buffers, owned by the field and lent out
/// for the duration of a single collective call.
struct Scratch {
    send: Vec<f64>,
    recv: Vec<f64>,
}

/// A mutable borrow of the scratch buffers, trimmed to the lengths
/// the current collective needs.
struct Lease<'a> {
    send: &'a mut [f64],
    recv: &'a mut [f64],
}

impl Scratch {
    fn lease(&mut self, send_len: usize, recv_len: usize) -> Lease {
        assert!(send_len <= self.send.len() && recv_len <= self.recv.len(),
            "requested ({}, {}) scratch elements, only have ({}, {})",
            send_len, recv_len, self.send.len(), self.recv.len());
        Lease {
            send: &mut self.send[..send_len],
            recv: &mut self.recv[..recv_len],
        }
    }
}

/// The local part of `f(x, v)` on an `nx` by `nv` phase-space mesh.
///
/// The block is always indexed `[local split index][full other index]`,
/// so in `ByPosition` mode `block[[i, j]]` is `f(x[start + i], v[j])`
/// and in `ByVelocity` mode it is `f(x[j], v[start + i])`.
pub struct PhaseSpace {
    rank: usize,
    nranks: usize,
    nx: usize,
    nv: usize,
    layout: LayoutMode,
    block: Array2<f64>,
    tables: Decomposition,
    scratch: Scratch,
}

impl PhaseSpace {
    /// Allocates a zeroed distribution function on an `nx` by `nv` mesh,
    /// split among the processes of `comm` in the given layout.
    pub fn new(comm: &impl Collective, nx: usize, nv: usize, layout: LayoutMode) -> Result<PhaseSpace, DiagnosticError> {
        let rank = comm.rank();
        let nranks = comm.size();
        let tables = Decomposition::balanced(nx, nv, nranks)?;

        let split = tables.table(layout);
        let rows = split.len_of(rank);
        let cols = tables.table(layout.other()).size();

        // Largest possible block in either layout, and the full field
        let send_len = (tables.by_position.max_len() * nv).max(tables.by_velocity.max_len() * nx);
        let recv_len = nx * nv;

        debug!("rank {} owns rows {}..={} (x {} columns) in {} layout", rank, split.i_min(rank), split.i_max(rank), cols, layout);

        Ok(PhaseSpace {
            rank: rank,
            nranks: nranks,
            nx: nx,
            nv: nv,
            layout: layout,
            block: Array2::zeros((rows, cols)),
            tables: tables,
            scratch: Scratch {
                send: vec![0.0; send_len],
                recv: vec![0.0; recv_len],
            },
        })
    }

    pub fn nranks(&self) -> usize {
        self.nranks
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn nv(&self) -> usize {
        self.nv
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    /// Table for the current layout.
    pub fn table(&self) -> &DecompositionTable {
        self.tables.table(self.layout)
    }

    pub fn block(&self) -> ArrayView2<f64> {
        self.block.view()
    }

    /// Sets every local sample to `f(x, v)`, whichever the layout.
    pub fn fill<F>(&mut self, xmesh: &Mesh, vmesh: &Mesh, f: F)
    where F: Fn(f64, f64) -> f64 {
        assert_eq!((xmesh.size(), vmesh.size()), (self.nx, self.nv));
        let start = self.table().i_min(self.rank);
        let (x, v) = (xmesh.samples(), vmesh.samples());
        match self.layout {
            LayoutMode::ByPosition => {
                self.block.indexed_iter_mut().for_each(|((i, j), s)| *s = f(x[start + i], v[j]));
            },
            LayoutMode::ByVelocity => {
                self.block.indexed_iter_mut().for_each(|((i, j), s)| *s = f(x[j], v[start + i]));
            },
        }
    }

    /// Brings the field into the `target` layout, redistributing it
    /// among the processes if necessary.
    ///
    /// Collective: must be called on all processes with the same `target`.
    pub fn ensure_layout(&mut self, comm: &impl Collective, target: LayoutMode) {
        if self.layout == target {
            return;
        }
        self.exchange(comm);
        assert_eq!(self.layout, target);
        assert_eq!(
            self.block.nrows(), self.table().len_of(self.rank),
            "local block does not match the {} decomposition on rank {}", self.layout, self.rank
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::threads;

    fn sample(x: f64, v: f64) -> f64 {
        x * 100.0 + v
    }

    #[test]
    fn block_shape_follows_layout() {
        let shapes = threads::run(3, |comm| {
            let a = PhaseSpace::new(&comm, 10, 7, LayoutMode::ByPosition).unwrap();
            let b = PhaseSpace::new(&comm, 10, 7, LayoutMode::ByVelocity).unwrap();
            (a.block().dim(), b.block().dim())
        });
        assert_eq!(shapes[0], ((4, 7), (3, 10)));
        assert_eq!(shapes[1], ((3, 7), (2, 10)));
        assert_eq!(shapes[2], ((3, 7), (2, 10)));
    }

    #[test]
    fn fill_uses_global_coordinates() {
        let x = Mesh::new(0.0, 9.0, 10).unwrap();
        let v = Mesh::new(0.0, 6.0, 7).unwrap();
        let blocks = threads::run(2, |comm| {
            let mut by_x = PhaseSpace::new(&comm, 10, 7, LayoutMode::ByPosition).unwrap();
            let mut by_v = PhaseSpace::new(&comm, 10, 7, LayoutMode::ByVelocity).unwrap();
            by_x.fill(&x, &v, sample);
            by_v.fill(&x, &v, sample);
            (by_x.block().to_owned(), by_v.block().to_owned())
        });
        // rank 1 owns x = 5..9 and v = 4..6
        assert_eq!(blocks[1].0[[0, 2]], 502.0);
        assert_eq!(blocks[1].1[[0, 2]], 204.0);
    }

    #[test]
    fn round_trip_through_both_layouts() {
        let x = Mesh::new(0.0, 12.0, 13).unwrap();
        let v = Mesh::new(-2.0, 2.0, 5).unwrap();
        for &p in &[1, 2, 3, 4] {
            let ok = threads::run(p, |comm| {
                let mut f = PhaseSpace::new(&comm, 13, 5, LayoutMode::ByPosition).unwrap();
                f.fill(&x, &v, sample);
                let original = f.block().to_owned();

                f.ensure_layout(&comm, LayoutMode::ByVelocity);
                let mut expected = PhaseSpace::new(&comm, 13, 5, LayoutMode::ByVelocity).unwrap();
                expected.fill(&x, &v, sample);
                let transposed = f.block() == expected.block();

                f.ensure_layout(&comm, LayoutMode::ByPosition);
                transposed && f.block() == original.view()
            });
            assert!(ok.iter().all(|&b| b), "layout exchange failed for {} ranks", p);
        }
    }

    #[test]
    fn ensure_layout_is_noop_when_satisfied() {
        let x = Mesh::new(0.0, 1.0, 8).unwrap();
        let v = Mesh::new(0.0, 1.0, 4).unwrap();
        threads::run(2, |comm| {
            let mut f = PhaseSpace::new(&comm, 8, 4, LayoutMode::ByVelocity).unwrap();
            f.fill(&x, &v, sample);
            let before = f.block().to_owned();
            f.ensure_layout(&comm, LayoutMode::ByVelocity);
            assert_eq!(f.layout(), LayoutMode::ByVelocity);
            assert_eq!(f.block(), before.view());
        });
    }
}
