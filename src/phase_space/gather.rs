use ndarray::prelude::*;

use crate::comm::Collective;
use super::{Lease, PhaseSpace};

impl PhaseSpace {
    /// Reduces every local row of the block to `stride` values with
    /// `local`, then collects the contributions of all processes into
    /// `out`, ordered by global index along the split axis.
    ///
    /// Collective: must be called on all processes with the same `stride`.
    pub fn all_gather_rows<F>(&mut self, comm: &impl Collective, stride: usize, out: &mut [f64], mut local: F)
    where F: FnMut(ArrayView1<f64>, &mut [f64]) {
        assert!(stride > 0);
        let table = self.tables.table(self.layout);
        assert_eq!(out.len(), table.size() * stride);

        // scaled copies, the table itself stays in index units
        let counts = table.counts(stride);
        let displs = table.displs(stride);

        let Lease {send, recv} = self.scratch.lease(self.block.nrows() * stride, out.len());
        for (row, chunk) in self.block.outer_iter().zip(send.chunks_mut(stride)) {
            local(row, chunk);
        }

        comm.all_gather_varcount(send, recv, &counts, &displs);

        // Contributions arrive in rank order, which the table guarantees
        // is also index order
        let mut pos = 0;
        for r in 0..table.nranks() {
            let n = table.len_of(r) * stride;
            let start = table.i_min(r) * stride;
            out[start..start + n].copy_from_slice(&recv[pos..pos + n]);
            pos += n;
        }
    }
}
