use ndarray::prelude::*;
use tracing::debug;

use crate::comm::Collective;
use super::{Lease, PhaseSpace};

impl PhaseSpace {
    /// Switches to the other layout mode.
    ///
    /// Every process contributes its whole block to a variable-length
    /// all-gather, which leaves the complete field on every process,
    /// and then keeps only the slab it owns in the new layout.
    pub(super) fn exchange(&mut self, comm: &impl Collective) {
        let from = self.layout;
        let to = from.other();
        let src = self.tables.table(from);
        let dst = self.tables.table(to);

        // elements carried by each index of the split axis
        let stride = dst.size();
        let counts = src.counts(stride);
        let displs = src.displs(stride);

        let Lease {send, recv} = self.scratch.lease(self.block.len(), src.size() * stride);
        for (s, f) in send.iter_mut().zip(self.block.iter()) {
            *s = *f;
        }

        comm.all_gather_varcount(send, recv, &counts, &displs);

        // recv now holds the global field as [from axis][to axis]
        let owned = dst.range(self.rank);
        let block = Array2::from_shape_fn((owned.len(), src.size()), |(i, j)| {
            recv[j * stride + owned.start + i]
        });

        debug!("rank {} switched from {} to {} layout, now owns {:?}", self.rank, from, to, owned);

        self.block = block;
        self.layout = to;
    }
}
