//! The collective operations the diagnostics need from the message
//! passing layer.

use mpi::collective::SystemOperation;
use mpi::datatype::PartitionMut;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;

/// Blocking collectives over a fixed group of processes.
///
/// Every process in the group must make the same sequence of calls,
/// with mutually consistent counts, or the group deadlocks.
pub trait Collective {
    /// Rank of the calling process, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Variable-length all-gather. On return, the `counts[r]` elements
    /// sent by rank `r` occupy `recv[displs[r]..displs[r] + counts[r]]`
    /// on every rank. Counts and displacements are in elements.
    fn all_gather_varcount(&self, send: &[f64], recv: &mut [f64], counts: &[Count], displs: &[Count]);

    /// Sum of `local` over all ranks, returned on all ranks.
    fn all_reduce_sum(&self, local: f64) -> f64;
}

impl Collective for SimpleCommunicator {
    fn rank(&self) -> usize {
        Communicator::rank(self) as usize
    }

    fn size(&self) -> usize {
        Communicator::size(self) as usize
    }

    fn all_gather_varcount(&self, send: &[f64], recv: &mut [f64], counts: &[Count], displs: &[Count]) {
        let mut partition = PartitionMut::new(recv, counts, displs);
        self.all_gather_varcount_into(send, &mut partition);
    }

    fn all_reduce_sum(&self, local: f64) -> f64 {
        let mut global = 0.0;
        self.all_reduce_into(&local, &mut global, SystemOperation::sum());
        global
    }
}

/// Emulates a group of processes with threads, so that collectives
/// can be tested without `mpirun`.
#[cfg(test)]
pub mod threads {
    use std::sync::{Arc, Barrier, Mutex};
    use mpi::Count;
    use super::Collective;

    struct Shared {
        size: usize,
        barrier: Barrier,
        slots: Mutex<Vec<Vec<f64>>>,
    }

    pub struct ThreadComm {
        rank: usize,
        shared: Arc<Shared>,
    }

    impl ThreadComm {
        fn publish(&self, data: &[f64]) {
            self.shared.slots.lock().unwrap()[self.rank] = data.to_vec();
            self.shared.barrier.wait();
        }
    }

    impl Collective for ThreadComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.shared.size
        }

        fn all_gather_varcount(&self, send: &[f64], recv: &mut [f64], counts: &[Count], displs: &[Count]) {
            self.publish(send);
            {
                let slots = self.shared.slots.lock().unwrap();
                for (r, chunk) in slots.iter().enumerate() {
                    let (n, d) = (counts[r] as usize, displs[r] as usize);
                    assert_eq!(chunk.len(), n, "rank {} sent {} elements, rank {} expected {}", r, chunk.len(), self.rank, n);
                    recv[d..d + n].copy_from_slice(chunk);
                }
            }
            // nobody republishes until everyone has read
            self.shared.barrier.wait();
        }

        fn all_reduce_sum(&self, local: f64) -> f64 {
            self.publish(&[local]);
            let total = self.shared.slots.lock().unwrap()
                .iter()
                .map(|s| s[0])
                .sum::<f64>();
            self.shared.barrier.wait();
            total
        }
    }

    /// Runs `f` on `size` emulated ranks and returns the results in
    /// rank order.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where R: Send, F: Fn(ThreadComm) -> R + Sync {
        let shared = Arc::new(Shared {
            size: size,
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..size)
                .map(|rank| {
                    let comm = ThreadComm { rank: rank, shared: Arc::clone(&shared) };
                    let f = &f;
                    s.spawn(move || f(comm))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }
}
