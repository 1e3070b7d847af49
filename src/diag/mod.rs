//! Diagnostics computed from the distribution function and the fields
//! derived from it.
//!
//! Any diagnostic that takes a `PhaseSpace` is collective, and brings
//! the field into `ByPosition` layout before reading it, so that each
//! process holds complete velocity rows. All processes must call the
//! same diagnostics in the same order.

mod reduce;
mod output;
mod snapshot;

pub use self::reduce::*;
pub use self::output::*;
pub use self::snapshot::*;
