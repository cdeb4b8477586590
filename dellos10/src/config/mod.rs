//! Configuration lifecycle and diffing.
//!
//! A candidate is staged as a file on the device, then either committed
//! (merge only; a rollback snapshot is always taken first) or discarded.
//! [`diff`] compares two configuration texts structurally and backs
//! [`Os10Driver::compare_candidate`](crate::driver::Os10Driver::compare_candidate).

mod diff;
mod lifecycle;

pub use diff::{ConfigDiff, diff};
pub(crate) use lifecycle::Lifecycle;
pub use lifecycle::{CandidateSource, ConfigMode, LifecycleState};
