//! Offline reconciliation on the client side.

pub mod policy;
pub mod queue;
pub mod sync;

pub use policy::{Connectivity, Dispatch, dispatch};
pub use queue::{OfflineQueue, OfflineQueueEntry};
pub use sync::{LocalTransport, OfflineSync, PunchTransport, SubmitOutcome, SweepReport, TransportError};
