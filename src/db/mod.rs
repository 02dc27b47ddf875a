pub mod initialize;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod queries;
pub mod sqlite;
pub mod store;

pub use sqlite::SqliteStore;
pub use store::{ShiftStore, WorkerDirectory};
