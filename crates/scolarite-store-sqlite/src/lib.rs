//! SQLite backend for the Scolarité student store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Because every operation goes
//! through the same serialized connection and every mutating operation runs
//! inside one rusqlite transaction, guard checks and the writes they protect
//! are atomic relative to other writers.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;
