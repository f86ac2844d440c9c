//! Persistent cache of (d, t, n) outcomes

pub mod record;
pub mod result_store;

pub use record::{OutcomeRecord, Status};
pub use result_store::{ResultStore, UpsertAction, UpsertPolicy};
