//! d-cover-free family search through SAT
//!
//! A d-cover-free family is a family of n blocks over the universe
//! {1..t} in which no block is contained in the union of any d others.
//! This library encodes the existence question for a triple (d, t, n) as
//! CNF, solves it with CaDiCaL under a time budget, decodes the model into
//! blocks and caches every verdict in a JSON result store.

pub mod cff;
pub mod config;
pub mod error;
pub mod sat;
pub mod store;
pub mod utils;

pub use cff::{CffParams, Probe, SearchCursor, SearchDriver, SearchLimits};
pub use config::Settings;
pub use error::{CffError, Result};
pub use store::{OutcomeRecord, ResultStore, Status};
