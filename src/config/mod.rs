//! Configuration management for the CFF search

pub mod settings;

pub use settings::{
    CliOverrides, SearchConfig, Settings, SolverConfig, StoreConfig, VerifierConfig,
};
