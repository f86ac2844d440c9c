//! SAT encoding and solving components

pub mod combinations;
pub mod constraints;
pub mod encoder;
pub mod solver;
pub mod variables;

pub use combinations::combinations;
pub use constraints::{Clause, Formula};
pub use encoder::{CffEncoder, EncodingStatistics};
pub use solver::{CadicalOracle, SatOracle, SatSolver, SolveVerdict};
pub use variables::VariableLayout;
