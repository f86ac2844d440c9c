//! Cover-free family parameters, decoding, verification and search

pub mod decoder;
pub mod params;
pub mod search;
pub mod verifier;

pub use decoder::{decode, Block};
pub use params::CffParams;
pub use search::{Outcome, Probe, SearchCursor, SearchDriver, SearchLimits};
pub use verifier::{is_cover_free, CoverFreeVerifier, Verdict};
