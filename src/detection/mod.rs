//! Suspicion detection: signature inventory and scoring.
//!
//! Detection is substring and regex matching over decoded file text with
//! an additive score. Signatures target the call patterns web shells lean
//! on, not whole-file hashes, so mutated copies of known shells still
//! score.

pub mod matcher;
pub mod signature;

pub use matcher::PatternSet;
pub use signature::{builtin_signatures, Signature};
