//! Error taxonomy for the labelgtc engine (spec §7).
//!
//! All errors surface to the caller of [`crate::resolve::LabelGtc::resolve`];
//! there is no local retry anywhere in the engine — inputs are validated once
//! at the top level and a failure past that point indicates a malformed
//! input or a solver bug, not a transient condition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelGtcError {
    /// The covering set of trees does not tile the gene tree's leaves, or a
    /// declared subtree is not embedded in the gene tree.
    #[error("invalid covering set: {reason}")]
    InvalidCoveringSet { reason: String },

    /// An external solver (PolytomySolver or MinSGT) returned no solutions
    /// or malformed Newick.
    #[error("solver failure in {solver}: {reason}")]
    SolverFailure { solver: &'static str, reason: String },

    /// The threshold supplied to the engine lies outside [0, 1].
    #[error("threshold {value} is out of range [0, 1]")]
    ThresholdOutOfRange { value: f64 },

    /// A recursive call produced a tree whose leafset does not match the
    /// detached subtree's leafset.
    #[error("inconsistent result: expected leafset {expected:?}, got {actual:?}")]
    Inconsistent {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Newick could not be parsed by the underlying `phylotree` reader.
    #[error("failed to parse newick: {0}")]
    InvalidNewick(String),
}

pub type Result<T> = std::result::Result<T, LabelGtcError>;
