//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `error`: the engine's typed error taxonomy.
//! - `tree`: the owned recursive gene/species tree model (C1).
//! - `species`: species-tree LCA indexing, used by the solver adapters.
//! - `cst`: covering-set-of-trees validation and tagging (C2).
//! - `label`: support binarization and clades-to-preserve extraction (C3).
//! - `lcse`: largest covering set of edges (C4).
//! - `classify`: resolution regime classification (C5).
//! - `solvers`: PolytomySolver / MinSGT adapter traits and a reference
//!   implementation (C7).
//! - `enumerate`: multi-solution budget and deduplication (C8).
//! - `resolve`: the top-level recursive resolution engine (C6).
//! - `io`: reading and writing tree files.
//! - `bitset`: compact bitset representation for tree partitions, used by
//!   `species` to index leafsets.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).
//!
//! Public API kept stable by re-exporting key items from the new modules.

pub mod bitset;
pub mod classify;
pub mod cst;
pub mod enumerate;
pub mod error;
pub mod io;
pub mod label;
pub mod lcse;
pub mod resolve;
pub mod solvers;
pub mod species;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use classify::Regime;
pub use error::{LabelGtcError, Result};
pub use resolve::LabelGtc;
pub use tree::{GeneNode, SpeciesNode};
