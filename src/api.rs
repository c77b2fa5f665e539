//! Python binding layer for the gene-tree resolution engine.
//!
//! Exposes [`crate::resolve::LabelGtc`] as a single `resolve` function
//! taking Newick strings in and returning the winning regime tag plus the
//! resolved Newick trees, mirroring how this crate's CLI (`main.rs`) drives
//! the same engine from files.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::resolve::LabelGtc;
use crate::tree::{parse_gene_newick, parse_species_newick};

/// Resolves `gene_newick` against `species_newick` and the covering set of
/// trees `cst_newick` (one Newick subtree per list entry).
///
/// Args:
///     species_newick: the species tree, Newick format
///     gene_newick: the gene tree to resolve, Newick format
///     cst_newick: the covering set of trusted gene subtrees, Newick format
///     threshold: confidence threshold in [0, 1] for binarizing support
///     limit: maximum number of alternative resolutions to return (default: 1)
///
/// Returns:
///     A tuple `(regime, resolutions)` where `regime` is one of
///     `"m-polyres"`, `"polyres"`, `"global"`, and `resolutions` is a list
///     of Newick strings, ordered by ascending reconciliation cost.
///
/// Raises:
///     ValueError: if the inputs are malformed or the covering set does not
///     tile the gene tree's leaves.
#[pyfunction]
#[pyo3(signature = (species_newick, gene_newick, cst_newick, threshold, limit=1))]
fn resolve(
    species_newick: String,
    gene_newick: String,
    cst_newick: Vec<String>,
    threshold: f64,
    limit: usize,
) -> PyResult<(String, Vec<String>)> {
    let species = parse_species_newick(&species_newick).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let gene = parse_gene_newick(&gene_newick).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let cst = cst_newick
        .iter()
        .map(|s| parse_gene_newick(s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let mut engine = LabelGtc::with_limit(species, gene, cst, threshold, limit)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    engine
        .resolve()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let regime = engine.regime().map(|r| r.as_str()).unwrap_or("unknown").to_string();
    let resolutions = engine.resolutions().iter().map(|t| t.to_newick()).collect();
    Ok((regime, resolutions))
}

/// Python module definition
#[pymodule]
fn labelgtc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(resolve, m)?)?;
    Ok(())
}
