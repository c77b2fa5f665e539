//! Support binarization and clades-to-preserve extraction (C3).
//!
//! Grounded on `LabelGTCRec.py`'s `binaryLabeling`: every node gets
//! `bin_conf = support >= threshold` (leaves default to confident, per
//! spec §4.2), and — on the top-level instance only — every internal node
//! with `bin_conf = true` and `cst ∈ {ROOT, INSIDE}` is collected into the
//! clades-to-preserve set.

use crate::error::{LabelGtcError, Result};
use crate::tree::{CstTag, GeneNode};

/// Binarizes `support` into `bin_conf` for every node in `gene`, against
/// `threshold`. Leaves are always confident, matching spec §4.2 and the
/// original's leaf default.
pub fn binarize(gene: &mut GeneNode, threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(LabelGtcError::ThresholdOutOfRange { value: threshold });
    }
    binarize_node(gene, threshold);
    Ok(())
}

fn binarize_node(node: &mut GeneNode, threshold: f64) {
    if node.is_leaf() {
        node.bin_conf = true;
    } else {
        node.bin_conf = node.support.map(|s| s >= threshold).unwrap_or(false);
    }
    for child in &mut node.children {
        binarize_node(child, threshold);
    }
}

/// A clade the final supertree must realise, identified by its topology
/// fingerprint and kept alongside its leaf set for containment checks
/// (spec §3, §4.2).
#[derive(Debug, Clone)]
pub struct Clade {
    pub fingerprint: u64,
    pub leaves: Vec<String>,
    pub newick: String,
}

/// Collects every internal node with `bin_conf = true` and
/// `cst ∈ {ROOT, INSIDE}` into the clades-to-preserve set, then prunes it to
/// a minimal antichain — no clade in the result is a strict subset of
/// another (spec §3, §9: "compute the minimal antichain" resolves the
/// original's mutate-during-iteration ambiguity around `clades_to_remove`).
pub fn collect_clades_to_preserve(gene: &GeneNode) -> Vec<Clade> {
    let mut candidates = Vec::new();
    collect_candidates(gene, &mut candidates);
    minimal_antichain(candidates)
}

fn collect_candidates(node: &GeneNode, out: &mut Vec<Clade>) {
    if !node.is_leaf() && node.bin_conf && matches!(node.cst, CstTag::Root | CstTag::Inside) {
        out.push(Clade {
            fingerprint: node.topology_fingerprint(),
            leaves: node.leaf_names(),
            newick: node.to_newick(),
        });
    }
    for child in &node.children {
        collect_candidates(child, out);
    }
}

fn minimal_antichain(candidates: Vec<Clade>) -> Vec<Clade> {
    use std::collections::HashSet;

    let sets: Vec<HashSet<&str>> = candidates
        .iter()
        .map(|c| c.leaves.iter().map(String::as_str).collect())
        .collect();

    let mut keep = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        for j in 0..candidates.len() {
            if i == j || !keep[i] {
                continue;
            }
            let strictly_smaller = sets[i].len() < sets[j].len();
            if strictly_smaller && sets[i].is_subset(&sets[j]) {
                keep[i] = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}
