//! Top-level recursive resolution engine (C6).
//!
//! Grounded on `LabelGTCRec.py`'s `LabelGTC` class: `mergeResolutions`
//! dispatches on the regime `classify` selects, `polyRes`/`init_polyRes`/
//! `init_m_polyRes` drive the PolytomySolver path, and `globalProcessing`
//! drives the MinSGT path. The original's module-level globals (`nbCalls`,
//! `MAX_SOL`, `clades_to_preserve_sgt`, `sol_per_subtree`) are replaced here
//! by explicit values: a [`Budget`] threaded through every dispatch, the
//! clades-to-preserve list computed once at the top level and passed down
//! by reference (spec §9), and plain return values standing in for
//! `sol_per_subtree`.

use crate::classify::{classify, Regime};
use crate::cst::validate_and_tag;
use crate::enumerate::{dedup_and_cap, Budget};
use crate::error::{LabelGtcError, Result};
use crate::label::{binarize, collect_clades_to_preserve, Clade};
use crate::lcse::compute_lcse;
use crate::solvers::{DlReconciliationSolver, MinSgtSolver, PolytomySolver};
use crate::species::SpeciesIndex;
use crate::tree::{CstTag, GeneNode, SpeciesNode};
use std::collections::HashSet;

/// A single gene-tree resolution instance (spec §6).
///
/// Construct with [`LabelGtc::new`] or [`LabelGtc::with_limit`], call
/// [`LabelGtc::resolve`] once, then read [`LabelGtc::regime`] and
/// [`LabelGtc::resolutions`].
pub struct LabelGtc {
    species: SpeciesNode,
    gene: GeneNode,
    cst: Vec<GeneNode>,
    threshold: f64,
    limit: usize,
    dup_cost: f64,
    loss_cost: f64,
    regime: Option<Regime>,
    special_case: bool,
    resolutions: Vec<GeneNode>,
}

impl LabelGtc {
    /// Builds an instance requesting a single resolution (spec §6 default
    /// `limit=1`).
    pub fn new(species: SpeciesNode, gene: GeneNode, cst: Vec<GeneNode>, threshold: f64) -> Result<Self> {
        Self::with_limit(species, gene, cst, threshold, 1)
    }

    pub fn with_limit(
        species: SpeciesNode,
        gene: GeneNode,
        cst: Vec<GeneNode>,
        threshold: f64,
        limit: usize,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(LabelGtcError::ThresholdOutOfRange { value: threshold });
        }
        Ok(LabelGtc {
            species,
            gene,
            cst,
            threshold,
            limit: limit.max(1),
            dup_cost: 1.0,
            loss_cost: 1.0,
            regime: None,
            special_case: false,
            resolutions: Vec::new(),
        })
    }

    /// The regime selected by the last [`LabelGtc::resolve`] call, or
    /// `None` before `resolve` has run.
    pub fn regime(&self) -> Option<Regime> {
        self.regime
    }

    /// The original's `special_case` diagnostic (spec §9): observability
    /// only, no effect on which trees are returned.
    pub fn special_case(&self) -> bool {
        self.special_case
    }

    /// The resolved gene trees, up to `limit`, deduplicated by topology and
    /// sorted by ascending duplication/loss cost. Empty before `resolve` has
    /// run.
    pub fn resolutions(&self) -> &[GeneNode] {
        &self.resolutions
    }

    /// Validates, classifies, and resolves the configured instance
    /// (spec §4.4, §4.5, §6). Idempotent: calling it again recomputes from
    /// the original inputs, matching spec §8's idempotence invariant.
    pub fn resolve(&mut self) -> Result<()> {
        let mut gene = self.gene.clone();
        validate_and_tag(&mut gene, &self.cst)?;
        binarize(&mut gene, self.threshold)?;

        let ctp = collect_clades_to_preserve(&gene);
        log::info!("computed {} clades to preserve", ctp.len());

        let species_index = SpeciesIndex::build(&self.species);
        let cst_is_leafset_only = self.cst.iter().all(GeneNode::is_leaf);
        let outcome = classify(&gene, cst_is_leafset_only);
        self.regime = Some(outcome.regime);
        self.special_case = outcome.special_case;
        log::debug!(
            "selected regime {:?} (special_case={})",
            outcome.regime,
            outcome.special_case
        );

        let mut budget = Budget::new(self.limit);
        let solutions = dispatch(
            &gene,
            &species_index,
            outcome.regime,
            self.threshold,
            &mut budget,
            &ctp,
            self.dup_cost,
            self.loss_cost,
        )?;

        let expected: HashSet<String> = gene.leaf_names().into_iter().collect();
        for solution in &solutions {
            let actual: HashSet<String> = solution.leaf_names().into_iter().collect();
            if actual != expected {
                return Err(LabelGtcError::Inconsistent {
                    expected: gene.leaf_names(),
                    actual: solution.leaf_names(),
                });
            }
        }

        self.resolutions = dedup_and_cap(solutions, self.limit);
        Ok(())
    }
}

/// Dispatches a single instance to the PolytomySolver or MinSGT path
/// (spec §4.4's regime table; MinTrs shares Global's handling, per
/// `classify`'s own doc comment).
#[allow(clippy::too_many_arguments)]
fn dispatch(
    gene: &GeneNode,
    species_index: &SpeciesIndex,
    regime: Regime,
    threshold: f64,
    budget: &mut Budget,
    ctp: &[Clade],
    dup_cost: f64,
    loss_cost: f64,
) -> Result<Vec<GeneNode>> {
    let k = budget.remaining();
    let out = match regime {
        Regime::MPolyRes | Regime::PolyRes => poly_res_path(gene, species_index, k, dup_cost, loss_cost)?,
        Regime::MinTrs | Regime::Global => {
            global_path(gene, species_index, threshold, k, ctp, dup_cost, loss_cost)?
        }
    };
    budget.deduct(out.len().max(1));
    Ok(out)
}

/// The PolytomySolver path (original's `polyRes`/`init_polyRes`/
/// `init_m_polyRes`): collapse every untagged low-confidence edge into a
/// polytomy — CST-`ROOT` subtrees are trusted wholesale and left intact —
/// then hand the resulting (possibly multifurcating) tree to
/// [`PolytomySolver`].
fn poly_res_path(
    gene: &GeneNode,
    species_index: &SpeciesIndex,
    k: usize,
    dup_cost: f64,
    loss_cost: f64,
) -> Result<Vec<GeneNode>> {
    let contracted = contract_low_confidence(gene.clone());
    let solver = DlReconciliationSolver;
    PolytomySolver::solve(&solver, &contracted, species_index, dup_cost, loss_cost, k)
}

/// Recursively flattens every untagged, low-confidence internal node into
/// its parent's child list, leaving CST-`ROOT` subtrees (trusted, given by
/// the caller) and leaves untouched.
fn contract_low_confidence(node: GeneNode) -> GeneNode {
    if node.is_leaf() || node.cst == CstTag::Root {
        return node;
    }
    let mut new_children = Vec::with_capacity(node.children.len());
    for child in node.children {
        let splice = !child.is_leaf() && child.cst != CstTag::Root && !child.bin_conf;
        let contracted_child = contract_low_confidence(child);
        if splice {
            new_children.extend(contracted_child.children);
        } else {
            new_children.push(contracted_child);
        }
    }
    let mut out = GeneNode::internal(new_children);
    out.cst = node.cst;
    out.bin_conf = node.bin_conf;
    out.support = node.support;
    out
}

/// The MinSGT path (original's `globalProcessing`): compute the LCSE, then
/// — for each item where `bin_conf=1`, `cst=UNTAGGED`, and at least one
/// child is itself non-leaf (spec §4.5 step 2's three-part gate) — recurse
/// into it as a fresh sub-instance, sharing one running [`Budget`] across
/// every sibling. Leaf items, already-trusted CST-`ROOT` items, and items
/// too small to recurse into are passed straight through unresolved, exactly
/// as `globalProcessing` does (`if g_node.binconfidence == 1 and
/// g_node.cst == 0 and <big enough>`). Items already carry correct
/// `cst`/`bin_conf` tags from the top-level validation pass (spec §2: only
/// the top-level call validates and labels), so no sub-instance re-runs
/// `validate_and_tag`.
#[allow(clippy::too_many_arguments)]
fn global_path(
    gene: &GeneNode,
    species_index: &SpeciesIndex,
    threshold: f64,
    k: usize,
    ctp: &[Clade],
    dup_cost: f64,
    loss_cost: f64,
) -> Result<Vec<GeneNode>> {
    let mut working = gene.clone();
    let items = compute_lcse(&mut working);
    log::debug!("global resolution over {} LCSE items", items.len());

    let mut resolved_items = Vec::with_capacity(items.len());
    let mut sub_budget = Budget::new(k);
    for item in &items {
        let should_recurse = item.cst == CstTag::Untagged
            && item.bin_conf
            && item.children.iter().any(|c| !c.is_leaf());
        if !should_recurse {
            resolved_items.push(item.clone());
            continue;
        }

        let sub_leafset_only = cst_leafset_only(item);
        let sub_outcome = classify(item, sub_leafset_only);
        log::trace!("recursive item resolved via {:?}", sub_outcome.regime);

        let sub_solutions = dispatch(
            item,
            species_index,
            sub_outcome.regime,
            threshold,
            &mut sub_budget,
            ctp,
            dup_cost,
            loss_cost,
        )?;
        resolved_items.push(sub_solutions.into_iter().next().unwrap_or_else(|| item.clone()));
    }

    let gene_leaves: HashSet<String> = gene.leaf_names().into_iter().collect();
    let relevant_ctp: Vec<Clade> = ctp
        .iter()
        .filter(|c| c.leaves.iter().all(|l| gene_leaves.contains(l)))
        .cloned()
        .collect();

    let solver = DlReconciliationSolver;
    MinSgtSolver::solve(&solver, &resolved_items, species_index, &relevant_ctp, k)
}

/// True iff no non-leaf node within `node` carries a CST-`ROOT` tag — the
/// local analogue of "the covering set is leaves-only" (spec §4.4's
/// M-POLYRES trigger) for a subtree whose tags were inherited rather than
/// freshly derived from a restricted covering set.
fn cst_leafset_only(node: &GeneNode) -> bool {
    if node.cst == CstTag::Root && !node.is_leaf() {
        return false;
    }
    node.children.iter().all(cst_leafset_only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_species_newick;

    fn gene(newick: &str) -> GeneNode {
        crate::tree::parse_gene_newick(newick).unwrap()
    }

    #[test]
    fn leafset_cst_resolves_via_m_polyres() {
        let species = parse_species_newick("((A,B),C);").unwrap();
        let g = gene("((a_A,b_B)0.2,c_C)0.2;");
        let cst = vec![gene("a_A;"), gene("b_B;"), gene("c_C;")];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 2).unwrap();
        engine.resolve().unwrap();

        assert_eq!(engine.regime(), Some(Regime::MPolyRes));
        assert!(!engine.resolutions().is_empty());
        let mut leaves = engine.resolutions()[0].leaf_names();
        leaves.sort();
        assert_eq!(leaves, vec!["a_A", "b_B", "c_C"]);
    }

    #[test]
    fn terminal_high_confidence_resolves_via_polyres() {
        let species = parse_species_newick("(((A,B),C),((D,E),F));").unwrap();
        let g = gene("(((a_A,b_B)0.9,c_C)0.9,((d_D,e_E)0.9,f_F)0.9)0.1;");
        let cst = vec![gene("((a_A,b_B),c_C);"), gene("((d_D,e_E),f_F);")];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 2).unwrap();
        engine.resolve().unwrap();

        assert_eq!(engine.regime(), Some(Regime::PolyRes));
        assert!(!engine.resolutions().is_empty());
        let mut leaves = engine.resolutions()[0].leaf_names();
        leaves.sort();
        assert_eq!(leaves, vec!["a_A", "b_B", "c_C", "d_D", "e_E", "f_F"]);
    }

    #[test]
    fn mixed_confidence_resolves_via_global() {
        let species = parse_species_newick("(((A,B),C),((D,E),F));").unwrap();
        let g = gene("(((a_A,b_B)0.9,c_C)0.9,((d_D,e_E)0.1,f_F)0.1)0.1;");
        let cst = vec![gene("((a_A,b_B),c_C);"), gene("((d_D,e_E),f_F);")];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 2).unwrap();
        engine.resolve().unwrap();

        assert_eq!(engine.regime(), Some(Regime::Global));
        assert!(!engine.resolutions().is_empty());
        let mut leaves = engine.resolutions()[0].leaf_names();
        leaves.sort();
        assert_eq!(leaves, vec!["a_A", "b_B", "c_C", "d_D", "e_E", "f_F"]);
    }

    #[test]
    fn resolve_is_idempotent() {
        let species = parse_species_newick("((A,B),C);").unwrap();
        let g = gene("((a_A,b_B)0.2,c_C)0.2;");
        let cst = vec![gene("a_A;"), gene("b_B;"), gene("c_C;")];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 1).unwrap();
        engine.resolve().unwrap();
        let first: Vec<u64> = engine
            .resolutions()
            .iter()
            .map(GeneNode::topology_fingerprint)
            .collect();
        engine.resolve().unwrap();
        let second: Vec<u64> = engine
            .resolutions()
            .iter()
            .map(GeneNode::topology_fingerprint)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn recursively_decomposes_two_independent_confident_subtrees() {
        // Neither three-leaf half matches a CST entry at its own root (the
        // CST only covers their finer-grained pieces), so each half is
        // admitted into the LCSE via confidence alone and recursed into
        // independently before the top level combines them.
        let species = parse_species_newick("(((A,B),C),((D,E),F));").unwrap();
        let g = gene("(((a_A,b_B)0.9,c_C)0.9,((d_D,e_E)0.9,f_F)0.9)0.1;");
        let cst = vec![
            gene("(a_A,b_B);"),
            gene("c_C;"),
            gene("(d_D,e_E);"),
            gene("f_F;"),
        ];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 2).unwrap();
        engine.resolve().unwrap();

        assert_eq!(engine.regime(), Some(Regime::Global));
        assert!(!engine.resolutions().is_empty());
        let mut leaves = engine.resolutions()[0].leaf_names();
        leaves.sort();
        assert_eq!(leaves, vec!["a_A", "b_B", "c_C", "d_D", "e_E", "f_F"]);
    }

    #[test]
    fn global_path_preserves_an_untouched_cst_root_item() {
        // The right-hand clade exactly matches a covering-set entry and is
        // tagged CST-ROOT despite its own low internal support; the
        // left-hand clade is untagged, confident, and contains a non-leaf
        // child, so only it recurses. The ROOT-tagged item must reach the
        // final output with its input topology intact, never re-resolved.
        let species = parse_species_newick("(((A,B),C),(D,E));").unwrap();
        let g = gene("(((a_A,b_B)0.9,c_C)0.9,((d_D,e_E)0,c2_C)0)0.1;");
        let preserved = gene("((d_D,e_E),c2_C);");
        let cst = vec![gene("(a_A,b_B);"), gene("c_C;"), preserved.clone()];
        let mut engine = LabelGtc::with_limit(species, g, cst, 0.7, 2).unwrap();
        engine.resolve().unwrap();

        assert_eq!(engine.regime(), Some(Regime::Global));
        assert!(!engine.resolutions().is_empty());

        let target: HashSet<String> = preserved.leaf_names().into_iter().collect();
        let embedded = find_by_leafset(&engine.resolutions()[0], &target)
            .expect("preserved clade missing from resolved output");
        assert_eq!(embedded.topology_fingerprint(), preserved.topology_fingerprint());
    }

    fn find_by_leafset<'a>(node: &'a GeneNode, target: &HashSet<String>) -> Option<&'a GeneNode> {
        let leaves: HashSet<String> = node.leaf_names().into_iter().collect();
        if &leaves == target {
            return Some(node);
        }
        node.children.iter().find_map(|c| find_by_leafset(c, target))
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let species = parse_species_newick("(A,B);").unwrap();
        let g = gene("(a_A,b_B);");
        let cst = vec![gene("a_A;"), gene("b_B;")];
        assert!(LabelGtc::new(species, g, cst, 1.5).is_err());
    }
}
