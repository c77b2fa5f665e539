//! Solver adapters (C7): a uniform interface over the external
//! PolytomySolver and MinSGT black boxes (spec §1, §4.6, §6).
//!
//! Both solvers are explicitly out of scope to implement for real — the
//! dynamic program behind PolytomySolver and the supertree search behind
//! MinSGT are named as external collaborators accessed only through the
//! narrow interfaces below. [`PolytomySolver`] and [`MinSgtSolver`] are
//! those interfaces; [`DlReconciliationSolver`] is a reference
//! implementation satisfying both, built around the same duplication/loss
//! cost model spec.md names throughout (§1, GLOSSARY), so the crate is
//! testable end-to-end without a real backend. Swap in a real DP by
//! implementing the traits — nothing in `resolve.rs` depends on this
//! struct directly.

use crate::error::{LabelGtcError, Result};
use crate::label::Clade;
use crate::species::{SpeciesIndex, SpeciesNodeId};
use crate::tree::GeneNode;
use std::cmp::Ordering;

/// Doubles underscores in a leaf name before it crosses the external-solver
/// wire boundary, matching the original's `newStrTree =
/// strTree.replace("_", "__")` (spec §4.6: the underlying solver is
/// bit-sensitive to underscore as a separator).
pub fn escape_underscores(name: &str) -> String {
    name.replace('_', "__")
}

/// Inverse of [`escape_underscores`] (the original's
/// `res.replace("__", "_")`).
pub fn unescape_underscores(name: &str) -> String {
    name.replace("__", "_")
}

/// Narrow interface over the external PolytomySolver (spec §4.6). Input is
/// a gene (sub)tree with some nodes already multifurcating (a polytomy);
/// children of arity-2 nodes are left untouched. Returns up to `k` binary
/// refinements, sorted by ascending duplication/loss cost.
pub trait PolytomySolver {
    fn solve(
        &self,
        polytomy: &GeneNode,
        species: &SpeciesIndex,
        dup_cost: f64,
        loss_cost: f64,
        k: usize,
    ) -> Result<Vec<GeneNode>>;
}

/// Narrow interface over the external MinSGT supertree solver (spec §4.6).
/// `items` are the leaf-disjoint LCSE subtrees to combine; `ctp` names the
/// clades any returned supertree must embed verbatim. Returns up to `k`
/// supertrees, sorted by ascending duplication/loss cost.
pub trait MinSgtSolver {
    fn solve(
        &self,
        items: &[GeneNode],
        species: &SpeciesIndex,
        ctp: &[Clade],
        k: usize,
    ) -> Result<Vec<GeneNode>>;
}

/// Reference adapter for both traits, scoring candidates by the classic
/// Zmasek/Eddy duplication-loss reconciliation cost against a [`SpeciesIndex`]
/// LCA map. This is deliberately the simplest implementation that satisfies
/// the contract — full enumeration of binary shapes at each polytomy,
/// capped and logged when truncated — not the production dynamic program
/// spec.md excludes from scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct DlReconciliationSolver;

impl PolytomySolver for DlReconciliationSolver {
    fn solve(
        &self,
        polytomy: &GeneNode,
        species: &SpeciesIndex,
        dup_cost: f64,
        loss_cost: f64,
        k: usize,
    ) -> Result<Vec<GeneNode>> {
        let k = k.max(1);
        let candidates = resolve_all(polytomy, k);
        if candidates.is_empty() {
            return Err(LabelGtcError::SolverFailure {
                solver: "PolytomySolver",
                reason: "no binary refinement could be constructed".to_string(),
            });
        }
        rank_and_cap(candidates, species, dup_cost, loss_cost, k)
    }
}

impl MinSgtSolver for DlReconciliationSolver {
    fn solve(
        &self,
        items: &[GeneNode],
        species: &SpeciesIndex,
        ctp: &[Clade],
        k: usize,
    ) -> Result<Vec<GeneNode>> {
        let k = k.max(1);
        if items.is_empty() {
            return Err(LabelGtcError::SolverFailure {
                solver: "MinSGT",
                reason: "no subtrees supplied".to_string(),
            });
        }
        if items.len() == 1 {
            return Ok(vec![items[0].clone()]);
        }

        for item in items {
            log::trace!(
                "minsgt wire item: {}",
                escape_underscores(&item.to_newick())
            );
        }

        let shapes = enumerate_binary_shapes(items.to_vec());
        if shapes.len() > k * 8 {
            log::warn!(
                "minsgt: truncating {} candidate supertree shapes to budget",
                shapes.len()
            );
        }

        let candidates: Vec<GeneNode> = shapes
            .into_iter()
            .filter(|tree| satisfies_clades_to_preserve(tree, ctp))
            .collect();

        if candidates.is_empty() {
            return Err(LabelGtcError::SolverFailure {
                solver: "MinSGT",
                reason: "no supertree satisfies the clades to preserve".to_string(),
            });
        }

        rank_and_cap(candidates, species, 1.0, 1.0, k)
    }
}

fn rank_and_cap(
    candidates: Vec<GeneNode>,
    species: &SpeciesIndex,
    dup_cost: f64,
    loss_cost: f64,
    k: usize,
) -> Result<Vec<GeneNode>> {
    let mut scored: Vec<(f64, GeneNode)> = Vec::with_capacity(candidates.len());
    for tree in candidates {
        let cost = reconciliation_cost(&tree, species, dup_cost, loss_cost)?;
        scored.push((cost, tree));
    }
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let trees: Vec<GeneNode> = scored.into_iter().map(|(_, t)| t).collect();
    Ok(crate::enumerate::dedup_and_cap(trees, k))
}

/// True iff every clade in `ctp` whose leafset is a subset of `tree`'s
/// leafset appears in `tree` as an embedded, topologically identical
/// subtree (spec §4.6/§8 "CTP preservation").
fn satisfies_clades_to_preserve(tree: &GeneNode, ctp: &[Clade]) -> bool {
    let tree_leaves: std::collections::HashSet<String> = tree.leaf_names().into_iter().collect();
    for clade in ctp {
        let clade_leaves: std::collections::HashSet<&str> =
            clade.leaves.iter().map(String::as_str).collect();
        let in_scope = clade_leaves.iter().all(|l| tree_leaves.contains(*l));
        if in_scope && !contains_clade(tree, clade) {
            return false;
        }
    }
    true
}

fn contains_clade(node: &GeneNode, clade: &Clade) -> bool {
    if node.topology_fingerprint() == clade.fingerprint {
        return true;
    }
    node.children.iter().any(|c| contains_clade(c, clade))
}

/// Recursively resolves every polytomy in `node` into up to `k` binary
/// candidates. Arity-2 nodes are combined by cartesian product of their
/// (already resolved) children's candidate lists; arity-N nodes (N > 2)
/// enumerate all distinct full binary shapes over a representative
/// resolution of each child.
fn resolve_all(node: &GeneNode, k: usize) -> Vec<GeneNode> {
    if node.is_leaf() {
        return vec![node.clone()];
    }

    let child_alts: Vec<Vec<GeneNode>> = node.children.iter().map(|c| resolve_all(c, k)).collect();

    match node.children.len() {
        0 => vec![node.clone()],
        2 => {
            let mut out = Vec::new();
            'outer: for l in &child_alts[0] {
                for r in &child_alts[1] {
                    out.push(GeneNode::internal(vec![l.clone(), r.clone()]));
                    if out.len() >= k {
                        break 'outer;
                    }
                }
            }
            out
        }
        _ => {
            let items: Vec<GeneNode> = child_alts.into_iter().map(|alts| alts[0].clone()).collect();
            let mut shapes = enumerate_binary_shapes(items);
            if shapes.len() > k {
                log::warn!(
                    "polytomysolver: truncating {} candidate shapes to the requested {k}",
                    shapes.len()
                );
            }
            shapes.truncate(k);
            shapes
        }
    }
}

/// Enumerates every distinct full binary tree over the unordered multiset
/// `items`, treating each item as an opaque leaf of the combination. Each
/// unordered bipartition of `items` into two nonempty groups is visited
/// exactly once by always keeping `items[0]` in the left group.
fn enumerate_binary_shapes(items: Vec<GeneNode>) -> Vec<GeneNode> {
    if items.len() == 1 {
        return vec![items.into_iter().next().unwrap()];
    }

    let mut out = Vec::new();
    let n = items.len();
    // Enumerate nonempty proper subsets of {1..n-1} to pair with item 0;
    // `mask` ranges over subsets of the remaining n-1 items that join item
    // 0 in the left group.
    for mask in 0..(1u32 << (n - 1)) {
        let mut left = vec![items[0].clone()];
        let mut right = Vec::new();
        for (i, item) in items.iter().enumerate().skip(1) {
            if mask & (1 << (i - 1)) != 0 {
                left.push(item.clone());
            } else {
                right.push(item.clone());
            }
        }
        if right.is_empty() {
            continue;
        }
        let left_shapes = enumerate_binary_shapes(left);
        let right_shapes = enumerate_binary_shapes(right);
        for l in &left_shapes {
            for r in &right_shapes {
                out.push(GeneNode::internal(vec![l.clone(), r.clone()]));
            }
        }
    }
    out
}

fn species_of_leaf_name(name: &str) -> &str {
    name.rfind('_').map(|i| &name[i + 1..]).unwrap_or(name)
}

fn map_to_species(node: &GeneNode, species: &SpeciesIndex) -> Option<SpeciesNodeId> {
    let names = node.leaf_names();
    let tags: Vec<&str> = names.iter().map(|n| species_of_leaf_name(n)).collect();
    species.lca(&tags)
}

/// Duplication/loss reconciliation cost of a fully-binary gene tree against
/// a species tree, via the standard LCA-mapping formula (Zmasek & Eddy
/// 2001): a gene node is a duplication iff its species mapping equals one
/// of its children's; losses accrue for each species-tree edge skipped
/// between a node's mapping and a child's.
fn reconciliation_cost(
    gene: &GeneNode,
    species: &SpeciesIndex,
    dup_cost: f64,
    loss_cost: f64,
) -> Result<f64> {
    if gene.is_leaf() {
        return Ok(0.0);
    }

    let my_species = map_to_species(gene, species).ok_or_else(|| LabelGtcError::SolverFailure {
        solver: "reconciliation",
        reason: format!("no species mapping for clade {:?}", gene.leaf_names()),
    })?;
    let my_depth = species.depth(my_species);

    let mut cost = 0.0;
    let mut is_dup = false;
    for child in &gene.children {
        cost += reconciliation_cost(child, species, dup_cost, loss_cost)?;

        let child_species =
            map_to_species(child, species).ok_or_else(|| LabelGtcError::SolverFailure {
                solver: "reconciliation",
                reason: format!("no species mapping for clade {:?}", child.leaf_names()),
            })?;
        let child_depth = species.depth(child_species);

        if child_species == my_species {
            is_dup = true;
            cost += loss_cost * child_depth.saturating_sub(my_depth) as f64;
        } else {
            cost += loss_cost * child_depth.saturating_sub(my_depth).saturating_sub(1) as f64;
        }
    }
    if is_dup {
        cost += dup_cost;
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{parse_gene_newick, parse_species_newick};

    #[test]
    fn escape_roundtrips() {
        let n = "a_1_B";
        assert_eq!(unescape_underscores(&escape_underscores(n)), n);
    }

    #[test]
    fn enumerate_binary_shapes_three_items_has_three_shapes() {
        let items = vec![
            GeneNode::leaf("a_A"),
            GeneNode::leaf("b_B"),
            GeneNode::leaf("c_C"),
        ];
        let shapes = enumerate_binary_shapes(items);
        // (a,(b,c)), (b,(a,c)), (c,(a,b)) — three distinct rooted binary
        // shapes over three leaves.
        assert_eq!(shapes.len(), 3);
        let mut fps: Vec<u64> = shapes.iter().map(|t| t.topology_fingerprint()).collect();
        fps.sort_unstable();
        fps.dedup();
        assert_eq!(fps.len(), 3);
    }

    #[test]
    fn polytomy_solver_resolves_a_simple_trifurcation() {
        let species = parse_species_newick("((A,B),C);").unwrap();
        let idx = SpeciesIndex::build(&species);
        let polytomy = GeneNode::internal(vec![
            GeneNode::leaf("a_A"),
            GeneNode::leaf("b_B"),
            GeneNode::leaf("c_C"),
        ]);
        let solver = DlReconciliationSolver;
        let out = PolytomySolver::solve(&solver, &polytomy, &idx, 1.0, 1.0, 3).unwrap();
        assert!(!out.is_empty());
        for t in &out {
            assert_eq!(t.children.len(), 2);
        }
        // The cheapest refinement should group (a_A,b_B) first, matching
        // species tree topology ((A,B),C).
        let best = &out[0];
        let mut names = best.leaf_names();
        names.sort();
        assert_eq!(names, vec!["a_A", "b_B", "c_C"]);
    }

    #[test]
    fn min_sgt_combines_leaf_disjoint_items() {
        let species = parse_species_newick("((A,B),(C,D));").unwrap();
        let idx = SpeciesIndex::build(&species);
        let items = vec![
            parse_gene_newick("(a1_A,b1_B);").unwrap(),
            parse_gene_newick("(c1_C,d1_D);").unwrap(),
        ];
        let solver = DlReconciliationSolver;
        let out = MinSgtSolver::solve(&solver, &items, &idx, &[], 2).unwrap();
        assert!(!out.is_empty());
        let mut names = out[0].leaf_names();
        names.sort();
        assert_eq!(names, vec!["a1_A", "b1_B", "c1_C", "d1_D"]);
    }
}
