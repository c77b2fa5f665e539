//! Species-tree indexing and LCA mapping.
//!
//! spec.md lists LCA mapping as "a utility (assumed available)" and out of
//! scope to design in detail. We still need a concrete one to drive the
//! solver adapters (C7), so this module provides the narrowest version that
//! does the job: index the species tree's leaves into a [`Bitset`]-backed
//! leafset per node (the same bottom-up DFS the teacher's `TreeSnapshot`
//! uses in `snapshot.rs`), then answer "LCA of this set of species names" by
//! finding the node with the smallest leafset that is a superset of the
//! query — the standard bitset formulation of LCA over a static tree.

use crate::bitset::Bitset;
use crate::tree::SpeciesNode;
use std::collections::HashMap;

/// A species tree indexed for repeated LCA queries.
pub struct SpeciesIndex {
    /// Flattened nodes in a stable preorder; `nodes[0]` is the root.
    nodes: Vec<IndexedNode>,
    name_to_index: HashMap<String, usize>,
    words: usize,
}

struct IndexedNode {
    leafset: Bitset,
    depth: usize,
    leaf_name: Option<String>,
}

impl SpeciesIndex {
    pub fn build(species: &SpeciesNode) -> Self {
        let mut names = species.leaf_names();
        names.sort();
        let name_to_index: HashMap<String, usize> = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        let words = name_to_index.len().div_ceil(64).max(1);

        let mut nodes = Vec::new();
        Self::flatten(species, 0, &name_to_index, words, &mut nodes);

        SpeciesIndex {
            nodes,
            name_to_index,
            words,
        }
    }

    fn flatten(
        node: &SpeciesNode,
        depth: usize,
        name_to_index: &HashMap<String, usize>,
        words: usize,
        out: &mut Vec<IndexedNode>,
    ) -> Bitset {
        if node.is_leaf() {
            let mut bs = Bitset::zeros(words);
            if let Some(name) = &node.name {
                if let Some(&idx) = name_to_index.get(name) {
                    bs.set(idx);
                }
            }
            out.push(IndexedNode {
                leafset: bs.clone(),
                depth,
                leaf_name: node.name.clone(),
            });
            return bs;
        }
        let mut leafset = Bitset::zeros(words);
        for child in &node.children {
            leafset.or_assign(&Self::flatten(child, depth + 1, name_to_index, words, out));
        }
        out.push(IndexedNode {
            leafset: leafset.clone(),
            depth,
            leaf_name: None,
        });
        leafset
    }

    /// Depth of the leaf labeled `species` (root = depth 0), or `None` if
    /// this species tree has no such leaf.
    pub fn leaf_depth(&self, species: &str) -> Option<usize> {
        let idx = *self.name_to_index.get(species)?;
        self.nodes
            .iter()
            .find(|n| n.leaf_name.as_deref() == Some(species))
            .filter(|n| n.leafset.get(idx))
            .map(|n| n.depth)
    }

    /// The lowest common ancestor of a set of species names: the species
    /// tree node with the smallest leafset that is a superset of the query.
    /// Returns `None` if any name is not a known species, or the query is
    /// empty.
    pub fn lca(&self, species_names: &[&str]) -> Option<SpeciesNodeId> {
        if species_names.is_empty() {
            return None;
        }
        let mut query = Bitset::zeros(self.words);
        for name in species_names {
            let idx = *self.name_to_index.get(*name)?;
            query.set(idx);
        }

        let mut best: Option<(usize, usize)> = None; // (node index, leafset popcount)
        for (i, node) in self.nodes.iter().enumerate() {
            if query.is_subset(&node.leafset) {
                let count = node.leafset.count_ones();
                if best.map(|(_, c)| count < c).unwrap_or(true) {
                    best = Some((i, count));
                }
            }
        }
        best.map(|(i, _)| SpeciesNodeId(i))
    }

    pub fn depth(&self, id: SpeciesNodeId) -> usize {
        self.nodes[id.0].depth
    }
}

/// Opaque handle to a node inside a [`SpeciesIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeciesNodeId(usize);
