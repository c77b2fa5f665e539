//! Rooted labeled tree model (C1).
//!
//! Nodes are owned recursively — a [`GeneNode`] holds its children by value,
//! not by arena index or `Rc`. This is the idiom the design notes (spec §9)
//! point at directly: "model subtree detachment as returning ownership of
//! the subtree to the recursive call, and reattachment as a builder step
//! producing a fresh parent — avoiding weak-pointer cycles entirely." An
//! owned recursive tree gets this for free: detaching a subtree is just
//! moving a `GeneNode` out of its parent's `children` vector, and every
//! alternative refinement produced during recursive resolution (spec §4.5)
//! is a fully independent value with no aliasing to worry about.
//!
//! Annotations (`support`, `bin_conf`, `cst`, `lcse`) live inline on the node
//! rather than in a side table, because nothing here is shared: every
//! solution the engine enumerates is its own distinct tree, so "keyed by
//! node identity" collapses to "a field on the node."

use crate::bitset::Bitset;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Whether a node matches a covering-set-of-trees entry (spec §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CstTag {
    #[default]
    Untagged,
    Inside,
    Root,
}

/// A node of the gene tree under resolution.
///
/// Leaves have `children.is_empty()`, a `name` of the form `gene_SPECIES`,
/// and `support = None`. Internal nodes may or may not carry a `name`
/// (needed only for cross-referencing CST edges by name, mirroring the
/// original's `label_internal_node`); `support` is the node's confidence in
/// [0, 1], absent (`None`) if the input Newick didn't label it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneNode {
    pub name: Option<String>,
    pub support: Option<f64>,
    pub children: Vec<GeneNode>,

    pub bin_conf: bool,
    pub cst: CstTag,
    pub lcse: bool,
}

impl GeneNode {
    /// Builds a leaf node. Leaves are `bin_conf = true` by convention
    /// (spec §4.2).
    pub fn leaf(name: impl Into<String>) -> Self {
        GeneNode {
            name: Some(name.into()),
            support: None,
            children: Vec::new(),
            bin_conf: true,
            cst: CstTag::Untagged,
            lcse: false,
        }
    }

    /// Builds an internal node from two or more children.
    pub fn internal(children: Vec<GeneNode>) -> Self {
        GeneNode {
            name: None,
            support: None,
            children,
            bin_conf: false,
            cst: CstTag::Untagged,
            lcse: false,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The species tag of a leaf: the suffix after the last underscore in
    /// its name (spec §3). Returns `None` for internal nodes or leaves with
    /// no underscore.
    pub fn species(&self) -> Option<&str> {
        if !self.is_leaf() {
            return None;
        }
        let name = self.name.as_deref()?;
        name.rfind('_').map(|i| &name[i + 1..])
    }

    /// Names of every leaf under this node, in left-to-right (document)
    /// order.
    pub fn leaf_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_names(&mut out);
        out
    }

    fn collect_leaf_names(&self, out: &mut Vec<String>) {
        if self.is_leaf() {
            if let Some(n) = &self.name {
                out.push(n.clone());
            }
            return;
        }
        for c in &self.children {
            c.collect_leaf_names(out);
        }
    }

    /// An order-independent topology fingerprint: a Merkle-style hash over
    /// sorted child hashes and leaf names (spec §9). Used for CST matching,
    /// CTP-containment checks, and deduplication (C8).
    pub fn topology_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_into(&mut hasher);
        hasher.finish()
    }

    fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        if self.is_leaf() {
            0u8.hash(hasher);
            self.name.hash(hasher);
            return;
        }
        1u8.hash(hasher);
        let mut child_hashes: Vec<u64> = self
            .children
            .iter()
            .map(|c| c.topology_fingerprint())
            .collect();
        child_hashes.sort_unstable();
        child_hashes.hash(hasher);
    }

    /// True iff `self` and `other` have identical topology: same unordered
    /// child multiset, recursively, with identical leaf names (spec §4.1).
    /// Equivalent to, but cheaper to call repeatedly than, comparing
    /// [`GeneNode::topology_fingerprint`] (which it delegates to).
    pub fn same_topology(&self, other: &GeneNode) -> bool {
        self.topology_fingerprint() == other.topology_fingerprint()
    }

    /// Writes this node (and its subtree) as a Newick fragment, without the
    /// trailing `;`. Internal node support, where present, is written in the
    /// position Newick conventionally reserves for an internal label
    /// (`(a,b)0.8`), matching the convention the input trees use.
    pub fn write_newick(&self, out: &mut String) {
        if self.is_leaf() {
            out.push_str(self.name.as_deref().unwrap_or(""));
            return;
        }
        out.push('(');
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            child.write_newick(out);
        }
        out.push(')');
        if let Some(s) = self.support {
            out.push_str(&format!("{s}"));
        } else if let Some(n) = &self.name {
            out.push_str(n);
        }
    }

    pub fn to_newick(&self) -> String {
        let mut s = String::new();
        self.write_newick(&mut s);
        s.push(';');
        s
    }

    /// Builds a leaf-name → bit-index map sorted alphabetically, and the
    /// corresponding leafset bitset for this node, following the same
    /// canonical-ordering approach the teacher's `TreeSnapshot` uses to keep
    /// bitsets comparable across independently-parsed trees.
    pub fn leafset_index(&self) -> (HashMap<String, usize>, usize) {
        let mut names = self.leaf_names();
        names.sort();
        let index = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect::<HashMap<_, _>>();
        let words = index.len().div_ceil(64).max(1);
        (index, words)
    }

    /// The leafset of this node as a [`Bitset`], under the given naming
    /// index (as produced by [`GeneNode::leafset_index`] on some ancestor or
    /// on this node itself).
    pub fn leafset(&self, index: &HashMap<String, usize>, words: usize) -> Bitset {
        let mut bs = Bitset::zeros(words);
        for name in self.leaf_names() {
            if let Some(&idx) = index.get(&name) {
                bs.set(idx);
            }
        }
        bs
    }
}

/// Parses a gene or CST Newick string into an owned [`GeneNode`] tree,
/// reading internal node labels as support values (spec §3: "internal
/// nodes carry support values"). Delegates actual Newick grammar handling
/// to `phylotree`, then walks the parsed tree once to build our own owned
/// representation.
pub fn parse_gene_newick(newick: &str) -> crate::error::Result<GeneNode> {
    let tree = phylotree::tree::Tree::from_newick(newick)
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;
    let root_id = tree
        .get_root()
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;
    convert_gene_node(&tree, root_id)
}

fn convert_gene_node(
    tree: &phylotree::tree::Tree,
    node_id: usize,
) -> crate::error::Result<GeneNode> {
    let node = tree
        .get(&node_id)
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;

    if node.children.is_empty() {
        return Ok(GeneNode::leaf(node.name.clone().unwrap_or_default()));
    }

    let mut children = Vec::with_capacity(node.children.len());
    for &child_id in &node.children {
        children.push(convert_gene_node(tree, child_id)?);
    }
    let mut internal = GeneNode::internal(children);
    internal.support = node.name.as_deref().and_then(|s| s.parse::<f64>().ok());
    Ok(internal)
}

/// A rooted species tree node. No support values (species trees are
/// trusted as-given); internal nodes are given synthetic names during LCA
/// mapping so the original's `speciesTree.label_internal_node()` step has a
/// direct counterpart here (see [`crate::species`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesNode {
    pub name: Option<String>,
    pub children: Vec<SpeciesNode>,
}

impl SpeciesNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn leaf_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_names(&mut out);
        out
    }

    fn collect_leaf_names(&self, out: &mut Vec<String>) {
        if self.is_leaf() {
            if let Some(n) = &self.name {
                out.push(n.clone());
            }
            return;
        }
        for c in &self.children {
            c.collect_leaf_names(out);
        }
    }
}

pub fn parse_species_newick(newick: &str) -> crate::error::Result<SpeciesNode> {
    let tree = phylotree::tree::Tree::from_newick(newick)
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;
    let root_id = tree
        .get_root()
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;
    convert_species_node(&tree, root_id)
}

fn convert_species_node(
    tree: &phylotree::tree::Tree,
    node_id: usize,
) -> crate::error::Result<SpeciesNode> {
    let node = tree
        .get(&node_id)
        .map_err(|e| crate::error::LabelGtcError::InvalidNewick(e.to_string()))?;
    if node.children.is_empty() {
        return Ok(SpeciesNode {
            name: node.name.clone(),
            children: Vec::new(),
        });
    }
    let mut children = Vec::with_capacity(node.children.len());
    for &child_id in &node.children {
        children.push(convert_species_node(tree, child_id)?);
    }
    Ok(SpeciesNode {
        name: node.name.clone(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_support_labelled_gene_tree() {
        let g = parse_gene_newick("((a_A,b_B)0.9,c_C)0.2;").unwrap();
        assert_eq!(g.support, Some(0.2));
        assert_eq!(g.children[0].support, Some(0.9));
        assert_eq!(g.children[1].name.as_deref(), Some("c_C"));
        assert_eq!(g.children[1].species(), Some("C"));
    }

    #[test]
    fn leaf_names_in_document_order() {
        let g = parse_gene_newick("((a_A,b_B),c_C);").unwrap();
        assert_eq!(g.leaf_names(), vec!["a_A", "b_B", "c_C"]);
    }

    #[test]
    fn topology_fingerprint_is_order_independent() {
        let t1 = parse_gene_newick("(a_A,b_B);").unwrap();
        let t2 = parse_gene_newick("(b_B,a_A);").unwrap();
        assert_eq!(t1.topology_fingerprint(), t2.topology_fingerprint());
    }

    #[test]
    fn topology_fingerprint_distinguishes_different_trees() {
        let t1 = parse_gene_newick("(a_A,b_B);").unwrap();
        let t2 = parse_gene_newick("(a_A,c_C);").unwrap();
        assert_ne!(t1.topology_fingerprint(), t2.topology_fingerprint());
    }

    #[test]
    fn newick_roundtrips_leafset() {
        let g = parse_gene_newick("((a_A,b_B),c_C);").unwrap();
        let s = g.to_newick();
        let g2 = parse_gene_newick(&s).unwrap();
        assert_eq!(g.leaf_names(), g2.leaf_names());
    }
}
