//! Covering-set-of-trees validation and tagging (C2).
//!
//! Grounded on `LabelGTCRec.py`'s `checkCovSetTree`: for each CST entry, in
//! input order, scan the gene tree in postorder and tag the first matching
//! node `ROOT`, then tag every strict descendant `INSIDE` — never
//! downgrading a node already `ROOT` to `INSIDE` (spec §3 invariant, §4.1
//! tie-break).

use crate::error::{LabelGtcError, Result};
use crate::tree::{CstTag, GeneNode};
use std::collections::HashSet;

/// Validates `gene` against `cst` and tags matched nodes in place.
///
/// Returns `Ok(())` on success. On failure, raises
/// [`LabelGtcError::InvalidCoveringSet`] naming the offending subtree index
/// or the leaf-set mismatch, per spec §4.1.
pub fn validate_and_tag(gene: &mut GeneNode, cst: &[GeneNode]) -> Result<()> {
    let gene_leaves: HashSet<String> = gene.leaf_names().into_iter().collect();

    let mut cst_leaf_total = 0usize;
    let mut cst_leaves: HashSet<String> = HashSet::new();
    for subtree in cst {
        let names = subtree.leaf_names();
        cst_leaf_total += names.len();
        cst_leaves.extend(names);
    }

    if cst_leaf_total != gene_leaves.len() {
        return Err(LabelGtcError::InvalidCoveringSet {
            reason: format!(
                "covering set leaf count {} does not equal gene tree leaf count {}",
                cst_leaf_total,
                gene_leaves.len()
            ),
        });
    }
    if cst_leaves != gene_leaves {
        return Err(LabelGtcError::InvalidCoveringSet {
            reason: "covering set leaf names do not match the gene tree's leaf names".to_string(),
        });
    }

    for (i, subtree) in cst.iter().enumerate() {
        if !tag_first_postorder_match(gene, subtree) {
            return Err(LabelGtcError::InvalidCoveringSet {
                reason: format!("covering set entry {i} is not embedded in the gene tree"),
            });
        }
    }

    Ok(())
}

/// Finds the first node (in postorder) of `gene` whose topology matches
/// `subtree`, tags it `ROOT` (unless it is already `ROOT`, in which case it
/// is left alone), and tags every strict descendant `INSIDE`. Returns
/// `true` iff a match was found anywhere in `gene`.
fn tag_first_postorder_match(gene: &mut GeneNode, subtree: &GeneNode) -> bool {
    let target_fp = subtree.topology_fingerprint();
    postorder_find_and_tag(gene, target_fp)
}

fn postorder_find_and_tag(node: &mut GeneNode, target_fp: u64) -> bool {
    for child in &mut node.children {
        if postorder_find_and_tag(child, target_fp) {
            return true;
        }
    }
    if node.topology_fingerprint() == target_fp {
        if node.cst != CstTag::Root {
            node.cst = CstTag::Root;
        }
        tag_descendants_inside(node);
        return true;
    }
    false
}

fn tag_descendants_inside(node: &mut GeneNode) {
    for child in &mut node.children {
        child.cst = CstTag::Inside;
        tag_descendants_inside(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_gene_newick;

    #[test]
    fn tags_root_and_inside() {
        let mut g = parse_gene_newick("((a_A,b_B),c_C);").unwrap();
        let cst = vec![
            parse_gene_newick("(a_A,b_B);").unwrap(),
            parse_gene_newick("c_C;").unwrap(),
        ];
        validate_and_tag(&mut g, &cst).unwrap();
        assert_eq!(g.children[0].cst, CstTag::Root);
        assert_eq!(g.children[0].children[0].cst, CstTag::Inside);
        assert_eq!(g.children[0].children[1].cst, CstTag::Inside);
        assert_eq!(g.children[1].cst, CstTag::Root);
    }

    #[test]
    fn rejects_missing_leaf() {
        let mut g = parse_gene_newick("((a_A,b_B),c_C);").unwrap();
        let cst = vec![parse_gene_newick("(a_A,b_B);").unwrap()];
        assert!(validate_and_tag(&mut g, &cst).is_err());
    }

    #[test]
    fn rejects_non_embedded_subtree() {
        let mut g = parse_gene_newick("((a_A,b_B),c_C);").unwrap();
        let cst = vec![
            parse_gene_newick("(a_A,c_C);").unwrap(),
            parse_gene_newick("b_B;").unwrap(),
        ];
        assert!(validate_and_tag(&mut g, &cst).is_err());
    }
}
