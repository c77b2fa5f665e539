//! Largest Covering Set of Edges (C4).
//!
//! Grounded on `LabelGTCRec.py`'s `largerCSE`: breadth-first from the root,
//! tracking a growing `covered` leaf set; a child is folded into the LCSE
//! (and its leaves marked covered) the moment it is *admissible* and not
//! already subsumed, otherwise we descend into it. The loop in the original
//! stops "when the larger covering set of edges is found"; here that's
//! simply when `covered` reaches the full leafset (spec §4.3).

use crate::tree::{CstTag, GeneNode};
use std::collections::{HashSet, VecDeque};

/// Computes the LCSE of `gene`, tagging `lcse = true` on every included
/// node in place, and returns an owned clone of each included subtree (the
/// "covering set of edges" handed to the MinSGT wire format, spec §4.6).
pub fn compute_lcse(gene: &mut GeneNode) -> Vec<GeneNode> {
    let all_leaves: HashSet<String> = gene.leaf_names().into_iter().collect();
    let mut covered: HashSet<String> = HashSet::new();
    let mut included: Vec<GeneNode> = Vec::new();

    let mut queue: VecDeque<&mut GeneNode> = VecDeque::new();
    queue.push_back(gene);

    while let Some(node) = queue.pop_front() {
        if covered.len() >= all_leaves.len() {
            break;
        }
        for child in node.children.iter_mut() {
            let child_leaves = child.leaf_names();
            let fully_covered = child_leaves.iter().all(|l| covered.contains(l));
            if fully_covered {
                continue;
            }

            let admissible = is_admissible(child);
            if admissible {
                child.lcse = true;
                covered.extend(child_leaves);
                included.push(child.clone());
            } else {
                queue.push_back(child);
            }
        }
        if covered.len() >= all_leaves.len() {
            break;
        }
    }

    included
}

/// A node is admissible iff it's confident and not a strict descendant of
/// an already-matched CST clade, or it is itself the root of a matched CST
/// clade (spec §4.3).
fn is_admissible(node: &GeneNode) -> bool {
    (node.bin_conf && node.cst != CstTag::Inside) || node.cst == CstTag::Root
}
