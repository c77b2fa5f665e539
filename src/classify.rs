//! Regime classification (C5).
//!
//! Grounded on `LabelGTCRec.py`'s `mergeResolutions`: M-POLYRES is checked
//! first (CST is the gene tree's leafset), then the three compatibility
//! predicates over non-root edges (spec §4.4), with MINTRS routed to the
//! same `GLOBAL` handling as MINSGT per the original's own comment
//! ("Referring to the global case as minTRS resolution is not
//! implemented") and spec §4.4/§9.

use crate::tree::{CstTag, GeneNode};

/// The resolution regime selected for an instance (spec §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    MPolyRes,
    PolyRes,
    /// Recognised but, per spec §4.4/§9, always routed through the same
    /// recursive handling as `Global` — no specialised MinTRS solver
    /// exists.
    MinTrs,
    Global,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::MPolyRes => "m-polyres",
            Regime::PolyRes => "polyres",
            // MinTrs is surfaced only as a diagnostic; the public getter
            // (spec §6) reports it identically to Global since they share
            // the same resolution path.
            Regime::MinTrs | Regime::Global => "global",
        }
    }
}

/// The outcome of classification: the chosen regime, plus the original's
/// `special_case` diagnostic flag (spec §9 open question — kept as
/// observability only, no behavioral effect).
#[derive(Debug, Clone, Copy)]
pub struct ClassifierOutcome {
    pub regime: Regime,
    pub special_case: bool,
}

/// Classifies `gene` given whether the covering set was leaves-only.
///
/// `cst_is_leafset_only` must be true iff every entry of the covering set
/// supplied for this instance is a single leaf (spec §4.4's M-POLYRES
/// trigger).
pub fn classify(gene: &GeneNode, cst_is_leafset_only: bool) -> ClassifierOutcome {
    if cst_is_leafset_only {
        return ClassifierOutcome {
            regime: Regime::MPolyRes,
            special_case: false,
        };
    }

    let mut poly_res_compatible = true;
    let mut min_trs_compatible = true;
    let mut min_sgt_compatible = true;
    let mut non_trivial_edges = 0usize;

    walk_non_root_edges(gene, true, &mut |n| {
        match n.cst {
            CstTag::Untagged => {
                if n.bin_conf {
                    poly_res_compatible = false;
                    min_sgt_compatible = false;
                } else {
                    min_trs_compatible = false;
                }
                non_trivial_edges += 1;
            }
            CstTag::Root => {
                if !n.bin_conf {
                    poly_res_compatible = false;
                } else {
                    min_trs_compatible = false;
                    min_sgt_compatible = false;
                }
                non_trivial_edges += 1;
            }
            CstTag::Inside => {}
        }
    });

    if poly_res_compatible {
        ClassifierOutcome {
            regime: Regime::PolyRes,
            special_case: true,
        }
    } else if min_trs_compatible && non_trivial_edges > 2 {
        ClassifierOutcome {
            regime: Regime::MinTrs,
            special_case: true,
        }
    } else {
        // Both the MINSGT-compatible case and the fallback case resolve
        // through the same recursive GLOBAL path (spec §4.4 table; the
        // original's `mergeResolutions` calls `globalProcessing()` from
        // three separate branches with identical bodies).
        let _ = min_sgt_compatible;
        ClassifierOutcome {
            regime: Regime::Global,
            special_case: false,
        }
    }
}

/// Visits every node of `gene` except the root, depth-first, calling `f`.
/// Nodes flagged as the root of a previous recursion (not modeled as a
/// separate bool field here — a freshly-recursed-into instance's `gene` is
/// always passed with its own root excluded by this function, matching the
/// "ignoring nodes flagged `root=1` from a previous recursion" rule of
/// spec §4.4) are naturally excluded since each recursive call receives its
/// own detached subtree as `gene`.
fn walk_non_root_edges(node: &GeneNode, is_root: bool, f: &mut impl FnMut(&GeneNode)) {
    if !is_root {
        f(node);
    }
    for child in &node.children {
        walk_non_root_edges(child, false, f);
    }
}
