use std::fs;
use std::path::Path;
use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{LabelGtcError, Result};
use crate::tree::{parse_gene_newick, parse_species_newick, GeneNode, SpeciesNode};

/// Reads a single-tree Newick file (a species tree, or a gene tree) and
/// parses it into the engine's owned tree model.
pub fn read_species_tree<P: AsRef<Path>>(path: P) -> Result<SpeciesNode> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| LabelGtcError::InvalidNewick(format!("{}: {e}", path.as_ref().display())))?;
    parse_species_newick(content.trim())
}

/// Reads a single-tree Newick file as a gene tree.
pub fn read_gene_tree<P: AsRef<Path>>(path: P) -> Result<GeneNode> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| LabelGtcError::InvalidNewick(format!("{}: {e}", path.as_ref().display())))?;
    parse_gene_newick(content.trim())
}

/// Reads a covering-set-of-trees file: one Newick subtree per non-empty
/// line (spec §3's "list of disjoint gene subtrees" input format).
pub fn read_covering_set<P: AsRef<Path>>(path: P) -> Result<Vec<GeneNode>> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| LabelGtcError::InvalidNewick(format!("{}: {e}", path.as_ref().display())))?;
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(parse_gene_newick)
        .collect()
}

/// Writes resolved gene trees as Newick, one per line, gzip-compressed if
/// `path` ends in `.gz`, to stdout if `path` is `-`.
pub fn write_resolutions<P: AsRef<Path>>(path: P, trees: &[GeneNode]) -> io::Result<()> {
    let p = path.as_ref();
    let mut out: Box<dyn Write> = if p.as_os_str() == "-" {
        Box::new(io::stdout())
    } else if p.to_string_lossy().ends_with(".gz") {
        let f = fs::File::create(p)?;
        Box::new(GzEncoder::new(f, Compression::default()))
    } else {
        Box::new(fs::File::create(p)?)
    };

    for tree in trees {
        writeln!(out, "{}", tree.to_newick())?;
    }
    out.flush()
}
