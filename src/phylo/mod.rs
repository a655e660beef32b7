pub mod distance;
pub mod newick;
pub mod tree;

pub use distance::{
    dna_distance_matrix, protein_distance_matrix, DistanceMatrix, DnaDistanceModel, GapDeletion,
    ProteinDistanceModel,
};
pub use newick::to_newick;
pub use tree::{neighbor_joining, upgma, PhyloNode, PhyloTree};

use crate::align::Msa;
use crate::error::SeqResult;

#[cfg(test)]
mod tests;

/// Neighbor-joining tree from a nucleotide alignment: byte rows, distance
/// matrix under `model` and `deletion`, then NJ. Pure delegation.
pub fn nj_tree_dna(
    msa: &Msa,
    model: DnaDistanceModel,
    deletion: GapDeletion,
) -> SeqResult<PhyloTree> {
    let rows = msa.byte_rows();
    let dm = dna_distance_matrix(&rows, msa.labels(), model, deletion)?;
    neighbor_joining(&dm)
}

/// Neighbor-joining tree from a protein alignment.
pub fn nj_tree_protein(
    msa: &Msa,
    model: ProteinDistanceModel,
    deletion: GapDeletion,
) -> SeqResult<PhyloTree> {
    let rows = msa.byte_rows();
    let dm = protein_distance_matrix(&rows, msa.labels(), model, deletion)?;
    neighbor_joining(&dm)
}
