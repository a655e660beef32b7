use super::*;
use crate::align::Msa;

fn labels(names: &[&str]) -> Vec<Box<str>> {
    names
        .iter()
        .map(|s| s.to_string().into_boxed_str())
        .collect()
}

fn dna_pdist(seqs: &[&[u8]], names: &[&str]) -> DistanceMatrix {
    dna_distance_matrix(
        seqs,
        labels(names),
        DnaDistanceModel::PDistance,
        GapDeletion::Pairwise,
    )
    .unwrap()
}

// ─── p-distance ─────────────────────────────────────────────

#[test]
fn pdist_identical() {
    let dm = dna_pdist(&[b"ACGT", b"ACGT"], &["a", "b"]);
    assert_eq!(dm.get(0, 1), 0.0);
    assert_eq!(dm.get(1, 0), 0.0);
    assert_eq!(dm.get(0, 0), 0.0);
}

#[test]
fn pdist_known() {
    // 2 mismatches out of 4
    let dm = dna_pdist(&[b"ACGT", b"ATAT"], &["a", "b"]);
    assert!((dm.get(0, 1) - 0.5).abs() < 1e-10);
}

#[test]
fn pdist_three_seqs() {
    let dm = dna_pdist(&[b"AAAA", b"AAAT", b"AATT"], &["a", "b", "c"]);
    assert!((dm.get(0, 1) - 0.25).abs() < 1e-10);
    assert!((dm.get(0, 2) - 0.50).abs() < 1e-10);
    assert!((dm.get(1, 2) - 0.25).abs() < 1e-10);
}

// ─── gap deletion modes ─────────────────────────────────────

#[test]
fn pairwise_deletion_skips_per_pair() {
    // Position 1 has a gap in seq b only; it is skipped for pairs with b
    // but still counted for (a,c).
    let seqs: Vec<&[u8]> = vec![b"ACGT", b"A-GT", b"ATGT"];
    let dm = dna_pdist(&seqs, &["a", "b", "c"]);
    assert!((dm.get(0, 1) - 0.0).abs() < 1e-10);
    // a vs c: 4 valid sites, 1 mismatch
    assert!((dm.get(0, 2) - 0.25).abs() < 1e-10);
}

#[test]
fn complete_deletion_masks_the_column_for_all_pairs() {
    let seqs: Vec<&[u8]> = vec![b"ACGT", b"A-GT", b"ATGT"];
    let dm = dna_distance_matrix(
        &seqs,
        labels(&["a", "b", "c"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Complete,
    )
    .unwrap();
    // Column 1 is dropped everywhere: a vs c compares 3 sites, all equal.
    assert!((dm.get(0, 2) - 0.0).abs() < 1e-10);
    assert!((dm.get(0, 1) - 0.0).abs() < 1e-10);
}

#[test]
fn gap_dot_is_gap() {
    let dm = dna_pdist(&[b"ACGT", b"A.GT"], &["a", "b"]);
    assert!((dm.get(0, 1) - 0.0).abs() < 1e-10);
}

// ─── Jukes-Cantor ───────────────────────────────────────────

#[test]
fn jc69_small() {
    // p = 0.1 -> JC = -3/4 * ln(1 - 4*0.1/3)
    let seqs: Vec<&[u8]> = vec![b"AAAAAAAAAA", b"TAAAAAAAAA"];
    let dm = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::JukesCantor,
        GapDeletion::Pairwise,
    )
    .unwrap();
    let p = 0.1;
    let expected = -0.75 * (1.0 - 4.0 * p / 3.0_f64).ln();
    assert!((dm.get(0, 1) - expected).abs() < 1e-10);
}

#[test]
fn jc69_saturated() {
    // p = 1.0 >= 3/4 -> should fail
    let seqs: Vec<&[u8]> = vec![b"AAAAA", b"TTTTT"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::JukesCantor,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

// ─── Kimura 2-parameter ─────────────────────────────────────

#[test]
fn k2p_known() {
    // 1 transition (A->G), 0 transversions out of 4 valid
    let seqs: Vec<&[u8]> = vec![b"ACGT", b"GCGT"];
    let dm = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::Kimura2P,
        GapDeletion::Pairwise,
    )
    .unwrap();
    let p: f64 = 0.25;
    let q: f64 = 0.0;
    let expected = -0.5 * (1.0 - 2.0 * p - q).ln() - 0.25 * (1.0 - 2.0 * q).ln();
    assert!((dm.get(0, 1) - expected).abs() < 1e-10);
}

#[test]
fn k2p_skips_ambiguity() {
    // N is not ACGT, so that column is skipped
    let seqs: Vec<&[u8]> = vec![b"ACGTN", b"GCGTN"];
    let dm = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::Kimura2P,
        GapDeletion::Pairwise,
    )
    .unwrap();
    let seqs2: Vec<&[u8]> = vec![b"ACGT", b"GCGT"];
    let dm2 = dna_distance_matrix(
        &seqs2,
        labels(&["a", "b"]),
        DnaDistanceModel::Kimura2P,
        GapDeletion::Pairwise,
    )
    .unwrap();
    assert!((dm.get(0, 1) - dm2.get(0, 1)).abs() < 1e-10);
}

// ─── protein distances ──────────────────────────────────────

#[test]
fn protein_pdist() {
    let seqs: Vec<&[u8]> = vec![b"ACDE", b"ACDF"];
    let dm = protein_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        ProteinDistanceModel::PDistance,
        GapDeletion::Pairwise,
    )
    .unwrap();
    assert!((dm.get(0, 1) - 0.25).abs() < 1e-10);
}

#[test]
fn poisson_known() {
    // p = 0.25 -> -ln(0.75)
    let seqs: Vec<&[u8]> = vec![b"ACDE", b"ACDF"];
    let dm = protein_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        ProteinDistanceModel::Poisson,
        GapDeletion::Pairwise,
    )
    .unwrap();
    let expected = -(0.75_f64).ln();
    assert!((dm.get(0, 1) - expected).abs() < 1e-10);
}

#[test]
fn poisson_saturated() {
    let seqs: Vec<&[u8]> = vec![b"ACDE", b"FGHI"];
    let result = protein_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        ProteinDistanceModel::Poisson,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

// ─── degenerate inputs ──────────────────────────────────────

#[test]
fn no_valid_sites() {
    let seqs: Vec<&[u8]> = vec![b"----", b"ACGT"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

#[test]
fn complete_deletion_with_all_gap_columns() {
    let seqs: Vec<&[u8]> = vec![b"-C-T", b"A-GT"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Complete,
    );
    // Only column 3 survives the mask; it matches.
    let dm = result.unwrap();
    assert!((dm.get(0, 1) - 0.0).abs() < 1e-10);
}

#[test]
fn too_few_seqs() {
    let seqs: Vec<&[u8]> = vec![b"ACGT"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

#[test]
fn label_count_mismatch() {
    let seqs: Vec<&[u8]> = vec![b"ACGT", b"ACGT"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

#[test]
fn unequal_sequence_lengths() {
    let seqs: Vec<&[u8]> = vec![b"ACGT", b"ACG"];
    let result = dna_distance_matrix(
        &seqs,
        labels(&["a", "b"]),
        DnaDistanceModel::PDistance,
        GapDeletion::Pairwise,
    );
    assert!(result.is_err());
}

// ─── model names ────────────────────────────────────────────

#[test]
fn dna_model_names() {
    assert_eq!(
        "jc69".parse::<DnaDistanceModel>().unwrap(),
        DnaDistanceModel::JukesCantor
    );
    assert_eq!(
        "K80".parse::<DnaDistanceModel>().unwrap(),
        DnaDistanceModel::Kimura2P
    );
    assert_eq!(
        "raw".parse::<DnaDistanceModel>().unwrap(),
        DnaDistanceModel::PDistance
    );
    assert!("hky85".parse::<DnaDistanceModel>().is_err());
}

#[test]
fn protein_model_names() {
    assert_eq!(
        "poisson".parse::<ProteinDistanceModel>().unwrap(),
        ProteinDistanceModel::Poisson
    );
    assert!("wag".parse::<ProteinDistanceModel>().is_err());
}

// ─── NJ tree ────────────────────────────────────────────────

fn simple_4taxa_dm() -> DistanceMatrix {
    // Additive distance matrix for tree: ((A:1,B:1):1,(C:1,D:1):1)
    let labels = labels(&["A", "B", "C", "D"]);
    let data = vec![
        0.0, 2.0, 4.0, 4.0, //
        2.0, 0.0, 4.0, 4.0, //
        4.0, 4.0, 0.0, 2.0, //
        4.0, 4.0, 2.0, 0.0, //
    ];
    DistanceMatrix::new(labels, data)
}

#[test]
fn nj_basic_topology() {
    let tree = neighbor_joining(&simple_4taxa_dm()).unwrap();
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.root().is_none()); // NJ is unrooted
    let ll = tree.leaf_labels();
    for name in ["A", "B", "C", "D"] {
        assert!(ll.contains(&name.to_string()));
    }
}

#[test]
fn nj_recovers_additive_branch_lengths() {
    let tree = neighbor_joining(&simple_4taxa_dm()).unwrap();
    for leaf in tree.leaves() {
        let bl = tree.node(leaf).branch_length.unwrap();
        assert!(
            (bl - 1.0).abs() < 1e-10,
            "leaf {} has branch_length {}",
            tree.node(leaf).label.as_deref().unwrap_or("?"),
            bl
        );
    }
}

#[test]
fn nj_two_taxa() {
    let dm = DistanceMatrix::new(labels(&["X", "Y"]), vec![0.0, 3.0, 3.0, 0.0]);
    let tree = neighbor_joining(&dm).unwrap();
    assert_eq!(tree.num_leaves(), 2);
    for leaf in tree.leaves() {
        let bl = tree.node(leaf).branch_length.unwrap();
        assert!((bl - 1.5).abs() < 1e-10);
    }
}

#[test]
fn nj_node_count() {
    let tree = neighbor_joining(&simple_4taxa_dm()).unwrap();
    // 4 leaves + 2 internal from the loop + 1 final join
    assert_eq!(tree.num_leaves(), 4);
    assert_eq!(tree.num_nodes(), 7);
}

// ─── UPGMA tree ─────────────────────────────────────────────

#[test]
fn upgma_ultrametric() {
    let labels = labels(&["A", "B", "C", "D"]);
    let data = vec![
        0.0, 2.0, 4.0, 4.0, //
        2.0, 0.0, 4.0, 4.0, //
        4.0, 4.0, 0.0, 4.0, //
        4.0, 4.0, 4.0, 0.0, //
    ];
    let tree = upgma(&DistanceMatrix::new(labels, data)).unwrap();
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.root().is_some()); // UPGMA is rooted
}

#[test]
fn upgma_two_taxa() {
    let dm = DistanceMatrix::new(labels(&["X", "Y"]), vec![0.0, 6.0, 6.0, 0.0]);
    let tree = upgma(&dm).unwrap();
    assert_eq!(tree.num_leaves(), 2);
    assert!(tree.root().is_some());
    for leaf in tree.leaves() {
        let bl = tree.node(leaf).branch_length.unwrap();
        assert!((bl - 3.0).abs() < 1e-10);
    }
}

#[test]
fn upgma_node_count() {
    let labels = labels(&["A", "B", "C"]);
    let data = vec![
        0.0, 2.0, 4.0, //
        2.0, 0.0, 4.0, //
        4.0, 4.0, 0.0, //
    ];
    let tree = upgma(&DistanceMatrix::new(labels, data)).unwrap();
    assert_eq!(tree.num_nodes(), 5);
    assert_eq!(tree.num_leaves(), 3);
}

// ─── Newick ─────────────────────────────────────────────────

#[test]
fn newick_format() {
    let tree = neighbor_joining(&simple_4taxa_dm()).unwrap();
    let nwk = to_newick(&tree);
    assert!(nwk.starts_with('('));
    assert!(nwk.ends_with(';'));
    for name in ["A", "B", "C", "D"] {
        assert!(nwk.contains(name));
    }
}

#[test]
fn newick_quotes_labels() {
    let labels = labels(&["A B", "C:D", "E'F", "G"]);
    let data = vec![
        0.0, 1.0, 2.0, 3.0, //
        1.0, 0.0, 2.0, 3.0, //
        2.0, 2.0, 0.0, 3.0, //
        3.0, 3.0, 3.0, 0.0, //
    ];
    let tree = neighbor_joining(&DistanceMatrix::new(labels, data)).unwrap();
    let nwk = to_newick(&tree);
    assert!(nwk.contains("'A B'"));
    assert!(nwk.contains("'C:D'"));
    assert!(nwk.contains("'E''F'"));
}

// ─── alignment to tree ──────────────────────────────────────

#[test]
fn nj_tree_from_alignment() {
    let text = ">s1\nAAAAAAAA\n>s2\nAAAAAAAT\n>s3\nTTTTAAAA\n>s4\nTTTTAAAT\n";
    let msa = Msa::from_fasta(text).unwrap();
    let tree = nj_tree_dna(&msa, DnaDistanceModel::PDistance, GapDeletion::Pairwise).unwrap();
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.root().is_none());
    let nwk = to_newick(&tree);
    for name in ["s1", "s2", "s3", "s4"] {
        assert!(nwk.contains(name));
    }
}

#[test]
fn nj_tree_from_gapped_alignment_complete_deletion() {
    let text = ">s1\nAC-TACGT\n>s2\nACGTACGT\n>s3\nACGTTTTT\n";
    let msa = Msa::from_fasta(text).unwrap();
    let tree = nj_tree_dna(&msa, DnaDistanceModel::PDistance, GapDeletion::Complete).unwrap();
    assert_eq!(tree.num_leaves(), 3);
}

// ─── DistanceMatrix accessors ───────────────────────────────

#[test]
fn dm_accessors() {
    let dm = DistanceMatrix::new(labels(&["a", "b"]), vec![0.0, 1.5, 1.5, 0.0]);
    assert_eq!(dm.n(), 2);
    assert_eq!(dm.labels().len(), 2);
    assert_eq!(dm.data().len(), 4);
    assert!((dm.get(0, 1) - 1.5).abs() < 1e-10);
}

#[test]
fn dm_set_symmetric() {
    let mut dm = DistanceMatrix::new(labels(&["a", "b", "c"]), vec![0.0; 9]);
    dm.set(0, 2, 5.0);
    assert!((dm.get(0, 2) - 5.0).abs() < 1e-10);
    assert!((dm.get(2, 0) - 5.0).abs() < 1e-10);
}
