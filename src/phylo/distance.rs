use crate::error::{SeqError, SeqResult};

/// Evolutionary distance model for nucleotide alignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DnaDistanceModel {
    PDistance,
    JukesCantor,
    Kimura2P,
}

impl std::str::FromStr for DnaDistanceModel {
    type Err = SeqError;

    fn from_str(s: &str) -> SeqResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p-distance" | "raw" => Ok(DnaDistanceModel::PDistance),
            "jc69" => Ok(DnaDistanceModel::JukesCantor),
            "k2p" | "k80" => Ok(DnaDistanceModel::Kimura2P),
            other => Err(SeqError::UnknownModel {
                name: other.to_string(),
            }),
        }
    }
}

/// Evolutionary distance model for protein alignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProteinDistanceModel {
    PDistance,
    Poisson,
}

impl std::str::FromStr for ProteinDistanceModel {
    type Err = SeqError;

    fn from_str(s: &str) -> SeqResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p-distance" | "raw" => Ok(ProteinDistanceModel::PDistance),
            "poisson" => Ok(ProteinDistanceModel::Poisson),
            other => Err(SeqError::UnknownModel {
                name: other.to_string(),
            }),
        }
    }
}

/// How gap sites are excluded: `Pairwise` drops a site only for pairs where
/// one of the two sequences has a gap there; `Complete` drops every column
/// that has a gap in any sequence, for all pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapDeletion {
    Pairwise,
    Complete,
}

#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    labels: Vec<Box<str>>,
    data: Vec<f64>,
    n: usize,
}

impl DistanceMatrix {
    pub fn new(labels: Vec<Box<str>>, data: Vec<f64>) -> Self {
        let n = labels.len();
        assert_eq!(
            data.len(),
            n * n,
            "distance matrix data length mismatch: expected {}, got {}",
            n * n,
            data.len()
        );
        Self { labels, data, n }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn labels(&self) -> &[Box<str>] {
        &self.labels
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, val: f64) {
        self.data[i * self.n + j] = val;
        self.data[j * self.n + i] = val;
    }
}

#[inline]
fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}

/// Columns to exclude entirely under complete deletion.
fn gap_column_mask(seqs: &[&[u8]], width: usize) -> Vec<bool> {
    (0..width)
        .map(|col| seqs.iter().any(|s| is_gap(s[col])))
        .collect()
}

fn count_dna_differences(a: &[u8], b: &[u8], mask: Option<&[bool]>) -> (usize, usize, usize) {
    let mut transitions = 0usize;
    let mut transversions = 0usize;
    let mut valid = 0usize;

    for (pos, (&x, &y)) in a.iter().zip(b.iter()).enumerate() {
        if let Some(mask) = mask {
            if mask[pos] {
                continue;
            }
        }
        if is_gap(x) || is_gap(y) {
            continue;
        }
        let xu = x.to_ascii_uppercase();
        let yu = y.to_ascii_uppercase();
        if !matches!(xu, b'A' | b'C' | b'G' | b'T') || !matches!(yu, b'A' | b'C' | b'G' | b'T') {
            continue;
        }
        valid += 1;
        if xu == yu {
            continue;
        }
        // Transitions: A<->G, C<->T
        let is_ts = matches!(
            (xu, yu),
            (b'A', b'G') | (b'G', b'A') | (b'C', b'T') | (b'T', b'C')
        );
        if is_ts {
            transitions += 1;
        } else {
            transversions += 1;
        }
    }

    (transitions, transversions, valid)
}

fn count_protein_differences(a: &[u8], b: &[u8], mask: Option<&[bool]>) -> (usize, usize) {
    let mut mismatches = 0usize;
    let mut valid = 0usize;

    for (pos, (&x, &y)) in a.iter().zip(b.iter()).enumerate() {
        if let Some(mask) = mask {
            if mask[pos] {
                continue;
            }
        }
        if is_gap(x) || is_gap(y) {
            continue;
        }
        valid += 1;
        if !x.eq_ignore_ascii_case(&y) {
            mismatches += 1;
        }
    }

    (mismatches, valid)
}

fn dna_pair_distance(
    a: &[u8],
    b: &[u8],
    model: DnaDistanceModel,
    mask: Option<&[bool]>,
    i: usize,
    j: usize,
) -> SeqResult<f64> {
    let (ts, tv, valid) = count_dna_differences(a, b, mask);
    if valid == 0 {
        return Err(SeqError::NoValidSites { i, j });
    }

    match model {
        DnaDistanceModel::PDistance => Ok((ts + tv) as f64 / valid as f64),
        DnaDistanceModel::JukesCantor => {
            let p = (ts + tv) as f64 / valid as f64;
            let arg = 1.0 - 4.0 * p / 3.0;
            if arg <= 0.0 {
                return Err(SeqError::SaturatedDistance {
                    i,
                    j,
                    model: "JukesCantor".into(),
                });
            }
            Ok(-0.75 * arg.ln())
        }
        DnaDistanceModel::Kimura2P => {
            let p = ts as f64 / valid as f64;
            let q = tv as f64 / valid as f64;
            let a1 = 1.0 - 2.0 * p - q;
            let a2 = 1.0 - 2.0 * q;
            if a1 <= 0.0 || a2 <= 0.0 {
                return Err(SeqError::SaturatedDistance {
                    i,
                    j,
                    model: "Kimura2P".into(),
                });
            }
            Ok(-0.5 * a1.ln() - 0.25 * a2.ln())
        }
    }
}

fn protein_pair_distance(
    a: &[u8],
    b: &[u8],
    model: ProteinDistanceModel,
    mask: Option<&[bool]>,
    i: usize,
    j: usize,
) -> SeqResult<f64> {
    let (mismatches, valid) = count_protein_differences(a, b, mask);
    if valid == 0 {
        return Err(SeqError::NoValidSites { i, j });
    }

    let p = mismatches as f64 / valid as f64;

    match model {
        ProteinDistanceModel::PDistance => Ok(p),
        ProteinDistanceModel::Poisson => {
            let arg = 1.0 - p;
            if arg <= 0.0 {
                return Err(SeqError::SaturatedDistance {
                    i,
                    j,
                    model: "Poisson".into(),
                });
            }
            Ok(-arg.ln())
        }
    }
}

fn validate_distance_inputs(seqs: &[&[u8]], labels: &[Box<str>]) -> SeqResult<()> {
    let n = seqs.len();
    if n < 2 {
        return Err(SeqError::TooFewSequences { n });
    }
    if labels.len() != n {
        return Err(SeqError::LabelCountMismatch {
            labels: labels.len(),
            seqs: n,
        });
    }
    let expected = seqs[0].len();
    for (index, seq) in seqs.iter().enumerate() {
        if seq.len() != expected {
            return Err(SeqError::AlignmentWidth {
                index,
                len: seq.len(),
                expected,
            });
        }
    }
    Ok(())
}

pub fn dna_distance_matrix(
    seqs: &[&[u8]],
    labels: Vec<Box<str>>,
    model: DnaDistanceModel,
    deletion: GapDeletion,
) -> SeqResult<DistanceMatrix> {
    validate_distance_inputs(seqs, &labels)?;
    let n = seqs.len();
    let mask = match deletion {
        GapDeletion::Pairwise => None,
        GapDeletion::Complete => Some(gap_column_mask(seqs, seqs[0].len())),
    };

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let results: SeqResult<Vec<(usize, usize, f64)>> = par_try_map!(&pairs, |&(i, j)| {
        dna_pair_distance(seqs[i], seqs[j], model, mask.as_deref(), i, j).map(|d| (i, j, d))
    });

    let mut data = vec![0.0f64; n * n];
    for (i, j, d) in results? {
        data[i * n + j] = d;
        data[j * n + i] = d;
    }

    Ok(DistanceMatrix::new(labels, data))
}

pub fn protein_distance_matrix(
    seqs: &[&[u8]],
    labels: Vec<Box<str>>,
    model: ProteinDistanceModel,
    deletion: GapDeletion,
) -> SeqResult<DistanceMatrix> {
    validate_distance_inputs(seqs, &labels)?;
    let n = seqs.len();
    let mask = match deletion {
        GapDeletion::Pairwise => None,
        GapDeletion::Complete => Some(gap_column_mask(seqs, seqs[0].len())),
    };

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let results: SeqResult<Vec<(usize, usize, f64)>> = par_try_map!(&pairs, |&(i, j)| {
        protein_pair_distance(seqs[i], seqs[j], model, mask.as_deref(), i, j).map(|d| (i, j, d))
    });

    let mut data = vec![0.0f64; n * n];
    for (i, j, d) in results? {
        data[i * n + j] = d;
        data[j * n + i] = d;
    }

    Ok(DistanceMatrix::new(labels, data))
}
