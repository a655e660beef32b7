pub mod msa;

pub use msa::{multi_align, Msa, MsaMethod};

use bio::alignment::pairwise::Aligner;
use bio::alignment::{Alignment, AlignmentOperation};

use crate::error::{SeqError, SeqResult};
use crate::fetch::Record;


/// One alignable sequence with an optional accession label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignInput {
    pub label: Option<Box<str>>,
    pub seq: Box<str>,
}

impl AlignInput {
    pub fn new(seq: impl Into<Box<str>>) -> Self {
        Self {
            label: None,
            seq: seq.into(),
        }
    }

    pub fn labeled(label: impl Into<Box<str>>, seq: impl Into<Box<str>>) -> Self {
        Self {
            label: Some(label.into()),
            seq: seq.into(),
        }
    }
}

impl From<&Record> for AlignInput {
    fn from(record: &Record) -> Self {
        Self {
            label: Some(record.accession_version.clone()),
            seq: record.sequence.clone(),
        }
    }
}

/// Alignment topology, mapped onto the pairwise aligner: `Global` aligns both
/// sequences end to end, `Local` finds the best-scoring sub-alignment,
/// `Overlap` aligns all of the first sequence within the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Global,
    Local,
    Overlap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PairwiseAlignment {
    pub aligned_a: Box<str>,
    pub aligned_b: Box<str>,
    pub score: i32,
    pub percent_identity: f64,
}

/// How to align, and what comes back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignMode {
    Pairwise { indices: Vec<usize>, topology: Topology },
    Multi { method: MsaMethod },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AlignOutcome {
    Pairwise(PairwiseAlignment),
    Multi(Msa),
}

/// Route to the pairwise aligner or the external MSA tool by mode.
pub fn align(inputs: &[AlignInput], mode: &AlignMode) -> SeqResult<AlignOutcome> {
    match mode {
        AlignMode::Pairwise { indices, topology } => {
            pairwise_align(inputs, indices, *topology).map(AlignOutcome::Pairwise)
        }
        AlignMode::Multi { method } => multi_align(inputs, *method).map(AlignOutcome::Multi),
    }
}

/// Align two of the input sequences, selected by index. Input validation runs
/// before the aligner is constructed.
pub fn pairwise_align(
    inputs: &[AlignInput],
    indices: &[usize],
    topology: Topology,
) -> SeqResult<PairwiseAlignment> {
    if indices.len() != 2 {
        return Err(SeqError::PairwiseIndexCount { got: indices.len() });
    }
    let a = checked_seq(inputs, indices[0])?;
    let b = checked_seq(inputs, indices[1])?;
    let x = a.as_bytes();
    let y = b.as_bytes();

    let score = |p: u8, q: u8| if p.eq_ignore_ascii_case(&q) { 1i32 } else { -1i32 };
    let mut aligner = Aligner::with_capacity(x.len(), y.len(), -5, -1, score);
    let alignment = match topology {
        Topology::Global => aligner.global(x, y),
        Topology::Local => aligner.local(x, y),
        Topology::Overlap => aligner.semiglobal(x, y),
    };

    let (aligned_a, aligned_b) = gapped_strings(x, y, &alignment);
    let percent_identity = percent_identity(&aligned_a, &aligned_b);
    Ok(PairwiseAlignment {
        aligned_a: aligned_a.into(),
        aligned_b: aligned_b.into(),
        score: alignment.score,
        percent_identity,
    })
}

fn checked_seq(inputs: &[AlignInput], index: usize) -> SeqResult<&str> {
    let input = inputs.get(index).ok_or(SeqError::IndexOutOfRange {
        index,
        n: inputs.len(),
    })?;
    if input.seq.is_empty() {
        return Err(SeqError::EmptySequence { index });
    }
    Ok(&input.seq)
}

/// Identical residue pairs over aligned columns (gap columns included in
/// the denominator), as a percentage. Case-insensitive.
pub fn percent_identity(aligned_a: &str, aligned_b: &str) -> f64 {
    let columns = aligned_a.len().min(aligned_b.len());
    if columns == 0 {
        return 0.0;
    }
    let matches = aligned_a
        .bytes()
        .zip(aligned_b.bytes())
        .filter(|(a, b)| *a != b'-' && *b != b'-' && a.eq_ignore_ascii_case(b))
        .count();
    matches as f64 / columns as f64 * 100.0
}

fn gapped_strings(x: &[u8], y: &[u8], alignment: &Alignment) -> (String, String) {
    let mut xi = alignment.xstart;
    let mut yi = alignment.ystart;
    let mut out_x = String::new();
    let mut out_y = String::new();
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                out_x.push(x[xi] as char);
                out_y.push(y[yi] as char);
                xi += 1;
                yi += 1;
            }
            AlignmentOperation::Del => {
                out_x.push('-');
                out_y.push(y[yi] as char);
                yi += 1;
            }
            AlignmentOperation::Ins => {
                out_x.push(x[xi] as char);
                out_y.push('-');
                xi += 1;
            }
            AlignmentOperation::Xclip(n) => xi += n,
            AlignmentOperation::Yclip(n) => yi += n,
        }
    }
    (out_x, out_y)
}
