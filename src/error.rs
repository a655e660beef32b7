use std::fmt;
use std::io;
use thiserror::Error;

/// One rejected (start, end) pair, with its accession key when it came from a
/// per-accession map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOffender {
    pub key: Option<Box<str>>,
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for RangeOffender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}=({}, {})", key, self.start, self.end),
            None => write!(f, "({}, {})", self.start, self.end),
        }
    }
}

fn list_offenders(offenders: &[RangeOffender]) -> String {
    offenders
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum SeqError {
    #[error("invalid range specification: {msg}")]
    InvalidRangeSpec { msg: String },

    #[error("invalid range(s), need 0 < start < end: {}", list_offenders(.offenders))]
    InvalidRange { offenders: Vec<RangeOffender> },

    #[error("unknown database '{name}' (valid: 'nucleotide', 'protein')")]
    UnknownDatabase { name: String },

    #[error("no database ids found for accession '{accession}'")]
    LookupMiss { accession: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected e-utilities response: {msg}")]
    EutilsResponse { msg: String },

    #[error("pairwise mode needs exactly 2 sequence indices, got {got}")]
    PairwiseIndexCount { got: usize },

    #[error("sequence index {index} out of range (n={n})")]
    IndexOutOfRange { index: usize, n: usize },

    #[error("sequence {index} is empty")]
    EmptySequence { index: usize },

    #[error("unknown MSA method '{name}' (valid: 'clustalo', 'muscle', 'mafft')")]
    UnknownMsaMethod { name: String },

    #[error("{tool} failed: {msg}")]
    MsaTool { tool: &'static str, msg: String },

    #[error("fasta format error: {msg}")]
    FastaFormat { msg: &'static str },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("aligned sequence {index} has length {len} but expected {expected}")]
    AlignmentWidth {
        index: usize,
        len: usize,
        expected: usize,
    },

    #[error("label count {labels} does not match sequence count {seqs}")]
    LabelCountMismatch { labels: usize, seqs: usize },

    #[error("need at least 2 sequences, got {n}")]
    TooFewSequences { n: usize },

    #[error("unknown distance model '{name}'")]
    UnknownModel { name: String },

    #[error("no valid sites between sequences {i} and {j}")]
    NoValidSites { i: usize, j: usize },

    #[error("distance saturated between sequences {i} and {j} under {model} model")]
    SaturatedDistance { i: usize, j: usize, model: Box<str> },
}

pub type SeqResult<T> = Result<T, SeqError>;
