pub mod eutils;

pub use eutils::EutilsClient;

use std::str::FromStr;

use crate::error::{SeqError, SeqResult};
use crate::fetch::SeqRange;

/// Target sequence database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Db {
    Nucleotide,
    Protein,
}

impl Db {
    /// E-utilities database name.
    pub fn as_str(self) -> &'static str {
        match self {
            Db::Nucleotide => "nuccore",
            Db::Protein => "protein",
        }
    }
}

impl FromStr for Db {
    type Err = SeqError;

    fn from_str(s: &str) -> SeqResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nucleotide" | "nuccore" => Ok(Db::Nucleotide),
            "protein" => Ok(Db::Protein),
            other => Err(SeqError::UnknownDatabase {
                name: other.to_string(),
            }),
        }
    }
}

/// Summary metadata for one database record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocSummary {
    pub accession_version: Box<str>,
    pub title: Box<str>,
    pub organism: Box<str>,
}

/// Record-retrieval seam. The batch fetcher only talks to the database
/// through this trait, so tests can substitute a scripted source.
pub trait RecordSource {
    /// Look up a query term, returning the matching internal record ids.
    fn search(&self, db: Db, term: &str) -> SeqResult<Vec<String>>;

    /// Summary metadata for one internal record id.
    fn summary(&self, db: Db, id: &str) -> SeqResult<DocSummary>;

    /// Plain-text FASTA for one internal record id, restricted to `range`
    /// (1-based inclusive) when given.
    fn fetch_fasta(&self, db: Db, id: &str, range: Option<SeqRange>) -> SeqResult<String>;
}
