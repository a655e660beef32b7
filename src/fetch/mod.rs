use std::collections::BTreeMap;

use tracing::warn;

use crate::entrez::{Db, RecordSource};
use crate::error::{RangeOffender, SeqError, SeqResult};


/// Inclusive 1-based sub-sequence window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqRange {
    pub start: u64,
    pub end: u64,
}

impl SeqRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Both bounds positive, start strictly below end.
    pub fn is_valid(self) -> bool {
        self.start > 0 && self.start < self.end
    }
}

/// Which sub-range to request per accession.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RangeSpec {
    /// Fetch the full sequence for every accession.
    #[default]
    Full,
    /// Apply one window to every accession.
    Uniform(SeqRange),
    /// Per-accession windows; accessions absent from the map get the full
    /// sequence. Keys naming accessions outside the batch are ignored.
    PerAccession(BTreeMap<String, SeqRange>),
}

impl RangeSpec {
    /// Reject malformed specs before any network activity. Empty map keys are
    /// a shape error; invalid windows are reported together, every offender
    /// in one error.
    pub fn validate(&self) -> SeqResult<()> {
        match self {
            RangeSpec::Full => Ok(()),
            RangeSpec::Uniform(range) => {
                if range.is_valid() {
                    Ok(())
                } else {
                    Err(SeqError::InvalidRange {
                        offenders: vec![RangeOffender {
                            key: None,
                            start: range.start,
                            end: range.end,
                        }],
                    })
                }
            }
            RangeSpec::PerAccession(map) => {
                if map.keys().any(|k| k.trim().is_empty()) {
                    return Err(SeqError::InvalidRangeSpec {
                        msg: "per-accession range keys must be non-empty".to_string(),
                    });
                }
                let offenders: Vec<RangeOffender> = map
                    .iter()
                    .filter(|(_, range)| !range.is_valid())
                    .map(|(key, range)| RangeOffender {
                        key: Some(key.as_str().into()),
                        start: range.start,
                        end: range.end,
                    })
                    .collect();
                if offenders.is_empty() {
                    Ok(())
                } else {
                    Err(SeqError::InvalidRange { offenders })
                }
            }
        }
    }

    /// Effective window for one accession.
    pub fn resolve(&self, accession: &str) -> Option<SeqRange> {
        match self {
            RangeSpec::Full => None,
            RangeSpec::Uniform(range) => Some(*range),
            RangeSpec::PerAccession(map) => map.get(accession).copied(),
        }
    }
}

/// One result row of a batch fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub accession: Box<str>,
    pub accession_version: Box<str>,
    pub title: Box<str>,
    pub organism: Box<str>,
    pub sequence: Box<str>,
}

/// An accession that contributed no row, with the error that sank it.
#[derive(Debug)]
pub struct FetchSkip {
    pub accession: Box<str>,
    pub error: SeqError,
}

#[derive(Debug, Default)]
pub struct FetchReport {
    /// Successful rows, in input accession order.
    pub records: Vec<Record>,
    /// Accessions dropped from the result, in input accession order.
    pub skipped: Vec<FetchSkip>,
}

/// Fetch one [`Record`] per accession, silently dropping accessions that fail
/// to resolve or fetch (each skip is logged at warn level). Callers that need
/// to detect partial failure should use [`fetch_report`] or compare the row
/// count against the accession count.
pub fn fetch_records<S>(
    source: &S,
    db: Db,
    accessions: &[&str],
    ranges: &RangeSpec,
) -> SeqResult<Vec<Record>>
where
    S: RecordSource + Sync,
{
    Ok(fetch_report(source, db, accessions, ranges)?.records)
}

/// Like [`fetch_records`], but also returns the per-accession skips. Each
/// accession is fetched independently; a failure never aborts the batch.
pub fn fetch_report<S>(
    source: &S,
    db: Db,
    accessions: &[&str],
    ranges: &RangeSpec,
) -> SeqResult<FetchReport>
where
    S: RecordSource + Sync,
{
    ranges.validate()?;

    let outcomes: Vec<SeqResult<Record>> = par_map!(accessions, |accession: &&str| {
        fetch_one(source, db, accession, ranges.resolve(accession))
    });

    let mut report = FetchReport::default();
    for (accession, outcome) in accessions.iter().zip(outcomes) {
        match outcome {
            Ok(record) => report.records.push(record),
            Err(error) => {
                warn!(accession = *accession, %error, "skipping accession");
                report.skipped.push(FetchSkip {
                    accession: (*accession).into(),
                    error,
                });
            }
        }
    }
    Ok(report)
}

fn fetch_one<S: RecordSource>(
    source: &S,
    db: Db,
    accession: &str,
    range: Option<SeqRange>,
) -> SeqResult<Record> {
    let ids = source.search(db, accession)?;
    let id = ids.first().ok_or_else(|| SeqError::LookupMiss {
        accession: accession.to_string(),
    })?;
    let summary = source.summary(db, id)?;
    let body = source.fetch_fasta(db, id, range)?;
    let sequence = sequence_from_fasta(&body)?;
    Ok(Record {
        accession: accession.into(),
        accession_version: summary.accession_version,
        title: summary.title,
        organism: summary.organism,
        sequence: sequence.into(),
    })
}

/// Drop the header line, concatenate the rest with whitespace stripped.
fn sequence_from_fasta(body: &str) -> SeqResult<String> {
    let mut lines = body.lines();
    if lines.next().is_none() {
        return Err(SeqError::EutilsResponse {
            msg: "empty efetch body".to_string(),
        });
    }
    let mut sequence = String::new();
    for line in lines {
        sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
    }
    if sequence.is_empty() {
        return Err(SeqError::EutilsResponse {
            msg: "efetch body contained no sequence lines".to_string(),
        });
    }
    Ok(sequence)
}
