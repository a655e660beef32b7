use std::fs;
use std::io::Write;
use std::process::Command;
use std::str::FromStr;

use tempfile::NamedTempFile;
use tracing::debug;

use super::AlignInput;
use crate::error::{SeqError, SeqResult};

/// External multiple-alignment tool to delegate to. The tool binary must be
/// on PATH.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsaMethod {
    ClustalOmega,
    Muscle,
    Mafft,
}

impl MsaMethod {
    pub fn tool(self) -> &'static str {
        match self {
            MsaMethod::ClustalOmega => "clustalo",
            MsaMethod::Muscle => "muscle",
            MsaMethod::Mafft => "mafft",
        }
    }
}

impl FromStr for MsaMethod {
    type Err = SeqError;

    fn from_str(s: &str) -> SeqResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clustalo" | "clustalomega" | "clustal-omega" => Ok(MsaMethod::ClustalOmega),
            "muscle" => Ok(MsaMethod::Muscle),
            "mafft" => Ok(MsaMethod::Mafft),
            other => Err(SeqError::UnknownMsaMethod {
                name: other.to_string(),
            }),
        }
    }
}

/// A multiple sequence alignment: labelled gapped rows of equal width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msa {
    ids: Vec<Box<str>>,
    rows: Vec<Box<[u8]>>,
    width: usize,
}

impl Msa {
    pub fn new(ids: Vec<Box<str>>, rows: Vec<Box<[u8]>>) -> SeqResult<Self> {
        if ids.len() != rows.len() {
            return Err(SeqError::LabelCountMismatch {
                labels: ids.len(),
                seqs: rows.len(),
            });
        }
        if rows.is_empty() {
            return Err(SeqError::TooFewSequences { n: 0 });
        }
        let width = rows[0].len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SeqError::AlignmentWidth {
                    index,
                    len: row.len(),
                    expected: width,
                });
            }
        }
        Ok(Self { ids, rows, width })
    }

    /// Parse aligned FASTA as produced by the MSA tools.
    pub fn from_fasta(text: &str) -> SeqResult<Self> {
        let mut ids: Vec<Box<str>> = Vec::new();
        let mut rows: Vec<Vec<u8>> = Vec::new();
        for line in text.lines() {
            if let Some(header) = line.strip_prefix('>') {
                let id = header.split_whitespace().next().unwrap_or("");
                if id.is_empty() {
                    return Err(SeqError::FastaFormat { msg: "empty header" });
                }
                ids.push(id.into());
                rows.push(Vec::new());
            } else if line.trim().is_empty() {
                continue;
            } else {
                let row = rows.last_mut().ok_or(SeqError::FastaFormat {
                    msg: "sequence data before first header",
                })?;
                row.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }
        Msa::new(ids, rows.into_iter().map(Vec::into_boxed_slice).collect())
    }

    pub fn n(&self) -> usize {
        self.ids.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ids(&self) -> &[Box<str>] {
        &self.ids
    }

    pub fn labels(&self) -> Vec<Box<str>> {
        self.ids.clone()
    }

    /// Byte-matrix view consumed by the distance routines.
    pub fn byte_rows(&self) -> Vec<&[u8]> {
        self.rows.iter().map(|r| &**r).collect()
    }
}

/// Align all inputs with the named external tool: write FASTA to a temp
/// file, run the tool, parse the aligned FASTA it emits.
pub fn multi_align(inputs: &[AlignInput], method: MsaMethod) -> SeqResult<Msa> {
    if inputs.len() < 2 {
        return Err(SeqError::TooFewSequences { n: inputs.len() });
    }
    for (index, input) in inputs.iter().enumerate() {
        if input.seq.is_empty() {
            return Err(SeqError::EmptySequence { index });
        }
    }

    let mut infile = NamedTempFile::new()?;
    for (i, input) in inputs.iter().enumerate() {
        match &input.label {
            Some(label) => writeln!(infile, ">{label}")?,
            None => writeln!(infile, ">seq{i}")?,
        }
        writeln!(infile, "{}", input.seq)?;
    }
    infile.flush()?;

    let outfile = NamedTempFile::new()?;
    let mut cmd = Command::new(method.tool());
    match method {
        MsaMethod::ClustalOmega => {
            cmd.arg("-i")
                .arg(infile.path())
                .arg("-o")
                .arg(outfile.path())
                .arg("--outfmt=fasta")
                .arg("--force");
        }
        MsaMethod::Muscle => {
            cmd.arg("-align")
                .arg(infile.path())
                .arg("-output")
                .arg(outfile.path());
        }
        // mafft writes the alignment to stdout
        MsaMethod::Mafft => {
            cmd.arg("--auto").arg(infile.path());
        }
    }

    debug!(tool = method.tool(), n = inputs.len(), "running MSA tool");
    let output = cmd.output().map_err(|e| SeqError::MsaTool {
        tool: method.tool(),
        msg: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(SeqError::MsaTool {
            tool: method.tool(),
            msg: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let aligned = match method {
        MsaMethod::Mafft => String::from_utf8_lossy(&output.stdout).into_owned(),
        _ => fs::read_to_string(outfile.path())?,
    };
    Msa::from_fasta(&aligned)
}
