use std::env;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Db, DocSummary, RecordSource};
use crate::error::{SeqError, SeqResult};
use crate::fetch::SeqRange;

pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Blocking client for the NCBI E-utilities endpoints (esearch, esummary,
/// efetch). Identity parameters (`tool`, `email`, `api_key`) are attached to
/// every request when set; NCBI grants higher rate limits with an api key.
pub struct EutilsClient {
    http: Client,
    base_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl EutilsClient {
    pub fn new() -> SeqResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("seqtools/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: EUTILS_BASE_URL.to_string(),
            tool: "seqtools".to_string(),
            email: None,
            api_key: None,
        })
    }

    /// Like [`new`](Self::new), but picks up `NCBI_API_KEY` and `NCBI_EMAIL`
    /// from the environment when present.
    pub fn from_env() -> SeqResult<Self> {
        let mut client = Self::new()?;
        client.api_key = env::var("NCBI_API_KEY").ok();
        client.email = env::var("NCBI_EMAIL").ok();
        Ok(client)
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the client at a different host, e.g. a local stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn identity(&self, mut req: RequestBuilder) -> RequestBuilder {
        req = req.query(&[("tool", self.tool.as_str())]);
        if let Some(email) = &self.email {
            req = req.query(&[("email", email.as_str())]);
        }
        if let Some(key) = &self.api_key {
            req = req.query(&[("api_key", key.as_str())]);
        }
        req
    }

    fn get_text(&self, endpoint: &str, params: &[(&str, &str)]) -> SeqResult<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "e-utilities request");
        let req = self.identity(self.http.get(&url).query(params));
        let resp = req.send()?.error_for_status()?;
        Ok(resp.text()?)
    }
}

#[derive(Deserialize)]
struct EsearchEnvelope {
    esearchresult: EsearchResult,
}

#[derive(Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

fn parse_search(text: &str) -> SeqResult<Vec<String>> {
    let envelope: EsearchEnvelope =
        serde_json::from_str(text).map_err(|e| SeqError::EutilsResponse {
            msg: format!("esearch: {e}"),
        })?;
    Ok(envelope.esearchresult.idlist)
}

fn parse_summary(text: &str, uid: &str) -> SeqResult<DocSummary> {
    let value: Value = serde_json::from_str(text).map_err(|e| SeqError::EutilsResponse {
        msg: format!("esummary: {e}"),
    })?;
    let doc = &value["result"][uid];
    if doc.is_null() {
        return Err(SeqError::EutilsResponse {
            msg: format!("esummary: no document for uid '{uid}'"),
        });
    }
    Ok(DocSummary {
        accession_version: str_field(doc, "accessionversion")?,
        title: str_field(doc, "title")?,
        organism: str_field(doc, "organism")?,
    })
}

fn str_field(doc: &Value, name: &str) -> SeqResult<Box<str>> {
    doc.get(name)
        .and_then(Value::as_str)
        .map(Into::into)
        .ok_or_else(|| SeqError::EutilsResponse {
            msg: format!("esummary: missing field '{name}'"),
        })
}

impl RecordSource for EutilsClient {
    fn search(&self, db: Db, term: &str) -> SeqResult<Vec<String>> {
        let text = self.get_text(
            "esearch.fcgi",
            &[("db", db.as_str()), ("term", term), ("retmode", "json")],
        )?;
        parse_search(&text)
    }

    fn summary(&self, db: Db, id: &str) -> SeqResult<DocSummary> {
        let text = self.get_text(
            "esummary.fcgi",
            &[("db", db.as_str()), ("id", id), ("retmode", "json")],
        )?;
        parse_summary(&text, id)
    }

    fn fetch_fasta(&self, db: Db, id: &str, range: Option<SeqRange>) -> SeqResult<String> {
        let start;
        let stop;
        let mut params: Vec<(&str, &str)> = vec![
            ("db", db.as_str()),
            ("id", id),
            ("rettype", "fasta"),
            ("retmode", "text"),
        ];
        if let Some(r) = range {
            debug!(id, start = r.start, stop = r.end, "requesting sub-range");
            start = r.start.to_string();
            stop = r.end.to_string();
            params.push(("seq_start", &start));
            params.push(("seq_stop", &stop));
        }
        self.get_text("efetch.fcgi", &params)
    }
}
