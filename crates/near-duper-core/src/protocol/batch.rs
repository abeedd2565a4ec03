use crate::engine::CompareEngine;
use crate::error::Error;
use crate::model::{ComparisonRequest, DocumentKind};
use crate::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::warn;

/// One `{kind, file1, file2}` record of a batch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    #[serde(alias = "type")]
    pub kind: String,
    pub file1: PathBuf,
    pub file2: PathBuf,
}

impl BatchRecord {
    pub fn to_request(&self) -> Option<ComparisonRequest> {
        match self.kind.parse::<DocumentKind>() {
            Ok(kind) => Some(ComparisonRequest::new(kind, self.file1.clone(), self.file2.clone())),
            Err(e) => {
                warn!("{} for {} vs {}", e, self.file1.display(), self.file2.display());
                None
            }
        }
    }
}

/// `score` is meaningful only when `similar` is set; otherwise it is 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub index: usize,
    pub similar: bool,
    pub score: f64,
}

impl BatchResponse {
    fn not_similar(index: usize) -> Self {
        Self {
            index,
            similar: false,
            score: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct BatchReply {
    pub responses: Vec<BatchResponse>,
    pub cancelled: bool,
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<BatchRecord>, Error> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_responses<W: Write>(responses: &[BatchResponse], writer: W) -> Result<(), Error> {
    serde_json::to_writer(writer, responses)?;
    Ok(())
}

/// Answer a batch of records in input order.
///
/// Records with an unknown kind are answered as not similar without being
/// extracted. After a cancellation only the records answered so far are
/// returned.
pub fn answer(
    engine: &CompareEngine,
    records: &[BatchRecord],
    reporter: &dyn ProgressReporter,
) -> Result<BatchReply, Error> {
    let mut requests = Vec::with_capacity(records.len());
    let mut request_for_record: Vec<Option<usize>> = Vec::with_capacity(records.len());
    for record in records {
        match record.to_request() {
            Some(request) => {
                request_for_record.push(Some(requests.len()));
                requests.push(request);
            }
            None => request_for_record.push(None),
        }
    }

    let outcome = engine.compare_batch(&requests, reporter)?;

    let mut responses = Vec::with_capacity(records.len());
    for (index, slot) in request_for_record.into_iter().enumerate() {
        match slot {
            None => responses.push(BatchResponse::not_similar(index)),
            Some(i) => match outcome.results.get(i) {
                Some(result) => responses.push(BatchResponse {
                    index,
                    similar: result.is_similar,
                    score: if result.is_similar { result.score } else { 0.0 },
                }),
                None => break,
            },
        }
    }

    Ok(BatchReply {
        responses,
        cancelled: outcome.cancelled,
    })
}
