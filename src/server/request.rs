//! HTTP request types for the server.

use serde::Deserialize;

use crate::error::{KvError, Result};
use crate::ops::{Direction, RawOperation, ScanBound, ScanRequest, ABS_MAX};

/// Query parameters for `GET /iterate`.
///
/// Flags keep their default unless given one specific value:
/// `include_start=no`, `include_end=yes`, `forward=no`, `include_values=no`.
#[derive(Debug, Default, Deserialize)]
pub struct IterateParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub max: Option<String>,
    pub include_start: Option<String>,
    pub include_end: Option<String>,
    pub forward: Option<String>,
    pub include_values: Option<String>,
}

fn is(flag: &Option<String>, value: &str) -> bool {
    flag.as_deref() == Some(value)
}

impl IterateParams {
    /// Page size; negative values give an empty page.
    pub fn max_count(&self) -> Result<usize> {
        match self.max.as_deref() {
            None | Some("") => Ok(ABS_MAX),
            Some(raw) => {
                let max: i64 = raw
                    .parse()
                    .map_err(|_| KvError::BadRequest(format!("invalid max: {raw:?}")))?;
                Ok(max.clamp(0, ABS_MAX as i64) as usize)
            }
        }
    }

    pub fn to_request(&self) -> Result<ScanRequest> {
        let start = self.start.clone().unwrap_or_default().into_bytes();
        let end = self
            .end
            .as_deref()
            .filter(|end| !end.is_empty())
            .map(|end| ScanBound {
                key: end.as_bytes().to_vec(),
                inclusive: is(&self.include_end, "yes"),
            });

        Ok(ScanRequest {
            start: ScanBound {
                key: start,
                inclusive: !is(&self.include_start, "no"),
            },
            end,
            direction: if is(&self.forward, "no") {
                Direction::Backward
            } else {
                Direction::Forward
            },
            max_count: self.max_count()?,
            include_values: !is(&self.include_values, "no"),
        })
    }
}

/// Body of `POST /batch`.
#[derive(Debug, Deserialize)]
pub struct BatchBody {
    #[serde(default, alias = "Ops")]
    pub ops: Vec<RawOperation>,
}

/// Body of `POST /snapshot`.
#[derive(Debug, Deserialize)]
pub struct SnapshotBody {
    #[serde(alias = "Destination")]
    pub destination: String,
}

/// Decode a JSON body regardless of its content type.
pub fn parse_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| KvError::BadRequest(format!("invalid body: {e}")))
}
