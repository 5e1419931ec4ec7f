//! Programme records from the EPG metadata services

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ApiError, Result};

/// One scheduled programme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Programme {
    pub start: DateTime<Utc>,
    pub title: String,
    pub description: String,
    /// Whole minutes, rounded down from the duration in seconds
    pub duration_minutes: u32,
}

/// The programme on air and the one after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowNext {
    pub now: Programme,
    pub next: Programme,
}

/// Programme record as the metadata services send it
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProgramme {
    /// Start, epoch seconds
    s: i64,
    #[serde(default)]
    t: String,
    #[serde(default)]
    d: String,
    /// `m[1]` is the duration in seconds
    #[serde(default)]
    m: Vec<Value>,
}

impl TryFrom<RawProgramme> for Programme {
    type Error = ApiError;

    fn try_from(raw: RawProgramme) -> Result<Self> {
        let start = Utc
            .timestamp_opt(raw.s, 0)
            .single()
            .ok_or_else(|| ApiError::ParseError(format!("Invalid start time {}", raw.s)))?;

        let duration_secs = raw
            .m
            .get(1)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                ApiError::ParseError(format!("Programme '{}' has no duration", raw.t))
            })?;
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(ApiError::ParseError(format!(
                "Programme '{}' has invalid duration {}",
                raw.t, duration_secs
            )));
        }

        Ok(Programme {
            start,
            title: raw.t,
            description: raw.d,
            duration_minutes: (duration_secs / 60.0) as u32,
        })
    }
}

/// Body shared by both services: `{"listings": {"<channel id>": [record, ...]}}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingsPayload {
    #[serde(default)]
    listings: HashMap<String, Vec<RawProgramme>>,
}

impl ListingsPayload {
    /// Programmes for `channel_id`, in the order sent. A channel the payload
    /// does not mention has no programmes.
    pub(crate) fn into_programmes(mut self, channel_id: u32) -> Result<Vec<Programme>> {
        self.listings
            .remove(&channel_id.to_string())
            .unwrap_or_default()
            .into_iter()
            .map(Programme::try_from)
            .collect()
    }
}
