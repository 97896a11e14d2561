//! Helpers shared by the collectors.

use chrono::{DateTime, NaiveDateTime, ParseError};

/// Convert an ISO-8601 timestamp to Unix seconds.
///
/// Timestamps without an offset are read as UTC. `None` passes through.
pub fn str_to_timestamp(value: Option<&str>) -> Result<Option<i64>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Ok(Some(ts.timestamp())),
        Err(err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|ts| Some(ts.and_utc().timestamp()))
            .map_err(|_| err),
    }
}
