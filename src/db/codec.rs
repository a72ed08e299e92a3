//! Versioned JSON encoding for stored values.
//!
//! Values are written as `{"version": N, "data": ...}`. A bare value without
//! the envelope is what the first release wrote and is read as-is.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored schema version {found} is not supported")]
    UnsupportedVersion { found: u64 },
}

/// What was found under a key.
#[derive(Debug, PartialEq)]
pub enum Decoded<T> {
    Absent,
    Corrupt,
    Outdated(u64),
    Loaded(T),
}

impl<T> Decoded<T> {
    /// The loaded value, logging why there is none when the key held
    /// something unusable.
    pub fn into_loaded(self, key: &str) -> Option<T> {
        match self {
            Decoded::Loaded(value) => Some(value),
            Decoded::Absent => None,
            Decoded::Corrupt => {
                log::error!("[decode] Discarding malformed value under {key}");
                None
            }
            Decoded::Outdated(version) => {
                log::warn!("[decode] Discarding value under {key} with schema version {version}");
                None
            }
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u64,
    data: Value,
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&EnvelopeRef { version: SCHEMA_VERSION, data: value })?)
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, CodecError> {
    let value: Value = serde_json::from_str(raw)?;

    let is_envelope = value
        .as_object()
        .is_some_and(|obj| obj.len() == 2 && obj.contains_key("version") && obj.contains_key("data"));

    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    if envelope.version != SCHEMA_VERSION as u64 {
        return Err(CodecError::UnsupportedVersion { found: envelope.version });
    }

    Ok(serde_json::from_value(envelope.data)?)
}

pub fn decode<T: DeserializeOwned>(raw: Option<&str>) -> Decoded<T> {
    let Some(raw) = raw else { return Decoded::Absent };

    match parse(raw) {
        Ok(value) => Decoded::Loaded(value),
        Err(CodecError::UnsupportedVersion { found }) => Decoded::Outdated(found),
        Err(err) => {
            log::debug!("[decode] {err}");
            Decoded::Corrupt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Subject, SubjectProgress};

    #[test]
    fn test_encode_wraps_in_envelope() {
        let encoded = encode(&vec![1, 2, 3]).unwrap();
        assert_eq!(encoded, r#"{"version":1,"data":[1,2,3]}"#);
        assert_eq!(decode::<Vec<u32>>(Some(&encoded)), Decoded::Loaded(vec![1, 2, 3]));
    }

    #[test]
    fn test_absent_corrupt_outdated() {
        assert_eq!(decode::<Vec<u32>>(None), Decoded::Absent);
        assert_eq!(decode::<Vec<u32>>(Some("{not json")), Decoded::Corrupt);
        assert_eq!(decode::<Vec<u32>>(Some(r#"{"version":1,"data":"nope"}"#)), Decoded::Corrupt);
        assert_eq!(decode::<Vec<u32>>(Some(r#"{"version":7,"data":[]}"#)), Decoded::Outdated(7));
    }

    #[test]
    fn test_reads_bare_legacy_value() {
        let legacy = r#"{
            "math":    {"level":2,"exp":3,"expToNextLevel":12,"totalCorrect":13,"totalAttempts":20},
            "reading": {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0},
            "science": {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0},
            "logic":   {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0}
        }"#;

        let Decoded::Loaded(progress) = decode::<SubjectProgress>(Some(legacy)) else {
            panic!("legacy progress should load");
        };
        assert_eq!(progress.get(Subject::Math).total_correct, 13);
    }
}
