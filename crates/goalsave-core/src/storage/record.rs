//! Versioned JSON records on top of a [`KeyValueStore`].
//!
//! Every record is written as `{"version": N, "data": ...}`. Reads are total:
//! a missing key, a storage failure, an unknown version or a payload that does
//! not parse all come back as `None` and the caller falls back to defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::KeyValueStore;

/// Version tag written with every record.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: u32,
    data: serde_json::Value,
}

/// Load a record, discarding anything malformed.
pub fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted record");
            return None;
        }
    };

    let envelope: RawEnvelope = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unparseable persisted record");
            return None;
        }
    };

    if envelope.version != SCHEMA_VERSION {
        tracing::warn!(
            key,
            version = envelope.version,
            expected = SCHEMA_VERSION,
            "discarding persisted record with unknown version"
        );
        return None;
    }

    match serde_json::from_value(envelope.data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding malformed persisted record");
            None
        }
    }
}

/// Write a record. Failures are logged and reported as `false`, never raised.
pub fn save_record<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(&Envelope {
        version: SCHEMA_VERSION,
        data: value,
    }) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize record");
            return false;
        }
    };

    match store.set(key, &json) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to persist record");
            false
        }
    }
}
