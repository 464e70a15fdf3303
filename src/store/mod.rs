//! Scan log loading.
//!
//! A scan log is either a bare JSON array of scans, or a dump of a browser
//! key-value store: a JSON object whose values are strings, one of which
//! holds the JSON-encoded scan array.
//!
//! Entries are decoded one at a time: an entry that is not a scan object is
//! counted as malformed and the rest of the log is still returned.

use crate::models::{RawScan, ScanLog};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading a scan log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read scan log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("value under key `{key}` is not an encoded scan list: {reason}")]
    InvalidEntry { key: String, reason: String },

    #[error("scan log must be a JSON array or object, found {0}")]
    UnexpectedShape(&'static str),
}

/// Load the scans stored in `path`.
///
/// `key` selects the entry of a storage dump; it is ignored for bare arrays.
pub fn load_scans(path: &Path, key: &str) -> Result<ScanLog, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let log = parse_scans(&content, key)?;
    info!(
        "Loaded {} scans from {} ({} malformed entries)",
        log.scans.len(),
        path.display(),
        log.malformed
    );
    Ok(log)
}

/// Parse scan log content already in memory.
pub fn parse_scans(content: &str, key: &str) -> Result<ScanLog, StoreError> {
    let value: Value = serde_json::from_str(content)?;

    match value {
        Value::Array(entries) => Ok(collect_scans(entries)),
        Value::Object(mut entries) => match entries.remove(key) {
            Some(entry) => decode_entry(key, entry),
            None => {
                debug!("Key `{}` not present in storage dump, treating as empty", key);
                Ok(ScanLog::default())
            }
        },
        other => Err(StoreError::UnexpectedShape(kind_of(&other))),
    }
}

/// Decode the value stored under `key`.
///
/// Browser storage only holds strings, so the list normally arrives
/// JSON-encoded inside a string. An already-decoded array is accepted too.
fn decode_entry(key: &str, entry: Value) -> Result<ScanLog, StoreError> {
    let invalid = |reason: String| StoreError::InvalidEntry {
        key: key.to_string(),
        reason,
    };

    match entry {
        Value::String(encoded) => {
            let inner: Value =
                serde_json::from_str(&encoded).map_err(|e| invalid(e.to_string()))?;
            match inner {
                Value::Array(entries) => Ok(collect_scans(entries)),
                Value::Null => Ok(ScanLog::default()),
                other => Err(invalid(format!(
                    "expected an array, found {}",
                    kind_of(&other)
                ))),
            }
        }
        Value::Array(entries) => Ok(collect_scans(entries)),
        Value::Null => Ok(ScanLog::default()),
        other => Err(invalid(format!(
            "expected a string, found {}",
            kind_of(&other)
        ))),
    }
}

/// Convert array entries into scans, counting the ones that aren't scans.
fn collect_scans(entries: Vec<Value>) -> ScanLog {
    let mut log = ScanLog::default();

    for (position, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            warn!("Skipping log entry {}: found {}", position, kind_of(&entry));
            log.malformed += 1;
            continue;
        }
        match serde_json::from_value::<RawScan>(entry) {
            Ok(scan) => log.scans.push(scan),
            Err(e) => {
                warn!("Skipping log entry {}: {}", position, e);
                log.malformed += 1;
            }
        }
    }

    log
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KEY: &str = "latecomersData";

    #[test]
    fn test_bare_array() {
        let log = parse_scans(
            r#"[{"rollno": "21CS001", "time": "2024-01-15T04:10:00.000Z"},
                {"rollno": "21CS002", "time": "2024-01-15T04:20:00.000Z"}]"#,
            KEY,
        )
        .unwrap();
        assert_eq!(log.scans.len(), 2);
        assert_eq!(log.scans[1].roll_number, "21CS002");
        assert_eq!(log.malformed, 0);
    }

    #[test]
    fn test_storage_dump_with_encoded_entry() {
        let content = serde_json::json!({
            "theme": "dark",
            KEY: r#"[{"rollno":"21CS001","time":"2024-01-15T04:10:00.000Z"}]"#,
        })
        .to_string();

        let log = parse_scans(&content, KEY).unwrap();
        assert_eq!(log.scans, vec![RawScan::new("21CS001", "2024-01-15T04:10:00.000Z")]);
    }

    #[test]
    fn test_storage_dump_with_plain_array_entry() {
        let content = r#"{"scans": [{"rollNumber": "r1", "timestamp": "2024-01-15T09:45:00"}]}"#;
        let log = parse_scans(content, "scans").unwrap();
        assert_eq!(log.scans.len(), 1);
    }

    #[test]
    fn test_missing_key_is_empty_log() {
        let log = parse_scans(r#"{"other": "[]"}"#, KEY).unwrap();
        assert_eq!(log, ScanLog::default());

        let log = parse_scans(r#"{"latecomersData": "null"}"#, KEY).unwrap();
        assert_eq!(log, ScanLog::default());
    }

    #[test]
    fn test_malformed_logs_are_rejected() {
        assert!(matches!(parse_scans("{not json", KEY), Err(StoreError::Json(_))));
        assert!(matches!(
            parse_scans("42", KEY),
            Err(StoreError::UnexpectedShape("a number"))
        ));
        assert!(matches!(
            parse_scans(r#"{"latecomersData": "{\"a\": 1}"}"#, KEY),
            Err(StoreError::InvalidEntry { .. })
        ));
        assert!(matches!(
            parse_scans(r#"{"latecomersData": 7}"#, KEY),
            Err(StoreError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_bad_entries_do_not_sink_the_log() {
        let content = r#"[
            {"rollno": "r1", "time": "2024-01-15T09:45:00"},
            {"rollno": "r2", "time": null},
            {"rollno": 42, "time": "2024-01-15T09:50:00"},
            {"rollno": "r4"},
            "stray",
            7,
            {"rollno": "r5", "time": "2024-01-15T10:00:00"}
        ]"#;

        let log = parse_scans(content, KEY).unwrap();
        assert_eq!(log.malformed, 2);
        let rolls: Vec<_> = log.scans.iter().map(|s| s.roll_number.as_str()).collect();
        assert_eq!(rolls, vec!["r1", "r2", "42", "r4", "r5"]);
        assert_eq!(log.scans[1].timestamp, "");

        let dump = serde_json::json!({ KEY: content }).to_string();
        assert_eq!(parse_scans(&dump, KEY).unwrap(), log);
    }

    #[test]
    fn test_load_scans_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"rollno": "r1", "time": "2024-01-15T09:45:00"}}]"#).unwrap();

        let log = load_scans(file.path(), KEY).unwrap();
        assert_eq!(log.scans[0].timestamp, "2024-01-15T09:45:00");

        let err = load_scans(Path::new("/no/such/scans.json"), KEY).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(err.to_string().contains("/no/such/scans.json"));
    }
}
