//! Flat-text reply decoders.
//!
//! Reply payloads are `<key>: <value>` lines. Some replies describe one object
//! (`status`), others a list of objects back to back (`playlistinfo`), where a
//! repeated key marks the start of the next object.

use std::collections::BTreeMap;

use crate::error::RecordError;

/// One decoded object.
pub type Record = BTreeMap<String, String>;

/// Split a `<key>: <value>` line.
///
/// The key is the non-empty text before the first `": "` and must not contain
/// a space; the value is everything after it and may be empty.
pub fn parse_pair(line: &str) -> Result<(&str, &str), RecordError> {
    match line.split_once(": ") {
        Some((key, value)) if !key.is_empty() && !key.contains(' ') => Ok((key, value)),
        _ => Err(RecordError::MalformedLine {
            line: line.to_string(),
        }),
    }
}

/// Decode a payload describing a single object.
///
/// Empty lines are skipped. When a key repeats, the last value wins.
pub fn parse_record(payload: &str) -> Result<Record, RecordError> {
    let mut record = Record::new();
    for line in payload.split('\n').filter(|line| !line.is_empty()) {
        let (key, value) = parse_pair(line)?;
        record.insert(key.to_string(), value.to_string());
    }
    Ok(record)
}

/// Decode a payload describing a sequence of objects.
///
/// A new record starts whenever a key already present in the record being
/// built shows up again. An empty payload decodes to an empty sequence.
pub fn parse_records(payload: &str) -> Result<Vec<Record>, RecordError> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in payload.split('\n').filter(|line| !line.is_empty()) {
        let (key, value) = parse_pair(line)?;
        if current.contains_key(key) {
            records.push(std::mem::take(&mut current));
        }
        current.insert(key.to_string(), value.to_string());
    }

    if !current.is_empty() {
        records.push(current);
    }
    Ok(records)
}
