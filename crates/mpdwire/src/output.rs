use std::collections::BTreeSet;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mpdwire_client::Record;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChangeOutput<'a> {
    subsystem: &'a str,
    timestamp: String,
}

pub fn print_record(record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KEY", "VALUE"]);
            for (key, value) in record {
                table.add_row(vec![key.as_str(), value.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let width = record.keys().map(|key| key.len()).max().unwrap_or(0);
            for (key, value) in record {
                println!("{key:>width$}  {value}");
            }
        }
        OutputFormat::Raw => {
            for (key, value) in record {
                println!("{key}: {value}");
            }
        }
    }
}

pub fn print_records(records: &[Record], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Table => {
            let columns = record_columns(records);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(columns.iter().map(|c| c.to_uppercase()).collect::<Vec<_>>());
            for record in records {
                table.add_row(
                    columns
                        .iter()
                        .map(|c| record.get(*c).map(String::as_str).unwrap_or(""))
                        .collect::<Vec<_>>(),
                );
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, record) in records.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                println!("#{index}");
                print_record(record, OutputFormat::Pretty);
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_record(record, OutputFormat::Raw);
            }
        }
    }
}

pub fn print_change(subsystem: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ChangeOutput {
            subsystem,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("changed: {subsystem}"),
        OutputFormat::Raw => println!("{subsystem}"),
    }
    let _ = std::io::stdout().flush();
}

pub fn print_raw(payload: &str) {
    let mut out = std::io::stdout();
    let _ = out.write_all(payload.as_bytes());
    if !payload.is_empty() && !payload.ends_with('\n') {
        let _ = out.write_all(b"\n");
    }
    let _ = out.flush();
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Union of keys, in order of first appearance.
fn record_columns(records: &[Record]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for key in records.iter().flat_map(|record| record.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.as_str());
        }
    }
    columns
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn columns_cover_every_key_once() {
        let records = vec![
            record(&[("file", "a.flac"), ("Title", "A")]),
            record(&[("file", "b.flac"), ("Artist", "B")]),
        ];
        assert_eq!(record_columns(&records), vec!["Title", "file", "Artist"]);
        assert!(record_columns(&[]).is_empty());
    }
}
