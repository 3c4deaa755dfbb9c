use crate::{COL_X, COL_Y, EventTable, Value};
use csv::ReaderBuilder;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub type LoadResult<T> = Result<T, LoadError>;

/// Default decode order for uploaded files.
pub const DEFAULT_ENCODINGS: [Encoding; 3] =
    [Encoding::Latin1, Encoding::Utf8, Encoding::Windows1252];

/// Cell spellings read as "no value".
const NA_VALUES: [&str; 12] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[serde(alias = "latin-1", alias = "iso-8859-1")]
    Latin1,
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "cp1252", alias = "windows-1252")]
    Windows1252,
}

impl Encoding {
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Latin1 => "latin-1",
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1252 => "cp1252",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| e.to_string()),
            Encoding::Windows1252 => bytes
                .iter()
                .enumerate()
                .map(|(pos, &b)| {
                    cp1252_char(b)
                        .ok_or_else(|| format!("undefined byte 0x{b:02X} at position {pos}"))
                })
                .collect(),
        }
    }
}

/// Windows-1252 agrees with Latin-1 outside 0x80..=0x9F; five code points
/// in that range are unassigned.
fn cp1252_char(b: u8) -> Option<char> {
    const HIGH: [Option<char>; 32] = [
        Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
        Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
        None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
        Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
    ];
    match b {
        0x80..=0x9F => HIGH[usize::from(b - 0x80)],
        _ => Some(char::from(b)),
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error, String),
    Empty,
    /// Every configured encoding failed; one `(encoding, reason)` per attempt.
    Decode(Vec<(Encoding, String)>),
    MissingColumn(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e, path) => write!(f, "Could not read {path}: {e}"),
            LoadError::Empty => write!(f, "File is empty"),
            LoadError::Decode(attempts) => {
                write!(f, "Could not decode file")?;
                for (encoding, reason) in attempts {
                    write!(f, "; {}: {reason}", encoding.label())?;
                }
                Ok(())
            }
            LoadError::MissingColumn(name) => write!(f, "Required column '{name}' not found"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Read a CSV file from disk and parse it with the given encoding order.
pub fn load_path(path: &Path, encodings: &[Encoding]) -> LoadResult<EventTable> {
    let bytes =
        std::fs::read(path).map_err(|e| LoadError::Io(e, path.display().to_string()))?;
    load_bytes(&bytes, encodings)
}

/// Decode and parse raw CSV bytes, trying each encoding in order.
///
/// An attempt succeeds when the decoded text parses as a rectangular CSV
/// table. The first successful attempt wins.
pub fn load_bytes(bytes: &[u8], encodings: &[Encoding]) -> LoadResult<EventTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::Empty);
    }

    let mut attempts = Vec::with_capacity(encodings.len());
    for encoding in encodings {
        let parsed = encoding
            .decode(strip_bom(bytes))
            .and_then(|text| parse_csv(&text));
        match parsed {
            Ok(table) => {
                debug!(
                    "parsed {} rows x {} columns as {}",
                    table.len(),
                    table.columns.len(),
                    encoding.label()
                );
                return require_coordinates(table);
            }
            Err(reason) => {
                debug!("{} attempt failed: {reason}", encoding.label());
                attempts.push((*encoding, reason));
            }
        }
    }
    Err(LoadError::Decode(attempts))
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn require_coordinates(table: EventTable) -> LoadResult<EventTable> {
    for required in [COL_X, COL_Y] {
        if !table.has_column(required) {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }
    Ok(table)
}

fn parse_csv(text: &str) -> Result<EventTable, String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.iter().all(String::is_empty) {
        return Err("no header row".to_string());
    }

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let numeric: Vec<bool> = (0..columns.len())
        .map(|col| {
            raw.iter()
                .map(|r| r[col].as_str())
                .filter(|cell| !is_na(cell))
                .all(|cell| cell.parse::<f64>().is_ok())
        })
        .collect();

    let rows = raw
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .zip(&numeric)
                .map(|(cell, &is_numeric)| to_value(cell, is_numeric))
                .collect()
        })
        .collect();

    Ok(EventTable::new(columns, rows))
}

fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

fn to_value(cell: String, numeric: bool) -> Value {
    if is_na(&cell) {
        return Value::Missing;
    }
    if numeric {
        // -0 and 0 are one value.
        cell.parse::<f64>().map(|n| Value::Number(n + 0.0)).unwrap_or(Value::Missing)
    } else {
        Value::Text(cell)
    }
}
