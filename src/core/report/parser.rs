use std::collections::BTreeMap;
use std::ops::Range;

use serde_json::Value;

/// One report line, column name to cell text.
pub type Row = BTreeMap<String, String>;

/// Usage report payload, classified once when it arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReport {
    /// Delimited text whose first non-empty line is the header.
    Delimited(String),
    /// Records that already carry column names.
    Structured(Vec<Row>),
}

impl RawReport {
    /// Classify a report body.
    ///
    /// A JSON object with a `value` array is structured; any other JSON body
    /// is unrecognized. Non-JSON text that mentions `key_column` is delimited.
    pub fn detect(body: &str, key_column: &str) -> Option<Self> {
        let trimmed = body.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with(['{', '[']) {
            return match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(mut envelope)) => match envelope.remove("value") {
                    Some(Value::Array(items)) => {
                        Some(Self::Structured(items.into_iter().filter_map(json_row).collect()))
                    }
                    _ => None,
                },
                _ => None,
            };
        }
        if body.contains(key_column) {
            return Some(Self::Delimited(body.to_string()));
        }
        None
    }
}

/// Flatten one JSON record into a row. Scalars become strings and nulls
/// become empty cells, so the column still counts as present. Nested values
/// are dropped.
fn json_row(item: Value) -> Option<Row> {
    let Value::Object(fields) = item else {
        return None;
    };
    let row = fields
        .into_iter()
        .filter_map(|(k, v)| {
            let cell = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => return None,
            };
            Some((k, cell))
        })
        .collect();
    Some(row)
}

#[derive(Debug, Clone, Copy)]
pub struct ReportParser {
    delimiter: char,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl ReportParser {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Turn a report into a lazy sequence of rows.
    pub fn rows(self, report: RawReport) -> Box<dyn Iterator<Item = Row>> {
        match report {
            RawReport::Structured(rows) => Box::new(rows.into_iter()),
            RawReport::Delimited(text) => Box::new(DelimitedRows::new(text, self.delimiter)),
        }
    }
}

fn unquote(cell: &str) -> String {
    cell.trim().trim_matches('"').trim().to_string()
}

/// Iterator over the data lines of a delimited report. Lines are split off
/// the owned text only as rows are requested.
struct DelimitedRows {
    text: String,
    pos: usize,
    line_no: usize,
    header: Vec<String>,
    delimiter: char,
}

impl DelimitedRows {
    fn new(text: String, delimiter: char) -> Self {
        let pos = if text.starts_with('\u{feff}') {
            '\u{feff}'.len_utf8()
        } else {
            0
        };
        let mut rows = Self {
            text,
            pos,
            line_no: 0,
            header: Vec::new(),
            delimiter,
        };
        if let Some((_, range)) = rows.next_line() {
            rows.header = rows.text[range].split(delimiter).map(unquote).collect();
        }
        rows
    }

    /// Advance past the next non-blank line and return its number and byte
    /// range, without the line terminator.
    fn next_line(&mut self) -> Option<(usize, Range<usize>)> {
        while self.pos < self.text.len() {
            let start = self.pos;
            let rest = &self.text[start..];
            let end = start + rest.find('\n').unwrap_or(rest.len());
            self.pos = end + 1;
            self.line_no += 1;

            let line = self.text[start..end].trim_end_matches('\r');
            if !line.trim().is_empty() {
                return Some((self.line_no, start..start + line.len()));
            }
        }
        None
    }
}

impl Iterator for DelimitedRows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        while let Some((line_no, range)) = self.next_line() {
            let values: Vec<&str> = self.text[range].split(self.delimiter).collect();
            if values.len() != self.header.len() {
                tracing::warn!(
                    line = line_no,
                    expected = self.header.len(),
                    found = values.len(),
                    "Skipping report line with mismatched column count"
                );
                continue;
            }
            return Some(
                self.header
                    .iter()
                    .cloned()
                    .zip(values.into_iter().map(unquote))
                    .collect(),
            );
        }
        None
    }
}
