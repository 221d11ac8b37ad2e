//! Comma-separated text: a quote-aware tokenizer and field escaping.
//!
//! Quoted fields may contain commas, line breaks and doubled quotes (`""`).
//! Both `\n` and `\r\n` end a record. Blank lines are skipped.

use crate::error::CoreError;

/// Parsed CSV document: the header line and every following record.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl CsvTable {
    /// Index of the first header equal to `name`.
    pub fn header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Decode raw file bytes and parse them. A leading UTF-8 BOM is dropped.
pub fn parse_bytes(bytes: &[u8]) -> Result<CsvTable, CoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::Parse(format!("file is not valid UTF-8: {e}")))?;
    parse(text)
}

/// Parse CSV text into a header line and records.
///
/// Fails when the text has no header line or ends inside a quoted field.
pub fn parse(text: &str) -> Result<CsvTable, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = tokenize(text)?.into_iter();

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| CoreError::Parse("file has no header line".into()))?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    Ok(CsvTable {
        headers,
        records: rows.collect(),
    })
}

fn tokenize(text: &str) -> Result<Vec<Vec<String>>, CoreError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // True right after a delimiter or line start, where an opening quote is allowed.
    let mut at_field_start = true;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                in_quotes = true;
                quote_line = line;
                at_field_start = false;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                line += 1;
                row.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut row));
                at_field_start = true;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err(CoreError::Parse(format!(
            "unterminated quoted field starting on line {quote_line}"
        )));
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row);
    }

    Ok(rows)
}

/// Blank lines (a single empty field) are not records.
fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.len() == 1 && row[0].is_empty() {
        return;
    }
    rows.push(row);
}

/// Quote a value when it contains a comma, a double quote or a line break.
/// Embedded double quotes are doubled.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join already-stringified values into one CSV line.
pub fn format_line<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| escape_field(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
