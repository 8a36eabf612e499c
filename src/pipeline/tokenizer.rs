//! Splits CSV text into a header row and data rows.
//!
//! The tokenizer is deliberately forgiving: a quote that is opened but never
//! closed swallows the rest of its line instead of raising an error.

use crate::error::{IngestError, Result};

/// Ordered fields of one CSV line
pub type RawRow = Vec<String>;

/// A document split into its header and data rows
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub headers: RawRow,
    pub rows: Vec<RawRow>,
}

/// Tokenize a single CSV line into trimmed fields.
///
/// Commas inside double quotes do not split, and `""` inside a quoted
/// section yields a literal `"`.
pub fn tokenize_line(line: &str) -> RawRow {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Split a whole document into header and data rows.
///
/// A leading UTF-8 byte order mark is dropped. Accepts `\n` and `\r\n` line
/// endings and ignores blank lines. Fails with
/// [`IngestError::EmptyInput`] unless there is a header and at least one data row.
pub fn parse_document(text: &str) -> Result<ParsedDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(line) => tokenize_line(line),
        None => return Err(IngestError::EmptyInput),
    };

    let rows: Vec<RawRow> = lines.map(tokenize_line).collect();
    if rows.is_empty() {
        return Err(IngestError::EmptyInput);
    }

    Ok(ParsedDocument { headers, rows })
}
