use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::error::RowError;

static NON_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]+").expect("static regex is valid"));

/// Turn a header into its canonical key: lowercase, with every run of
/// characters outside `[a-z0-9_]` replaced by a single underscore.
pub fn canonical_key(header: &str) -> String {
    let lower = header.trim().to_lowercase();
    NON_KEY_CHARS.replace_all(&lower, "_").into_owned()
}

/// One data row keyed by canonical column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    fields: BTreeMap<String, String>,
}

impl NormalizedRow {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|v| v.as_str())
    }

    /// Whether the column exists at all, regardless of the cell value
    pub fn has_column(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Value of the first alias whose column exists
    pub fn first_column<'a>(&'a self, aliases: &[&str]) -> Option<&'a str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }

    /// Value of the first alias whose cell is non-empty
    pub fn first_non_empty<'a>(&'a self, aliases: &[&str]) -> Option<&'a str> {
        aliases
            .iter()
            .filter_map(|alias| self.get(alias))
            .find(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Rows with fewer than half as many fields as the header are unparseable.
pub fn check_field_count(row: usize, headers: &[String], fields: &[String]) -> Result<(), RowError> {
    if fields.len() * 2 < headers.len() {
        return Err(RowError::TooFewFields {
            row,
            found: fields.len(),
            expected_min: headers.len().div_ceil(2),
        });
    }
    Ok(())
}

/// Map a data row onto the header's canonical keys.
///
/// Missing trailing fields become empty strings; surplus fields are dropped.
/// When two headers share a canonical key the first column wins.
pub fn normalize_row(headers: &[String], fields: &[String]) -> NormalizedRow {
    let mut map = BTreeMap::new();
    for (i, header) in headers.iter().enumerate() {
        let value = fields.get(i).map(|f| f.trim().to_string()).unwrap_or_default();
        map.entry(canonical_key(header)).or_insert(value);
    }
    NormalizedRow { fields: map }
}
