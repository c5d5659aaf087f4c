//! Raw CSV tables with cleaned fields.
//!
//! Real feeds are sloppy: stray whitespace around separators, byte-order
//! marks on the first header, fields wrapped in quotes after a leading space
//! (which CSV parsers keep literally). Every header and field goes through
//! [`clean_field`] before the typed parsers see it.

use std::collections::HashMap;
use std::io::Read;

use tracing::warn;

use super::error::FeedError;

/// Trim whitespace and BOM, and strip one layer of surrounding quotes.
pub fn clean_field(raw: &str) -> String {
    let s = raw.trim_start_matches('\u{feff}').trim();
    let s = s
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s);
    s.trim().to_string()
}

/// A fully read table: cleaned header and rows.
#[derive(Debug)]
pub struct Table {
    file: &'static str,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Read and clean every record of a CSV table.
    ///
    /// Rows the CSV reader cannot decode are skipped and counted.
    pub fn read<R: Read>(file: &'static str, reader: R) -> Result<Self, FeedError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|source| FeedError::Csv { file, source })?
            .clone();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (clean_field(h), idx))
            .collect();

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let Ok(record) = result else {
                skipped += 1;
                continue;
            };
            rows.push(record.iter().map(clean_field).collect());
        }
        if skipped > 0 {
            warn!(file, skipped, "Skipped undecodable feed rows");
        }

        Ok(Self {
            file,
            columns,
            rows,
        })
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Index of an optional column.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Index of a required column.
    pub fn require(&self, name: &'static str) -> Result<usize, FeedError> {
        self.column(name).ok_or(FeedError::MissingColumn {
            file: self.file,
            column: name,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|fields| Row { fields })
    }
}

/// One cleaned row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    fields: &'a [String],
}

impl<'a> Row<'a> {
    /// Field at `idx`, or `""` when the column or cell is absent.
    pub fn get(&self, idx: Option<usize>) -> &'a str {
        idx.and_then(|i| self.fields.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Field at a required column index.
    pub fn at(&self, idx: usize) -> &'a str {
        self.get(Some(idx))
    }

    /// Non-empty field at `idx`.
    pub fn opt(&self, idx: Option<usize>) -> Option<String> {
        let value = self.get(idx);
        (!value.is_empty()).then(|| value.to_string())
    }
}
