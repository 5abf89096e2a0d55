//! In-memory response table.

use super::schema::{Field, ResolvedSchema};
use std::collections::HashMap;

/// One respondent's answers. Only non-empty cells are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseRecord {
    cells: HashMap<Field, String>,
}

impl ResponseRecord {
    /// Build a record, trimming every cell and discarding empty ones.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = (Field, S)>,
        S: AsRef<str>,
    {
        let cells = cells
            .into_iter()
            .filter_map(|(field, raw)| {
                let value = raw.as_ref().trim();
                (!value.is_empty()).then(|| (field, value.to_string()))
            })
            .collect();
        Self { cells }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.cells.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// All respondents of one export, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    records: Vec<ResponseRecord>,
    schema: ResolvedSchema,
    source: String,
}

impl ResponseTable {
    pub fn new(records: Vec<ResponseRecord>, schema: ResolvedSchema, source: String) -> Self {
        Self {
            records,
            schema,
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    /// Name of the file the table was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Cells of one field in row order, or `None` when the export has no
    /// such column.
    pub fn column(&self, field: Field) -> Option<Vec<Option<&str>>> {
        if !self.schema.is_present(field) {
            return None;
        }
        Some(self.records.iter().map(|r| r.get(field)).collect())
    }
}
