//! Shared dataset handle.

use super::loader::{load_table, LoadOptions};
use super::schema::Schema;
use super::table::ResponseTable;
use super::SurveyError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Holds the current table behind an `Arc`.
///
/// Readers take a snapshot and compute against it without holding the
/// lock. [`SurveyStore::reload`] is the only writer: it re-reads the export
/// and swaps the snapshot, leaving the old one untouched if reading fails.
#[derive(Debug)]
pub struct SurveyStore {
    input: PathBuf,
    schema: Schema,
    options: LoadOptions,
    table: RwLock<Arc<ResponseTable>>,
}

impl SurveyStore {
    /// Load the export once and wrap it.
    pub fn open(input: PathBuf, schema: Schema, options: LoadOptions) -> Result<Self, SurveyError> {
        let table = load_table(&input, &schema, &options)?;
        Ok(Self::from_table(input, schema, options, table))
    }

    pub fn from_table(
        input: PathBuf,
        schema: Schema,
        options: LoadOptions,
        table: ResponseTable,
    ) -> Self {
        Self {
            input,
            schema,
            options,
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// The current table.
    pub fn snapshot(&self) -> Arc<ResponseTable> {
        let guard = self.table.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Re-read the export and make it the current table.
    pub fn reload(&self) -> Result<Arc<ResponseTable>, SurveyError> {
        let table = Arc::new(load_table(&self.input, &self.schema, &self.options)?);
        let mut guard = self.table.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&table);
        info!("Reloaded {} responses from {}", table.len(), self.input.display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "¿En qué ciclo se encuentra actualmente?";

    #[test]
    fn test_reload_swaps_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}\n1\n", HEADER).unwrap();
        file.flush().unwrap();

        let store = SurveyStore::open(
            file.path().to_path_buf(),
            Schema::default(),
            LoadOptions::default(),
        )
        .unwrap();
        let before = store.snapshot();
        assert_eq!(before.len(), 1);

        writeln!(file, "2\n3").unwrap();
        file.flush().unwrap();
        let after = store.reload().unwrap();

        assert_eq!(after.len(), 3);
        assert_eq!(store.snapshot().len(), 3);
        // Old snapshots stay valid for whoever still holds them.
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), format!("{}\n1\n", HEADER)).unwrap();

        let store = SurveyStore::open(
            file.path().to_path_buf(),
            Schema::default(),
            LoadOptions::default(),
        )
        .unwrap();

        std::fs::write(file.path(), "unrelated,columns\n1,2\n").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.snapshot().len(), 1);
    }
}
