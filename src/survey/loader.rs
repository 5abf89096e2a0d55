//! Reading survey exports.

use super::schema::{Field, Schema};
use super::table::{ResponseRecord, ResponseTable};
use super::SurveyError;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// How to read an export.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Fail when any known field is missing from the header.
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            strict: false,
        }
    }
}

/// Load a survey export from disk.
pub fn load_table(
    path: &Path,
    schema: &Schema,
    options: &LoadOptions,
) -> Result<ResponseTable, SurveyError> {
    if !path.is_file() {
        return Err(SurveyError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Loading survey responses from {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| SurveyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    read_table(file, source, schema, options)
}

/// Read a survey export from any reader. `source` names it in messages.
pub fn read_table<R: Read>(
    reader: R,
    source: String,
    schema: &Schema,
    options: &LoadOptions,
) -> Result<ResponseTable, SurveyError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| SurveyError::Parse {
            source_name: source.clone(),
            source: e,
        })?
        .iter()
        .map(String::from)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SurveyError::EmptyInput { source_name: source });
    }
    debug!("Header row has {} columns", headers.len());

    let resolved = schema.resolve(&headers);
    if resolved.found_count() == 0 {
        return Err(SurveyError::SchemaMismatch {
            source_name: source,
            expected: schema.describe(),
        });
    }
    if !resolved.missing().is_empty() {
        let names = join_fields(resolved.missing());
        if options.strict {
            return Err(SurveyError::MissingColumns {
                source_name: source,
                fields: names,
            });
        }
        warn!("Columns not found in {}: {}", source, names);
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (idx, row) in rdr.records().enumerate() {
        let row = row.map_err(|e| SurveyError::Parse {
            source_name: source.clone(),
            source: e,
        })?;

        if row.iter().all(|cell| cell.trim().is_empty()) {
            debug!("row {} is blank", idx + 2);
            dropped += 1;
            continue;
        }
        // A row with only a timestamp still counts as a response.
        records.push(ResponseRecord::from_cells(
            resolved
                .present()
                .map(|(field, col)| (field, row.get(col).unwrap_or(""))),
        ));
    }

    if dropped > 0 {
        warn!("Dropped {} blank rows", dropped);
    }
    info!(
        "Loaded {} responses with {} of {} known columns",
        records.len(),
        resolved.found_count(),
        Field::ALL.len()
    );

    Ok(ResponseTable::new(records, resolved, source))
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}
