//! Reading song rows from the CSV export.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{config::Columns, types::SongRow};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("CSV file '{}' not found.", .0.display())]
    NotFound(PathBuf),
    #[error("CSV file '{}' is missing required column(s): {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("Failed to read CSV file '{}': {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

struct ColumnIndex {
    title: usize,
    artist: usize,
    uri: usize,
}

fn normalize_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

fn locate_columns(
    path: &Path,
    headers: &csv::StringRecord,
    columns: &Columns,
) -> Result<ColumnIndex, InputError> {
    let position = |name: &str| {
        headers
            .iter()
            .position(|header| normalize_header(header) == name)
    };

    let title = position(&columns.title);
    let artist = position(&columns.artist);
    let uri = position(&columns.uri);

    match (title, artist, uri) {
        (Some(title), Some(artist), Some(uri)) => Ok(ColumnIndex { title, artist, uri }),
        _ => {
            let missing = [
                (title, &columns.title),
                (artist, &columns.artist),
                (uri, &columns.uri),
            ]
            .into_iter()
            .filter(|(idx, _)| idx.is_none())
            .map(|(_, name)| name.clone())
            .collect();

            Err(InputError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            })
        }
    }
}

/// Reads every data row of the CSV file at `path`.
///
/// Values are trimmed. Short rows yield empty values for the missing fields
/// instead of failing, so they can be counted as incomplete by the caller.
pub fn read_song_rows(path: &Path, columns: &Columns) -> Result<Vec<SongRow>, InputError> {
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let csv_err = |source: csv::Error| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let index = locate_columns(path, &headers, columns)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let field = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();

        rows.push(SongRow {
            line: record.position().map(|p| p.line()).unwrap_or_default(),
            title: field(index.title),
            artist: field(index.artist),
            external_uri: field(index.uri),
        });
    }

    Ok(rows)
}
