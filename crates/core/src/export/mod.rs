//! Serialisation of saved entries to downloadable files.

mod csv;
mod docx;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::session::Entry;

pub use self::csv::{entries_to_csv, CSV_HEADER};
pub use self::docx::{entries_to_docx, KEYWORDS_LABEL};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to build document archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write export buffer: {0}")]
    Buffer(#[from] std::io::Error),
    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportFormat {
    Csv,
    Docx,
}

impl ExportFormat {
    pub const ALL: [Self; 2] = [ExportFormat::Csv, ExportFormat::Docx];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Docx => "Word document",
        }
    }

    pub fn render(self, entries: &[Entry]) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Csv => entries_to_csv(entries),
            ExportFormat::Docx => entries_to_docx(entries),
        }
    }
}

/// Renders `entries` and writes them to `path`, returning the byte count.
pub fn write_export(
    path: &Path,
    entries: &[Entry],
    format: ExportFormat,
) -> Result<usize, ExportError> {
    let bytes = format.render(entries)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ExportError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, &bytes).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_both_formats_to_disk() {
        let dir = tempdir().unwrap();
        let entries = [Entry::new("t", "k", "p")];
        for format in ExportFormat::ALL {
            let path = dir
                .path()
                .join("out")
                .join(format!("entries.{}", format.extension()));
            let written = write_export(&path, &entries, format).unwrap();
            assert_eq!(fs::metadata(&path).unwrap().len() as usize, written);
        }
    }
}
