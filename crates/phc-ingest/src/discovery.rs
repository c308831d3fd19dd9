//! Source file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// A discovered source export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

/// How a source export is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// `.xlsx` or `.xls`; the first sheet is read.
    Workbook,
}

impl SourceFormat {
    /// Format implied by the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Returns true for CSV and spreadsheet exports.
pub fn is_source_file(path: &Path) -> bool {
    SourceFormat::from_path(path).is_some()
}

/// Recursively lists all source exports under a directory.
///
/// Returns files sorted by full path, so concatenation order does not depend
/// on the filesystem's traversal order.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    collect_source_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

/// Lists source files with their names and sizes.
pub fn describe_source_files(dir: &Path) -> Result<Vec<SourceFile>> {
    list_source_files(dir)?
        .into_iter()
        .map(|path| {
            let metadata = std::fs::metadata(&path).map_err(|e| IngestError::FileRead {
                path: path.clone(),
                source: e,
            })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(SourceFile {
                path,
                file_name,
                size_bytes: metadata.len(),
            })
        })
        .collect()
}

fn collect_source_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_source_files(&path, files)?;
        } else if path.is_file() && is_source_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}
