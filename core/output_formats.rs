use crate::error::{AppError, Result};
use crate::manifest::ManifestInfo;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One entry of `<module>_index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    #[serde(rename = "path")]
    pub relative_path: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "type")]
    pub extension: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStage {
    Walk,
    Manifest,
    Read,
    Checksum,
}

/// A recoverable failure kept for the summary's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: String,
    pub stage: IssueStage,
    pub message: String,
}

impl FileIssue {
    pub fn new(path: impl Into<String>, stage: IssueStage, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub file_types: IndexMap<String, usize>,
}

/// Shape of `<module>_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub module_name: String,
    pub extraction_date: String,
    pub module_info: ManifestInfo,
    pub statistics: Statistics,
    pub dependencies: Value,
    pub version: Value,
    pub author: Value,
    pub category: Value,
    pub errors: Vec<FileIssue>,
}

/// Shape of `<module>_index.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileIndex<'a> {
    pub module: &'a str,
    pub files: &'a [FileRecord],
    pub total_files: usize,
    pub total_size: u64,
}

/// Megabytes rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}

pub fn serialize_to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, AppError> {
    if pretty {
        serde_json::to_string_pretty(value).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(value).map_err(AppError::JsonSerialize)
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serialize_to_json(value, true)?;
    fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
