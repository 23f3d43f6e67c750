use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{CalendarEvent, Category};

const EVENTS_MARKER: &str = "\n=== EVENTS ===\n";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML header: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("failed to parse JSONL event #{index}: {source}")]
    JsonDecode {
        index: usize,
        source: serde_json::Error,
    },
    #[error("unsupported snapshot schema version: {0}")]
    UnsupportedSchema(u32),
    #[error("category declared twice: {0}")]
    DuplicateCategory(String),
    #[error("event #{index} references unknown category: {category_id}")]
    UnknownCategory { index: usize, category_id: String },
    #[error("event #{index} ends before it starts")]
    InvertedEvent { index: usize },
}

#[derive(Debug, Deserialize)]
struct SnapshotHeader {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    categories: Vec<CategoryHeader>,
}

#[derive(Debug, Deserialize)]
struct CategoryHeader {
    id: String,
    label: String,
    #[serde(default)]
    color: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Reads a calendar snapshot. A missing or blank file is an empty calendar.
pub fn load_calendar(path: &Path) -> Result<Vec<Category>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "calendar snapshot not found, starting empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(StorageError::Io(err)),
    };

    let categories = parse_calendar(&raw)?;
    info!(
        path = %path.display(),
        categories = categories.len(),
        events = categories.iter().map(|category| category.events.len()).sum::<usize>(),
        "loaded calendar snapshot"
    );
    Ok(categories)
}

pub fn parse_calendar(raw: &str) -> Result<Vec<Category>, StorageError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let (header_blob, events_blob) = raw.split_once(EVENTS_MARKER).unwrap_or((raw, ""));

    let header: SnapshotHeader = toml::from_str(header_blob)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema(header.schema_version));
    }

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(header.categories.len());
    for entry in header.categories {
        if !seen.insert(entry.id.clone()) {
            return Err(StorageError::DuplicateCategory(entry.id));
        }
        categories.push(Category::new(entry.id, entry.label, entry.color));
    }

    let lines = events_blob.lines().filter(|line| !line.trim().is_empty());
    for (offset, line) in lines.enumerate() {
        let index = offset + 1;
        let event: CalendarEvent = serde_json::from_str(line)
            .map_err(|source| StorageError::JsonDecode { index, source })?;
        if event.end < event.start {
            return Err(StorageError::InvertedEvent { index });
        }

        let category = categories
            .iter_mut()
            .find(|category| category.id == event.category_id)
            .ok_or_else(|| StorageError::UnknownCategory {
                index,
                category_id: event.category_id.clone(),
            })?;
        category.events.push(event);
    }

    debug!(categories = categories.len(), "parsed calendar snapshot");
    Ok(categories)
}
