//! History file persistence
//!
//! The history file holds one JSON object per line. Saves rewrite the whole
//! file through a temporary sibling and an atomic rename, so a crash mid-save
//! leaves the previous file intact.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{Result, ShellError};

use super::item::HistoryItem;
use super::store::LIMIT;

/// Longest history record accepted when loading
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Resolve the on-disk location of a history file
///
/// Names without an extension get `.jsonl`, relative names resolve under the
/// home directory, and missing parent directories are created.
///
/// # Errors
/// Returns an error if the home directory is unknown or the parent directory
/// cannot be created
pub async fn history_file_location(file_name: &str) -> Result<PathBuf> {
    let mut path = PathBuf::from(file_name);
    if path.extension().is_none() {
        path.set_extension("jsonl");
    }

    if path.is_relative() {
        let home = dirs::home_dir()
            .ok_or_else(|| ShellError::history_location("unable to get user home directory"))?;
        path = home.join(path);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            ShellError::history_location(format!(
                "unable to create history directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    Ok(path)
}

/// Read the command records from a history file
///
/// A missing file is an empty history. Only the newest [`LIMIT`] records are
/// kept; each is marked as loaded, and a restored-history marker follows them.
///
/// # Arguments
/// * `path` - History file to read
/// * `strict` - Fail on records longer than [`MAX_LINE_BYTES`] instead of
///   skipping them
///
/// # Errors
/// Returns an error for unreadable files, invalid UTF-8, undecodable records,
/// and (in strict mode) oversized records
pub async fn read_history(path: &Path, strict: bool) -> Result<Vec<HistoryItem>> {
    let file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut history = std::collections::VecDeque::new();
    let mut buffer = Vec::new();
    let mut line_number = 0;

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        line_number += 1;

        while matches!(buffer.last(), Some(b'\n' | b'\r')) {
            buffer.pop();
        }
        if buffer.len() > MAX_LINE_BYTES {
            if strict {
                return Err(ShellError::LineTooLong {
                    line: line_number,
                    len: buffer.len(),
                    limit: MAX_LINE_BYTES,
                });
            }
            log::warn!("Skipping oversized history line {line_number}");
            continue;
        }
        if buffer.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let text = std::str::from_utf8(&buffer)
            .map_err(|_| ShellError::InvalidUtf8 { line: line_number })?;
        let mut item: HistoryItem = serde_json::from_str(text).map_err(|source| {
            ShellError::HistoryRecord {
                line: line_number,
                source,
            }
        })?;
        item.loaded = true;

        history.push_back(item);
        if history.len() > LIMIT {
            history.pop_front();
        }
    }

    let mut history: Vec<HistoryItem> = history.into();
    if !history.is_empty() {
        history.push(HistoryItem::restored_marker());
    }

    log::debug!("Loaded {} history items from {}", history.len(), path.display());
    Ok(history)
}

/// Write the command items of a snapshot to a history file
///
/// # Errors
/// Returns an error if a record cannot be encoded or the file cannot be
/// written
pub async fn save_history(path: &Path, items: &[HistoryItem]) -> Result<()> {
    let mut contents = Vec::new();
    for item in items.iter().filter(|item| item.is_command()) {
        serde_json::to_writer(&mut contents, item)?;
        contents.push(b'\n');
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| ShellError::history_location(format!("{} has no file name", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(&contents).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Load the history configured by `file_name`
///
/// `None` disables persistence. Any failure becomes a single internal error
/// item so the shell can show it.
pub async fn load_history(file_name: Option<&str>, strict: bool) -> Vec<HistoryItem> {
    let Some(file_name) = file_name else {
        return Vec::new();
    };

    let result = async {
        let path = history_file_location(file_name).await?;
        read_history(&path, strict).await
    }
    .await;

    match result {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Failed to load history from {file_name}: {e}");
            vec![HistoryItem::internal_error(
                "error loading history file",
                anyhow::Error::new(e),
            )]
        }
    }
}

/// Save a snapshot to the history configured by `file_name`
///
/// # Returns
/// An internal error item describing the failure, if the save failed
pub async fn persist_history(file_name: Option<&str>, items: &[HistoryItem]) -> Option<HistoryItem> {
    let file_name = file_name?;

    let result = async {
        let path = history_file_location(file_name).await?;
        save_history(&path, items).await
    }
    .await;

    match result {
        Ok(()) => None,
        Err(e) => {
            log::warn!("Failed to save history to {file_name}: {e}");
            Some(HistoryItem::internal_error(
                "error saving history file",
                anyhow::Error::new(e),
            ))
        }
    }
}
