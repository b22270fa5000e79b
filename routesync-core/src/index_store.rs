//! Route index persistence.
//!
//! The index is a plain-text file with one `routeId,timestamp` record per
//! line. Timestamps are written in RFC 3339 with an explicit numeric offset.
//! The reader also accepts whitespace as the separator and skips blank lines.
//!
//! Writes use the atomic `.tmp` + rename pattern: a crash mid-save leaves the
//! previous index intact.

use std::collections::btree_map::Entry;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{index_io_err, IndexError};
use crate::types::{format_timestamp, parse_timestamp, Index, RouteId};

/// Load the index stored at `path`.
///
/// Returns an empty index if the file does not exist. Any unparseable record
/// fails the whole load with [`IndexError::Corrupt`].
pub fn load_at(path: &Path) -> Result<Index, IndexError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Index::new()),
        Err(err) => return Err(index_io_err(path, err)),
    };
    parse(path, &contents)
}

/// Atomically replace the index stored at `path`.
///
/// Writes to `<path>.tmp` in the same directory, then renames over `path`.
pub fn save_at(path: &Path, index: &Index) -> Result<(), IndexError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| index_io_err(dir, e))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, render(index)).map_err(|e| index_io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(index_io_err(path, e));
    }
    Ok(())
}

/// Sibling temp file used by [`save_at`].
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn render(index: &Index) -> String {
    let mut out = String::new();
    for (id, ts) in index {
        let _ = writeln!(out, "{id},{}", format_timestamp(ts));
    }
    out
}

fn parse(path: &Path, contents: &str) -> Result<Index, IndexError> {
    let mut index = Index::new();
    for (n, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.to_path_buf(),
            line: n + 1,
            reason,
        };

        let (id, ts) = split_record(line)
            .ok_or_else(|| corrupt(format!("expected 'routeId,timestamp', got '{line}'")))?;
        let id: RouteId = id
            .parse()
            .map_err(|e| corrupt(format!("invalid route id '{id}': {e}")))?;
        let ts = parse_timestamp(ts).map_err(|e| corrupt(e.to_string()))?;

        match index.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(ts);
            }
            Entry::Occupied(_) => return Err(corrupt(format!("duplicate route id {id}"))),
        }
    }
    Ok(index)
}

fn split_record(line: &str) -> Option<(&str, &str)> {
    let (id, ts) = match line.split_once(',') {
        Some(pair) => pair,
        None => line.split_once(char::is_whitespace)?,
    };
    let (id, ts) = (id.trim(), ts.trim());
    if id.is_empty() || ts.is_empty() || ts.contains(',') {
        return None;
    }
    Some((id, ts))
}
