//! Merge engine: shard files in, one deduplicated collection out.
//!
//! The engine only reads. Writing the merged file and reporting the
//! diagnostics is left to the caller.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde_json::Value;

use crate::errors::{PrepError, PrepResult};
use crate::io::file_label;
use crate::record::{normalize, Record};

fn shard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"output_(\d+)\.json").expect("static shard pattern"))
}

/// Integer embedded in an `output_<n>.json` file name, 0 when absent.
pub fn shard_index(file_name: &str) -> u64 {
    shard_pattern()
        .captures(file_name)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(0)
}

/// List the `output_*.json` shards of a directory in processing order.
pub fn discover_shards(dir: &Path) -> PrepResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PrepError::Config(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let mut shards: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .map_or(false, |name| name.starts_with("output_") && name.ends_with(".json"))
        })
        .collect();

    if shards.is_empty() {
        return Err(PrepError::Config(format!(
            "No JSON files found in {}",
            dir.display()
        )));
    }

    shards.sort();
    sort_by_shard_index(&mut shards);
    Ok(shards)
}

// stable: equal indices keep their relative order
fn sort_by_shard_index(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| shard_index(&file_label(p)));
}

/// A record dropped because its `uri` was already taken.
#[derive(Debug, Clone)]
pub struct DuplicateUri {
    pub uri: i64,
    pub file: String,
    pub position: usize,
    pub kept_file: String,
    pub kept_position: usize,
    /// Whether the dropped record equals the kept one after normalization.
    pub identical: bool,
    pub discarded: Record,
}

/// Non-fatal problem found while merging.
#[derive(Debug)]
pub enum Diagnostic {
    /// Whole shard skipped.
    Parse(PrepError),
    /// One record skipped.
    Validation(PrepError),
    Duplicate(DuplicateUri),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Parse(e) | Diagnostic::Validation(e) => write!(f, "{e}"),
            Diagnostic::Duplicate(d) => {
                write!(
                    f,
                    "Skipping duplicate URI {} in {}, entry {} (kept {}, entry {})",
                    d.uri, d.file, d.position, d.kept_file, d.kept_position
                )?;
                if d.identical {
                    write!(f, "; content identical")
                } else {
                    let discarded = serde_json::to_string(&d.discarded).unwrap_or_default();
                    write!(f, "; content differs, discarded: {discarded}")
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_processed: usize,
    pub records_seen: usize,
    pub duplicates_skipped: usize,
}

struct Seen {
    index: usize,
    file: String,
    position: usize,
}

/// Merge shards in ascending embedded-index order, whatever order they are
/// passed in. First occurrence of a `uri` wins.
pub fn merge(paths: &[PathBuf]) -> MergeOutcome {
    merge_with_progress(paths, |_| {})
}

/// Same as [`merge`], calling `on_file` with each shard's file name just
/// before that shard is read.
pub fn merge_with_progress<F: FnMut(&str)>(paths: &[PathBuf], mut on_file: F) -> MergeOutcome {
    let mut ordered = paths.to_vec();
    sort_by_shard_index(&mut ordered);

    let mut outcome = MergeOutcome::default();
    // scoped to this call
    let mut seen: HashMap<i64, Seen> = HashMap::new();

    for path in &ordered {
        let name = file_label(path);
        info!("Processing {name}...");
        on_file(&name);

        let items = match load_shard(path, &name) {
            Ok(items) => items,
            Err(e) => {
                warn!("{e}");
                outcome.diagnostics.push(Diagnostic::Parse(e));
                continue;
            }
        };
        outcome.files_processed += 1;

        for (i, raw) in items.iter().enumerate() {
            let position = i + 1;
            outcome.records_seen += 1;

            let record = match normalize(raw, &name, position) {
                Ok(r) => r,
                Err(e) => {
                    warn!("{e}");
                    outcome.diagnostics.push(Diagnostic::Validation(e));
                    continue;
                }
            };

            if let Some(first) = seen.get(&record.uri) {
                let dup = DuplicateUri {
                    uri: record.uri,
                    file: name.clone(),
                    position,
                    kept_file: first.file.clone(),
                    kept_position: first.position,
                    identical: outcome.records[first.index] == record,
                    discarded: record,
                };
                outcome.duplicates_skipped += 1;
                let diagnostic = Diagnostic::Duplicate(dup);
                warn!("{diagnostic}");
                outcome.diagnostics.push(diagnostic);
                continue;
            }

            seen.insert(
                record.uri,
                Seen {
                    index: outcome.records.len(),
                    file: name.clone(),
                    position,
                },
            );
            outcome.records.push(record);
        }
    }

    info!(
        "Merged {} unique record(s) from {} file(s), {} duplicate(s) skipped",
        outcome.records.len(),
        outcome.files_processed,
        outcome.duplicates_skipped
    );
    outcome
}

fn load_shard(path: &Path, name: &str) -> PrepResult<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| PrepError::parse(name, format!("Cannot read file: {e}")))?;
    let json: Value = serde_json::from_str(&raw)
        .map_err(|e| PrepError::parse(name, format!("Invalid JSON ({e})")))?;
    match json {
        Value::Array(items) => Ok(items),
        _ => Err(PrepError::parse(name, "Top-level value must be a JSON array")),
    }
}
