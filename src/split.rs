//! Split engine: contiguous near-equal chunks, written to disk and then
//! checked against the source by reloading them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{PrepError, PrepResult};
use crate::io::{read_json, write_json_pretty};

/// Root of a file to split. Objects are split over their entries.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonDocument {
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl JsonDocument {
    pub fn from_value(value: Value) -> PrepResult<Self> {
        match value {
            Value::Array(items) => Ok(JsonDocument::Array(items)),
            Value::Object(map) => Ok(JsonDocument::Object(map)),
            _ => Err(PrepError::Config(
                "JSON root must be an array or object".to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            JsonDocument::Array(items) => items.len(),
            JsonDocument::Object(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items as compared by the round-trip check. Object entries become
    /// `[key, value]` pairs.
    pub fn items(&self) -> Vec<Value> {
        match self {
            JsonDocument::Array(items) => items.clone(),
            JsonDocument::Object(map) => map
                .iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                .collect(),
        }
    }

    /// Split into `n` documents of the same kind as `self`.
    pub fn split(&self, n: usize) -> PrepResult<Vec<JsonDocument>> {
        match self {
            JsonDocument::Array(items) => Ok(split(items, n)?
                .into_iter()
                .map(JsonDocument::Array)
                .collect()),
            JsonDocument::Object(map) => {
                let entries: Vec<(String, Value)> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                Ok(split(&entries, n)?
                    .into_iter()
                    .map(|chunk| JsonDocument::Object(chunk.into_iter().collect()))
                    .collect())
            }
        }
    }
}

impl Serialize for JsonDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsonDocument::Array(items) => items.serialize(serializer),
            JsonDocument::Object(map) => map.serialize(serializer),
        }
    }
}

/// Contiguous split into `n` chunks of `len / n` items; the last chunk also
/// takes the remainder.
pub fn split<T: Clone>(items: &[T], n: usize) -> PrepResult<Vec<Vec<T>>> {
    if n == 0 {
        return Err(PrepError::Config("n_splits must be positive".to_string()));
    }
    let total = items.len();
    if n > total {
        return Err(PrepError::Config(format!(
            "Cannot split {total} items into {n} parts"
        )));
    }

    let chunk_size = total / n;
    let chunks = (0..n)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i == n - 1 { total } else { start + chunk_size };
            items[start..end].to_vec()
        })
        .collect();
    Ok(chunks)
}

/// Deterministic encoding for order-independent comparison: object keys
/// sorted at every level, and the lists under `spans` sorted.
pub fn canonical_encoding(item: &Value) -> String {
    let mut value = sort_keys(item);
    if let Some(Value::Object(spans)) = value.get_mut("spans") {
        for list in spans.values_mut() {
            if let Value::Array(entries) = list {
                entries.sort_by_cached_key(|v| v.to_string());
            }
        }
    }
    value.to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for k in keys {
                sorted.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_items_original: usize,
    pub total_items_split: usize,
    pub missing_items_count: usize,
    pub extra_items_count: usize,
    pub split_files_created: usize,
    pub is_valid: bool,
}

/// Compare `original` with the union of `chunks` as multisets of canonical
/// encodings.
pub fn verify_round_trip(original: &[Value], chunks: &[Vec<Value>]) -> ValidationReport {
    let mut balance: BTreeMap<String, i64> = BTreeMap::new();
    for item in original {
        *balance.entry(canonical_encoding(item)).or_default() += 1;
    }
    let mut total_split = 0usize;
    for item in chunks.iter().flatten() {
        total_split += 1;
        *balance.entry(canonical_encoding(item)).or_default() -= 1;
    }

    let missing: i64 = balance.values().filter(|&&c| c > 0).sum();
    let extra: i64 = balance.values().filter(|&&c| c < 0).map(|c| -c).sum();

    ValidationReport {
        total_items_original: original.len(),
        total_items_split: total_split,
        missing_items_count: missing as usize,
        extra_items_count: extra as usize,
        split_files_created: chunks.len(),
        is_valid: missing == 0 && extra == 0,
    }
}

/// `<parent>/<stem>_split` for input `<parent>/<stem>.<ext>`.
pub fn split_output_dir(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}_split", file_stem(input)))
}

pub fn chunk_file_name(stem: &str, part: usize) -> String {
    format!("{stem}_part{part}.json")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

#[derive(Debug)]
pub struct SplitOutcome {
    pub output_dir: PathBuf,
    pub chunk_paths: Vec<PathBuf>,
    pub report: ValidationReport,
}

/// Split `input` into `n` chunk files, reload every chunk file in the
/// output directory and verify the round trip.
///
/// A failed round trip is returned as `PrepError::RoundTrip` after the
/// chunk files were written; they must not be used.
pub fn split_file(input: &Path, n: usize) -> PrepResult<SplitOutcome> {
    if !input.is_file() {
        return Err(PrepError::Config(format!(
            "Input file {} not found",
            input.display()
        )));
    }
    let document = JsonDocument::from_value(read_json(input)?)?;
    let chunks = document.split(n)?;

    let stem = file_stem(input);
    let output_dir = split_output_dir(input);
    fs::create_dir_all(&output_dir)?;

    let mut chunk_paths = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let path = output_dir.join(chunk_file_name(&stem, i + 1));
        write_json_pretty(&path, chunk)?;
        info!("Wrote {} item(s) → {}", chunk.len(), path.display());
        chunk_paths.push(path);
    }

    let reloaded = reload_chunks(&output_dir, &stem)?;
    let report = verify_round_trip(&document.items(), &reloaded);
    info!("Round-trip report: {report:?}");

    if !report.is_valid {
        error!(
            "Split of {} is invalid: {} missing, {} extra",
            input.display(),
            report.missing_items_count,
            report.extra_items_count
        );
        return Err(PrepError::RoundTrip {
            missing: report.missing_items_count,
            extra: report.extra_items_count,
        });
    }

    Ok(SplitOutcome {
        output_dir,
        chunk_paths,
        report,
    })
}

// every `<stem>_part*.json` in the directory, not only the ones just written
fn reload_chunks(dir: &Path, stem: &str) -> PrepResult<Vec<Vec<Value>>> {
    let prefix = format!("{stem}_part");
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|s| s.to_str())
                .map_or(false, |name| name.starts_with(&prefix) && name.ends_with(".json"))
        })
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|p| Ok(JsonDocument::from_value(read_json(p)?)?.items()))
        .collect()
}
