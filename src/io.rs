use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{PrepError, PrepResult};

pub fn read_json(path: &Path) -> PrepResult<Value> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn read_json_array(path: &Path) -> PrepResult<Vec<Value>> {
    match read_json(path)? {
        Value::Array(arr) => Ok(arr),
        _ => Err(PrepError::Config(format!(
            "Expected a JSON array in {}",
            path.display()
        ))),
    }
}

/// Serialize fully, then write in one call. No fsync.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, data: &T) -> PrepResult<()> {
    let pretty = serde_json::to_string_pretty(data)?;
    fs::write(path, pretty)?;
    Ok(())
}

/// Display name used in diagnostics: the file name, or the full path if
/// there is none.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
