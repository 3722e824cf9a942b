use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

/// Send `Info` and above to `<log_dir>/<tool>_<timestamp>.log`.
pub fn init(log_dir: &Path, tool: &str) -> anyhow::Result<PathBuf> {
    create_dir_all(log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("{tool}_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    Ok(log_path)
}
