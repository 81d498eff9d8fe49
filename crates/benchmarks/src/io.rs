//! I/O operations for dumps, runs and reports.
//!
//! This module reads and writes benchmark history files and report
//! outputs on the filesystem.

use benchtrack_core::BenchmarkRun;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dump::BenchmarkData;
use crate::error::Result;

/// Read a `data.js` (or plain JSON) dump.
pub fn read_dump(path: impl AsRef<Path>) -> Result<BenchmarkData> {
    let content = fs::read_to_string(path)?;
    BenchmarkData::parse(&content)
}

/// Write a dump as `data.js`, creating parent directories.
pub fn write_dump(data: &BenchmarkData, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, data.to_data_js()?)?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RunFile {
    One(BenchmarkRun),
    Many(Vec<BenchmarkRun>),
}

/// Read runs from a JSON file holding either one run or an array of runs.
pub fn read_runs(path: impl AsRef<Path>) -> Result<Vec<BenchmarkRun>> {
    let content = fs::read_to_string(path)?;
    Ok(match serde_json::from_str::<RunFile>(&content)? {
        RunFile::One(run) => vec![run],
        RunFile::Many(runs) => runs,
    })
}

/// Write any serializable report as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Write a markdown report.
pub fn write_markdown(content: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, content)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
