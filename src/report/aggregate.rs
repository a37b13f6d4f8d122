//! Result collections and the single JSON document written at the end of a run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use super::{JitterMetrics, LatencyMetrics, TestRecord, TestResult, ThroughputMetrics};

/// All results of a run, one ordered list per test type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub latency_tests: Vec<TestResult<LatencyMetrics>>,
    pub throughput_tests: Vec<TestResult<ThroughputMetrics>>,
    pub jitter_tests: Vec<TestResult<JitterMetrics>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the list for its type, keeping execution order.
    pub fn push(&mut self, record: TestRecord) {
        match record {
            TestRecord::Latency(r) => self.latency_tests.push(r),
            TestRecord::Throughput(r) => self.throughput_tests.push(r),
            TestRecord::Jitter(r) => self.jitter_tests.push(r),
        }
    }

    pub fn len(&self) -> usize {
        self.latency_tests.len() + self.throughput_tests.len() + self.jitter_tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize as 4-space indented JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write the whole document to `path`. Called once, after the batch.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        info!(path = %path.display(), results = self.len(), "results written");
        Ok(())
    }
}

/// Where a run writes its results and log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `<dir>/<stem>_<YYYYmmddHHMMSS>.json`
    pub results: PathBuf,
    /// `<dir>/<stem>.log`
    pub log: PathBuf,
}

/// Derive output file names from the input file name and the run start time.
pub fn output_paths(input: &Path, output_dir: &Path, started: DateTime<Local>) -> OutputPaths {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "nettest".to_string());
    let stamp = started.format("%Y%m%d%H%M%S");
    OutputPaths {
        results: output_dir.join(format!("{stem}_{stamp}.json")),
        log: output_dir.join(format!("{stem}.log")),
    }
}

/// The output directory must exist, be a directory and be writable.
pub fn check_output_dir(dir: &Path) -> Result<()> {
    let meta = std::fs::metadata(dir)
        .with_context(|| format!("output directory {} is not accessible", dir.display()))?;
    if !meta.is_dir() {
        bail!("output path {} is not a directory", dir.display());
    }
    if meta.permissions().readonly() {
        bail!("output directory {} is read-only", dir.display());
    }
    Ok(())
}
