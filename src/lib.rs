//! nettest -- scripted latency, throughput and jitter tests.
//!
//! Reads a list of tests, runs each one locally or over ssh with `ping` or
//! `iperf3`, normalizes the tool output and writes one JSON results document.

pub mod batch;
pub mod config;
pub mod engine;
pub mod hosts;
pub mod probes;
pub mod report;

use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::engine::RunContext;
use crate::probes::CommandRunner;
use crate::report::{OutputPaths, ResultSet, TestRecord};

/// Run every test in `input` and write the results document.
///
/// Pre-flight failures (invalid rows, unknown source hosts) return an error
/// before anything executes, and no results file is written.
pub async fn run<R: CommandRunner>(
    ctx: &RunContext<R>,
    input: &Path,
    paths: &OutputPaths,
    on_result: impl FnMut(&TestRecord),
) -> Result<ResultSet> {
    info!(input = %input.display(), output = %paths.results.display(), "starting test run");

    let defs = batch::load_definitions(input)?;
    info!(rows = defs.len(), "read test definitions");

    let results = match ctx.run_batch(&defs, on_result).await {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "pre-flight checks failed; no tests were run");
            return Err(e.into());
        }
    };

    results.write_json(&paths.results)?;
    info!("test run complete");
    Ok(results)
}
