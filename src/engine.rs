//! Batch execution: pre-flight checks, then each test in input order.

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::batch::{self, TestDefinition, TestKind, TestSpec, ValidationErrors};
use crate::config::RunConfig;
use crate::hosts::{HostRegistry, LocalIdentity, LookupError};
use crate::probes::{self, iperf, ping, CommandContext, CommandRunner};
use crate::report::{
    JitterMetrics, LatencyMetrics, ResultSet, Status, TestRecord, TestResult, ThroughputMetrics,
};

/// Problems that stop a run before any test is started.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Everything a run needs, passed explicitly to each stage.
pub struct RunContext<R> {
    pub identity: LocalIdentity,
    pub registry: HostRegistry,
    pub config: RunConfig,
    pub runner: R,
}

impl<R: CommandRunner> RunContext<R> {
    pub fn new(identity: LocalIdentity, registry: HostRegistry, config: RunConfig, runner: R) -> Self {
        Self {
            identity,
            registry,
            config,
            runner,
        }
    }

    fn command_context(&self) -> CommandContext<'_> {
        CommandContext {
            identity: &self.identity,
            registry: &self.registry,
            probes: &self.config.probes,
            remote: &self.config.remote,
        }
    }

    /// Validate the batch and check every source against the registry.
    pub fn preflight(&self, defs: &[TestDefinition]) -> Result<Vec<TestSpec>, PreflightError> {
        let specs = batch::validate(defs, &self.config.probes)?;
        debug!(tests = specs.len(), "test definitions validated");

        self.registry
            .check_sources(specs.iter().map(|s| s.source.as_str()))?;
        info!("all source hosts are present in the host registry");
        Ok(specs)
    }

    /// Run a whole batch. Nothing executes unless pre-flight passes; after
    /// that, a failing test never stops the ones after it.
    pub async fn run_batch(
        &self,
        defs: &[TestDefinition],
        mut on_result: impl FnMut(&TestRecord),
    ) -> Result<ResultSet, PreflightError> {
        let specs = self.preflight(defs)?;

        let mut results = ResultSet::new();
        for spec in &specs {
            let record = self.run_test(spec).await;
            on_result(&record);
            results.push(record);
        }
        info!(tests = results.len(), "all tests have been run");
        Ok(results)
    }

    /// Build, execute and parse one test. Always yields a record.
    pub async fn run_test(&self, spec: &TestSpec) -> TestRecord {
        let id = spec.id_number;
        debug!(id, kind = %spec.kind.type_name(), "test pending");

        let (command, executed, started) = match probes::build_command(spec, self.command_context()) {
            Ok(command) => {
                let started = Local::now();
                info!(id, command = %command, "test running");
                let executed = self.execute(id, &command).await;
                (command, executed, started)
            }
            Err(e) => {
                error!(id, error = %e, "could not build test command");
                (String::new(), Err(e.to_string()), Local::now())
            }
        };

        let record = match &spec.kind {
            TestKind::Latency { .. } => TestRecord::Latency(finish(
                spec,
                started,
                command,
                executed.and_then(|out| parse_latency(id, &out)),
            )),
            TestKind::Throughput { .. } => TestRecord::Throughput(finish(
                spec,
                started,
                command,
                executed.and_then(|out| {
                    iperf::parse_throughput(&out)
                        .map(ThroughputMetrics::from)
                        .map_err(|e| parse_failed(id, e, &out))
                }),
            )),
            TestKind::Jitter => TestRecord::Jitter(finish(
                spec,
                started,
                command,
                executed.and_then(|out| {
                    iperf::parse_jitter(&out)
                        .map(JitterMetrics::from)
                        .map_err(|e| parse_failed(id, e, &out))
                }),
            )),
        };

        match record.status() {
            Status::Success => info!(id, "test succeeded"),
            Status::Failure => warn!(id, error = record.error().unwrap_or_default(), "test failed"),
        }
        record
    }

    /// Ok(output) on a zero exit; otherwise the text to record as the error.
    async fn execute(&self, id: u32, command: &str) -> Result<String, String> {
        match self.runner.run(command).await {
            Ok(outcome) if outcome.success() => Ok(outcome.output),
            Ok(outcome) => {
                error!(
                    id,
                    command,
                    exit_code = ?outcome.exit_code,
                    output = %outcome.output,
                    "test command failed"
                );
                if outcome.output.trim().is_empty() {
                    Err(match outcome.exit_code {
                        Some(code) => format!("command exited with status {code}"),
                        None => "command terminated by signal".to_string(),
                    })
                } else {
                    Err(outcome.output)
                }
            }
            Err(e) => {
                error!(id, command, error = %e, "test command could not be started");
                Err(format!("{e:#}"))
            }
        }
    }
}

/// RTT problems fail the test; a missing or odd packet-loss line only
/// leaves the counters empty.
fn parse_latency(id: u32, output: &str) -> Result<LatencyMetrics, String> {
    let rtt = ping::parse_rtt(output).map_err(|e| parse_failed(id, e, output))?;
    let counts = match ping::parse_packet_counts(output) {
        Ok(counts) => Some(counts),
        Err(e) => {
            warn!(
                id,
                error = %e,
                output,
                "recording RTT results without packet counts"
            );
            None
        }
    };
    Ok(LatencyMetrics::new(rtt, counts))
}

fn parse_failed(id: u32, e: impl std::fmt::Display, output: &str) -> String {
    error!(id, error = %e, output, "could not parse test output");
    e.to_string()
}

fn finish<M: Default>(
    spec: &TestSpec,
    timestamp: DateTime<Local>,
    test_command: String,
    outcome: Result<M, String>,
) -> TestResult<M> {
    let (status, metrics, error) = match outcome {
        Ok(metrics) => (Status::Success, metrics, None),
        Err(error) => (Status::Failure, M::default(), Some(error)),
    };
    TestResult {
        id_number: spec.id_number,
        timestamp,
        status,
        source: spec.source.clone(),
        destination: spec.destination.clone(),
        test_command,
        metrics,
        error,
    }
}
