//! Whole-batch validation. One bad row rejects the batch; every problem found
//! is reported, not just the first.

use std::collections::HashMap;
use std::net::Ipv6Addr;

use thiserror::Error;

use super::{TestDefinition, TestKind, TestSpec, TestType, TransferSize};
use crate::config::ProbeConfig;

/// A single problem with a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_ref}: {reason}")]
pub struct ValidationError {
    pub line_ref: usize,
    pub reason: String,
}

/// Every problem found in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid test definition(s): {}", .0.len(), join(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a batch and turn it into typed specs, preserving input order.
pub fn validate(
    batch: &[TestDefinition],
    defaults: &ProbeConfig,
) -> Result<Vec<TestSpec>, ValidationErrors> {
    let mut errors = Vec::new();
    let mut specs = Vec::with_capacity(batch.len());
    let mut seen_ids: HashMap<u32, usize> = HashMap::new();

    for def in batch {
        let mut fail = |reason: String| {
            errors.push(ValidationError {
                line_ref: def.line_ref,
                reason,
            })
        };

        let id_number = match required(&def.id_number) {
            None => {
                fail("missing id_number".into());
                None
            }
            Some(raw) => match raw.parse::<u32>() {
                Ok(id) if id > 0 => Some(id),
                _ => {
                    fail(format!("id_number '{raw}' is not a positive integer"));
                    None
                }
            },
        };

        if let Some(id) = id_number {
            if let Some(first_line) = seen_ids.get(&id) {
                fail(format!(
                    "duplicate id_number {id} (first used on line {first_line})"
                ));
            } else {
                seen_ids.insert(id, def.line_ref);
            }
        }

        let test_type = match required(&def.test_type) {
            None => {
                fail("missing test_type".into());
                None
            }
            Some(raw) => {
                let parsed = TestType::parse(raw);
                if parsed.is_none() {
                    fail(format!(
                        "unknown test_type '{raw}' (expected latency, throughput or jitter)"
                    ));
                }
                parsed
            }
        };

        let source = required(&def.source);
        match source {
            None => fail("missing source".into()),
            Some(host) => {
                if let Err(reason) = check_host(host) {
                    fail(format!("invalid source host '{host}': {reason}"));
                }
            }
        }
        let destination = required(&def.destination);
        match destination {
            None => fail("missing destination".into()),
            Some(host) => {
                if let Err(reason) = check_host(host) {
                    fail(format!("invalid destination host '{host}': {reason}"));
                }
            }
        }

        let kind = match test_type {
            None => None,
            Some(TestType::Latency) => {
                let count = number_or(&def.count, "count", defaults.default_count, 1, &mut fail);
                let size = number_or(&def.size, "size", defaults.default_size, 0, &mut fail);
                match (count, size) {
                    (Some(count), Some(size)) => Some(TestKind::Latency { count, size }),
                    _ => None,
                }
            }
            Some(TestType::Throughput) => match required(&def.size) {
                None => {
                    fail("size is required for throughput tests".into());
                    None
                }
                Some(raw) => match TransferSize::parse(raw) {
                    Some(size) => Some(TestKind::Throughput { size }),
                    None => {
                        fail(format!(
                            "size '{raw}' is not a byte count (digits with optional K/M/G/T suffix)"
                        ));
                        None
                    }
                },
            },
            Some(TestType::Jitter) => Some(TestKind::Jitter),
        };

        if let (Some(ty @ (TestType::Throughput | TestType::Jitter)), Some(host)) =
            (test_type, destination)
        {
            if is_ipv6_literal(host) {
                fail(format!(
                    "{ty} tests run iperf3 over IPv4; IPv6 destination '{host}' is not supported"
                ));
            }
        }

        if let (Some(id_number), Some(source), Some(destination), Some(kind)) =
            (id_number, source, destination, kind)
        {
            specs.push(TestSpec {
                id_number,
                source: source.to_string(),
                destination: destination.to_string(),
                kind,
                line_ref: def.line_ref,
            });
        }
    }

    if errors.is_empty() {
        Ok(specs)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn number_or(
    value: &Option<String>,
    field: &str,
    default: u32,
    min: u32,
    fail: &mut impl FnMut(String),
) -> Option<u32> {
    match required(value) {
        None => Some(default),
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n >= min => Some(n),
            _ if min > 0 => {
                fail(format!("{field} '{raw}' is not a positive integer"));
                None
            }
            _ => {
                fail(format!("{field} '{raw}' is not a non-negative integer"));
                None
            }
        },
    }
}

/// Check that `host` is a plain hostname or address safe to put on a command
/// line: letters, digits, `.`, `-`, `_` and `:`, not starting with `-`. An
/// IPv6 literal may carry a `%zone` suffix.
pub fn check_host(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("empty");
    }
    if host.starts_with('-') {
        return Err("starts with a hyphen");
    }
    let (addr, zone) = match host.split_once('%') {
        Some((addr, zone)) => (addr, Some(zone)),
        None => (host, None),
    };
    if addr
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_' | ':'))
    {
        return Err("contains characters other than letters, digits, '.', '-', '_' or ':'");
    }
    if let Some(zone) = zone {
        if addr.parse::<Ipv6Addr>().is_err() {
            return Err("a '%' zone id is only allowed after an IPv6 address");
        }
        if zone.is_empty()
            || zone
                .chars()
                .any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
        {
            return Err("zone id must be letters, digits, '.', '-' or '_'");
        }
    }
    Ok(())
}

fn is_ipv6_literal(host: &str) -> bool {
    let addr = host.split_once('%').map_or(host, |(addr, _)| addr);
    addr.parse::<Ipv6Addr>().is_ok()
}
