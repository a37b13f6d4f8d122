//! Normalized test results and the run's output document.

pub mod aggregate;
pub mod summary;

pub use self::aggregate::{check_output_dir, output_paths, OutputPaths, ResultSet};
pub use self::summary::format_summary;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::probes::iperf::{Iperf3TcpSum, Iperf3UdpSum};
use crate::probes::ping::{PacketCounts, RttStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

/// One executed test. `M` is the metrics shape of its test type, flattened
/// into the record when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult<M> {
    pub id_number: u32,
    pub timestamp: DateTime<Local>,
    pub status: Status,
    pub source: String,
    pub destination: String,
    pub test_command: String,
    #[serde(flatten)]
    pub metrics: M,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyMetrics {
    pub min_rtt: Option<String>,
    pub avg_rtt: Option<String>,
    pub max_rtt: Option<String>,
    pub stddev_rtt: Option<String>,
    pub packets_sent: Option<u32>,
    pub packets_received: Option<u32>,
    pub packet_loss_percent: Option<f64>,
}

impl LatencyMetrics {
    pub fn new(rtt: RttStats, counts: Option<PacketCounts>) -> Self {
        Self {
            min_rtt: Some(rtt.min),
            avg_rtt: Some(rtt.avg),
            max_rtt: Some(rtt.max),
            stddev_rtt: Some(rtt.stddev),
            packets_sent: counts.as_ref().map(|c| c.transmitted),
            packets_received: counts.as_ref().map(|c| c.received),
            packet_loss_percent: counts.map(|c| c.loss_percent),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThroughputMetrics {
    pub seconds: Option<f64>,
    pub bytes: Option<u64>,
    pub bits_per_second: Option<f64>,
}

impl From<Iperf3TcpSum> for ThroughputMetrics {
    fn from(sum: Iperf3TcpSum) -> Self {
        Self {
            seconds: Some(sum.seconds),
            bytes: Some(sum.bytes),
            bits_per_second: Some(sum.bits_per_second),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JitterMetrics {
    pub jitter_ms: Option<f64>,
    pub packets: Option<u64>,
    pub lost_packets: Option<u64>,
}

impl From<Iperf3UdpSum> for JitterMetrics {
    fn from(sum: Iperf3UdpSum) -> Self {
        Self {
            jitter_ms: Some(sum.jitter_ms),
            packets: Some(sum.packets),
            lost_packets: Some(sum.lost_packets),
        }
    }
}

/// A finished test, tagged with the collection it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum TestRecord {
    Latency(TestResult<LatencyMetrics>),
    Throughput(TestResult<ThroughputMetrics>),
    Jitter(TestResult<JitterMetrics>),
}

impl TestRecord {
    pub fn id_number(&self) -> u32 {
        match self {
            TestRecord::Latency(r) => r.id_number,
            TestRecord::Throughput(r) => r.id_number,
            TestRecord::Jitter(r) => r.id_number,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            TestRecord::Latency(r) => r.status,
            TestRecord::Throughput(r) => r.status,
            TestRecord::Jitter(r) => r.status,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TestRecord::Latency(r) => r.error.as_deref(),
            TestRecord::Throughput(r) => r.error.as_deref(),
            TestRecord::Jitter(r) => r.error.as_deref(),
        }
    }
}
