//! iperf3 `--json` output parsing.
//!
//! Some iperf3 versions exit 0 after a logical failure (e.g. connection
//! refused) and report it only through the top-level `error` key, so that key
//! is checked before anything else.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IperfParseError {
    #[error("iperf3 output is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The tool's own error text, verbatim.
    #[error("{0}")]
    Reported(String),

    #[error("iperf3 output has no '{0}' section")]
    MissingSection(&'static str),
}

/// Parsed iperf3 JSON document (subset of fields we care about).
#[derive(Debug, Deserialize)]
pub struct Iperf3Result {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub end: Option<Iperf3End>,
}

#[derive(Debug, Deserialize)]
pub struct Iperf3End {
    /// TCP totals as seen by the sender.
    #[serde(default)]
    pub sum_sent: Option<Iperf3TcpSum>,
    /// UDP totals.
    #[serde(default)]
    pub sum: Option<Iperf3UdpSum>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Iperf3TcpSum {
    pub seconds: f64,
    pub bytes: u64,
    pub bits_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Iperf3UdpSum {
    pub jitter_ms: f64,
    pub packets: u64,
    pub lost_packets: u64,
}

/// Decode the document and surface a tool-reported error.
pub fn parse_output(json_str: &str) -> Result<Iperf3End, IperfParseError> {
    let result: Iperf3Result = serde_json::from_str(json_str)?;
    if let Some(error) = result.error {
        return Err(IperfParseError::Reported(error));
    }
    result.end.ok_or(IperfParseError::MissingSection("end"))
}

/// Totals for a TCP throughput test, from `end.sum_sent`.
pub fn parse_throughput(json_str: &str) -> Result<Iperf3TcpSum, IperfParseError> {
    parse_output(json_str)?
        .sum_sent
        .ok_or(IperfParseError::MissingSection("end.sum_sent"))
}

/// Totals for a UDP jitter test, from `end.sum`.
pub fn parse_jitter(json_str: &str) -> Result<Iperf3UdpSum, IperfParseError> {
    parse_output(json_str)?
        .sum
        .ok_or(IperfParseError::MissingSection("end.sum"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP: &str = r#"{
        "start": {"test_start": {"protocol": "TCP", "num_streams": 1, "bytes": 10485760}},
        "intervals": [],
        "end": {
            "sum_sent": {"start": 0, "end": 0.87, "seconds": 0.87, "bytes": 10485760,
                         "bits_per_second": 96418520.5, "retransmits": 0},
            "sum_received": {"start": 0, "end": 0.88, "seconds": 0.88, "bytes": 10485760,
                             "bits_per_second": 95322400.1}
        }
    }"#;

    const UDP: &str = r#"{
        "start": {"test_start": {"protocol": "UDP"}},
        "end": {
            "sum": {"start": 0, "end": 10.0, "seconds": 10.0, "bytes": 1310720,
                    "bits_per_second": 1048576.0, "jitter_ms": 0.0123,
                    "lost_packets": 3, "packets": 906, "lost_percent": 0.33}
        }
    }"#;

    #[test]
    fn test_parse_tcp_sum_sent() {
        let sum = parse_throughput(TCP).unwrap();
        assert_eq!(sum.seconds, 0.87);
        assert_eq!(sum.bytes, 10_485_760);
        assert_eq!(sum.bits_per_second, 96_418_520.5);
    }

    #[test]
    fn test_parse_udp_sum() {
        let sum = parse_jitter(UDP).unwrap();
        assert_eq!(sum.jitter_ms, 0.0123);
        assert_eq!(sum.packets, 906);
        assert_eq!(sum.lost_packets, 3);
    }

    #[test]
    fn test_reported_error_wins_over_fields() {
        let out = r#"{"start": {}, "intervals": [], "end": {},
                      "error": "error - unable to connect to server: Connection refused"}"#;
        match parse_throughput(out) {
            Err(IperfParseError::Reported(msg)) => {
                assert_eq!(msg, "error - unable to connect to server: Connection refused")
            }
            other => panic!("expected reported error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        assert!(matches!(
            parse_jitter("iperf3: error - the server is busy"),
            Err(IperfParseError::Decode(_))
        ));
    }

    #[test]
    fn test_udp_document_has_no_tcp_sum() {
        assert!(matches!(
            parse_throughput(UDP),
            Err(IperfParseError::MissingSection("end.sum_sent"))
        ));
        assert!(matches!(
            parse_jitter("{}"),
            Err(IperfParseError::MissingSection("end"))
        ));
    }
}
