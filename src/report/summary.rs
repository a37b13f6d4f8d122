//! One-line, human-readable summaries of finished tests.

use super::{Status, TestRecord, TestResult};

/// Format a result as a single line, e.g.
/// `Test ID 3 (src: 'localhost', dst: '10.0.0.1'): Success. Result: 941.20 Mbps, 10485760 bytes in 0.09s`.
pub fn format_summary(record: &TestRecord) -> String {
    match record {
        TestRecord::Latency(r) => {
            let m = &r.metrics;
            let detail = match (m.packets_sent, m.packets_received, m.packet_loss_percent) {
                (Some(tx), Some(rx), Some(loss)) => {
                    format!("{} / {} / {}%  (#tx/#rx/loss)", tx, rx, loss)
                }
                _ => "packet count data not found in ping output".to_string(),
            };
            with_header(
                r,
                format!(
                    "{} / {} / {} / {} ms  (min/avg/max/*dev), {}",
                    show(&m.min_rtt),
                    show(&m.avg_rtt),
                    show(&m.max_rtt),
                    show(&m.stddev_rtt),
                    detail
                ),
            )
        }
        TestRecord::Throughput(r) => {
            let m = &r.metrics;
            let speed = match m.bits_per_second.map(|bps| bps / 1_000_000.0) {
                Some(mbps) if mbps >= 1000.0 => format!("{:.2} Gbps", mbps / 1000.0),
                Some(mbps) => format!("{:.2} Mbps", mbps),
                None => "-".to_string(),
            };
            with_header(
                r,
                format!(
                    "{}, {} bytes in {}s",
                    speed,
                    show(&m.bytes),
                    show(&m.seconds)
                ),
            )
        }
        TestRecord::Jitter(r) => {
            let m = &r.metrics;
            with_header(
                r,
                format!(
                    "{} ms jitter; {} packets; {} lost",
                    show(&m.jitter_ms),
                    show(&m.packets),
                    show(&m.lost_packets)
                ),
            )
        }
    }
}

fn with_header<M>(r: &TestResult<M>, detail: String) -> String {
    let head = format!(
        "Test ID {} (src: '{}', dst: '{}')",
        r.id_number, r.source, r.destination
    );
    match (r.status, &r.error) {
        (Status::Success, _) => format!("{head}: Success. Result: {detail}"),
        (Status::Failure, Some(err)) => format!("{head}: Failure. {}", first_line(err)),
        (Status::Failure, None) => format!("{head}: Failure."),
    }
}

fn show<T: std::fmt::Display>(v: &Option<T>) -> String {
    v.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
}

fn first_line(s: &str) -> &str {
    s.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{JitterMetrics, LatencyMetrics, ThroughputMetrics};
    use chrono::Local;

    fn result<M>(metrics: M, status: Status, error: Option<&str>) -> TestResult<M> {
        TestResult {
            id_number: 7,
            timestamp: Local::now(),
            status,
            source: "probe-a".into(),
            destination: "10.0.0.1".into(),
            test_command: "true".into(),
            metrics,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_latency_summary() {
        let m = LatencyMetrics {
            min_rtt: Some("0.1".into()),
            avg_rtt: Some("0.2".into()),
            max_rtt: Some("0.3".into()),
            stddev_rtt: Some("0.05".into()),
            packets_sent: Some(10),
            packets_received: Some(8),
            packet_loss_percent: Some(20.0),
        };
        let s = format_summary(&TestRecord::Latency(result(m, Status::Success, None)));
        assert_eq!(
            s,
            "Test ID 7 (src: 'probe-a', dst: '10.0.0.1'): Success. Result: \
             0.1 / 0.2 / 0.3 / 0.05 ms  (min/avg/max/*dev), 10 / 8 / 20%  (#tx/#rx/loss)"
        );
    }

    #[test]
    fn test_throughput_summary_gbps() {
        let m = ThroughputMetrics {
            seconds: Some(1.5),
            bytes: Some(1_000_000_000),
            bits_per_second: Some(9_412_000_000.0),
        };
        let s = format_summary(&TestRecord::Throughput(result(m, Status::Success, None)));
        assert!(s.contains("9.41 Gbps"));
        assert!(s.contains("1000000000 bytes in 1.5s"));
    }

    #[test]
    fn test_failure_shows_first_error_line() {
        let s = format_summary(&TestRecord::Jitter(result(
            JitterMetrics::default(),
            Status::Failure,
            Some("\nssh: connect to host probe-a port 22: Connection timed out\nmore"),
        )));
        assert!(s.ends_with("Failure. ssh: connect to host probe-a port 22: Connection timed out"));
    }
}
