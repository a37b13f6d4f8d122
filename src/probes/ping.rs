//! ping output parsing.
//!
//! Handles the summary lines printed by iputils (Linux), BSD/macOS and
//! BusyBox ping:
//!
//! ```text
//! 10 packets transmitted, 10 received, 0% packet loss, time 1804ms
//! rtt min/avg/max/mdev = 0.031/0.046/0.062/0.010 ms
//!
//! 10 packets transmitted, 10 packets received, 0.0% packet loss
//! round-trip min/avg/max/stddev = 0.053/0.154/0.243/0.063 ms
//! ```

use thiserror::Error;

const RTT_MARKER: &str = "min/avg/max";
const LOSS_MARKER: &str = "packet loss";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingParseError {
    #[error("no line containing 'min/avg/max' in ping output")]
    NoSummary,

    #[error("{0} lines containing 'min/avg/max' in ping output; refusing to guess")]
    AmbiguousSummary(usize),

    #[error("malformed round-trip summary: {0}")]
    MalformedSummary(String),

    #[error("no line containing 'packet loss' in ping output")]
    NoLossLine,

    #[error("malformed packet loss line: {0}")]
    MalformedLossLine(String),
}

/// Round-trip statistics in milliseconds, kept as the tool printed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RttStats {
    pub min: String,
    pub avg: String,
    pub max: String,
    pub stddev: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketCounts {
    pub transmitted: u32,
    pub received: u32,
    /// `(tx - rx) / tx * 100`, rounded to 4 decimal places.
    pub loss_percent: f64,
}

/// Extract min/avg/max/stddev from the single round-trip summary line.
pub fn parse_rtt(output: &str) -> Result<RttStats, PingParseError> {
    let lines: Vec<&str> = output.lines().filter(|l| l.contains(RTT_MARKER)).collect();
    let line = match lines.as_slice() {
        [] => return Err(PingParseError::NoSummary),
        [line] => line.trim(),
        many => return Err(PingParseError::AmbiguousSummary(many.len())),
    };
    let malformed = || PingParseError::MalformedSummary(line.to_string());

    // "round-trip min/avg/max/stddev = 0.053/0.154/0.243/0.063 ms"
    let (_, values) = line.split_once('=').ok_or_else(malformed)?;
    let values = values.split_whitespace().next().ok_or_else(malformed)?;

    let fields: Vec<&str> = values.split('/').collect();
    let [min, avg, max, stddev] = fields.as_slice() else {
        return Err(malformed());
    };
    if [min, avg, max, stddev]
        .iter()
        .any(|v| v.parse::<f64>().map_or(true, |n| !n.is_finite()))
    {
        return Err(malformed());
    }

    Ok(RttStats {
        min: min.to_string(),
        avg: avg.to_string(),
        max: max.to_string(),
        stddev: stddev.to_string(),
    })
}

/// Extract transmitted/received counts from the packet loss line and compute
/// the loss percentage locally. The tool's own percentage is ignored because
/// its wording and rounding differ between platforms.
pub fn parse_packet_counts(output: &str) -> Result<PacketCounts, PingParseError> {
    let line = output
        .lines()
        .find(|l| l.contains(LOSS_MARKER))
        .ok_or(PingParseError::NoLossLine)?
        .trim();
    let malformed = || PingParseError::MalformedLossLine(line.to_string());

    // "10 packets transmitted, 8 received, +1 duplicates, 20% packet loss"
    let mut segments = line.split(',').map(str::trim);
    let mut leading_int = || -> Result<u32, PingParseError> {
        segments
            .next()
            .and_then(|seg| seg.split_whitespace().next())
            .and_then(|n| n.parse().ok())
            .ok_or_else(malformed)
    };
    let transmitted = leading_int()?;
    let received = leading_int()?;

    if transmitted == 0 {
        return Err(malformed());
    }

    Ok(PacketCounts {
        transmitted,
        received,
        loss_percent: loss_percent(transmitted, received),
    })
}

/// `round(((tx - rx) / tx) * 100, 4)`.
pub fn loss_percent(transmitted: u32, received: u32) -> f64 {
    let tx = f64::from(transmitted);
    let rx = f64::from(received);
    let pct = (tx - rx) / tx * 100.0;
    (pct * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX: &str = "\
PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.
64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.031 ms
64 bytes from 10.0.0.1: icmp_seq=2 ttl=64 time=0.062 ms

--- 10.0.0.1 ping statistics ---
10 packets transmitted, 8 received, 20% packet loss, time 1804ms
rtt min/avg/max/mdev = 0.031/0.046/0.062/0.010 ms
";

    #[test]
    fn test_parse_linux_rtt() {
        let rtt = parse_rtt(LINUX).unwrap();
        assert_eq!(rtt.min, "0.031");
        assert_eq!(rtt.avg, "0.046");
        assert_eq!(rtt.max, "0.062");
        assert_eq!(rtt.stddev, "0.010");
    }

    #[test]
    fn test_parse_linux_counts() {
        let counts = parse_packet_counts(LINUX).unwrap();
        assert_eq!(counts.transmitted, 10);
        assert_eq!(counts.received, 8);
        assert_eq!(counts.loss_percent, 20.0);
    }

    #[test]
    fn test_no_summary() {
        assert_eq!(
            parse_rtt("ping: unknown host nowhere\n"),
            Err(PingParseError::NoSummary)
        );
    }

    #[test]
    fn test_two_summaries_are_ambiguous() {
        let out = "rtt min/avg/max/mdev = 1/2/3/4 ms\nrtt min/avg/max/mdev = 1/2/3/4 ms\n";
        assert_eq!(parse_rtt(out), Err(PingParseError::AmbiguousSummary(2)));
    }

    #[test]
    fn test_summary_without_four_values_is_malformed() {
        let out = "round-trip min/avg/max = 0.1/0.2/0.3 ms\n";
        assert!(matches!(
            parse_rtt(out),
            Err(PingParseError::MalformedSummary(_))
        ));
        assert!(matches!(
            parse_rtt("min/avg/max without equals\n"),
            Err(PingParseError::MalformedSummary(_))
        ));
        assert!(matches!(
            parse_rtt("rtt min/avg/max/mdev = a/b/c/d ms\n"),
            Err(PingParseError::MalformedSummary(_))
        ));
    }

    #[test]
    fn test_missing_loss_line() {
        assert_eq!(
            parse_packet_counts("rtt min/avg/max/mdev = 1/2/3/4 ms\n"),
            Err(PingParseError::NoLossLine)
        );
    }

    #[test]
    fn test_zero_transmitted_is_malformed() {
        assert!(matches!(
            parse_packet_counts("0 packets transmitted, 0 received, 0% packet loss\n"),
            Err(PingParseError::MalformedLossLine(_))
        ));
    }

    #[test]
    fn test_loss_percent_rounding() {
        assert_eq!(loss_percent(10, 8), 20.0);
        assert_eq!(loss_percent(3, 2), 33.3333);
        assert_eq!(loss_percent(7, 7), 0.0);
        assert_eq!(loss_percent(3, 0), 100.0);
    }
}
