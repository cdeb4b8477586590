//! Ping from the device.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::convert::UNKNOWN_FLOAT;
use crate::driver::{Os10Driver, Session};
use crate::error::{Error, Result};

static TRANSMITTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+packets transmitted\S*\s+(\d+)\s+received")
        .expect("static ping summary pattern")
});

static RTT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rtt\s+min/avg/max/mdev\s+=\s+([\d.]+)/([\d.]+)/([\d.]+)/([\d.]+)")
        .expect("static ping rtt pattern")
});

static REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"bytes from ([^\s:]+).*?time=([\d.]+)").expect("static ping reply pattern")
});

/// Ping parameters; `None` leaves the device default.
#[derive(Debug, Clone, PartialEq)]
pub struct PingOptions {
    pub source: Option<String>,
    pub ttl: Option<u8>,
    pub timeout: Option<u32>,
    pub size: Option<u32>,
    pub count: Option<u32>,
    pub vrf: Option<String>,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            source: None,
            ttl: Some(255),
            timeout: Some(2),
            size: Some(100),
            count: Some(5),
            vrf: None,
        }
    }
}

impl PingOptions {
    /// The `ping` command line for `destination`.
    pub fn command(&self, destination: &str) -> String {
        let mut command = String::from("ping");
        if let Some(vrf) = self.vrf.as_deref().filter(|v| !v.is_empty()) {
            command.push_str(&format!(" vrf {vrf}"));
        }
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            command.push_str(&format!(" -I {source}"));
        }
        let flags = [
            ("-t", self.ttl.map(u32::from)),
            ("-W", self.timeout),
            ("-s", self.size),
            ("-c", self.count),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                command.push_str(&format!(" {flag} {value}"));
            }
        }
        command.push(' ');
        command.push_str(destination);
        command
    }
}

/// Outcome of a ping. Serialises as `{"success": {...}}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PingResult {
    Success(PingSuccess),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingSuccess {
    pub probes_sent: i64,
    pub packet_loss: i64,
    pub rtt_min: f64,
    pub rtt_max: f64,
    pub rtt_avg: f64,
    pub rtt_stddev: f64,
    pub results: Vec<PingProbe>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingProbe {
    pub ip_address: String,
    pub rtt: f64,
}

/// Parse the output of the Linux-style `ping` the device runs.
pub fn parse_ping(output: &str, destination: &str) -> PingResult {
    let Some(summary) = TRANSMITTED.captures(output) else {
        return PingResult::Error(output.trim().to_string());
    };
    let sent: i64 = summary[1].parse().unwrap_or_default();
    let received: i64 = summary[2].parse().unwrap_or_default();
    if received == 0 {
        return PingResult::Error(format!("{sent} packets transmitted, 0 received"));
    }

    let rtt = |i: usize| -> f64 {
        RTT.captures(output)
            .and_then(|c| c[i].parse().ok())
            .unwrap_or(UNKNOWN_FLOAT)
    };

    let mut results: Vec<PingProbe> = REPLY
        .captures_iter(output)
        .map(|c| PingProbe {
            ip_address: c[1].to_string(),
            rtt: c[2].parse().unwrap_or(UNKNOWN_FLOAT),
        })
        .collect();
    if results.is_empty() {
        results = (0..received)
            .map(|_| PingProbe {
                ip_address: destination.to_string(),
                rtt: UNKNOWN_FLOAT,
            })
            .collect();
    }

    PingResult::Success(PingSuccess {
        probes_sent: sent,
        packet_loss: sent - received,
        rtt_min: rtt(1),
        rtt_avg: rtt(2),
        rtt_max: rtt(3),
        rtt_stddev: rtt(4),
        results,
    })
}

impl<S: Session> Os10Driver<S> {
    /// Ping `destination` from the device.
    ///
    /// A rejected command comes back as [`PingResult::Error`] rather than an
    /// error, so callers can treat all failures alike.
    pub async fn ping(&mut self, destination: &str, options: &PingOptions) -> Result<PingResult> {
        let command = options.command(destination);
        match self.dispatch(&command).await {
            Ok(output) => Ok(parse_ping(&output, destination)),
            Err(Error::Command { command, output }) => {
                Ok(PingResult::Error(format!("command :: {command} :: {output}")))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::mock::MockSession;

    const OUTPUT: &str = "\
PING 10.0.0.2 (10.0.0.2) 100(128) bytes of data.
108 bytes from 10.0.0.2: icmp_seq=1 ttl=64 time=0.412 ms
108 bytes from 10.0.0.2: icmp_seq=2 ttl=64 time=0.388 ms

--- 10.0.0.2 ping statistics ---
3 packets transmitted, 2 received, 33% packet loss, time 2003ms
rtt min/avg/max/mdev = 0.388/0.400/0.412/0.012 ms";

    #[test]
    fn test_command() {
        let options = PingOptions {
            vrf: Some("management".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.command("10.0.0.2"),
            "ping vrf management -t 255 -W 2 -s 100 -c 5 10.0.0.2"
        );

        let bare = PingOptions {
            ttl: None,
            timeout: None,
            size: None,
            count: None,
            ..Default::default()
        };
        assert_eq!(bare.command("leaf2"), "ping leaf2");
    }

    #[test]
    fn test_parse_success() {
        let PingResult::Success(result) = parse_ping(OUTPUT, "10.0.0.2") else {
            panic!("expected success");
        };
        assert_eq!(result.probes_sent, 3);
        assert_eq!(result.packet_loss, 1);
        assert_eq!(result.rtt_min, 0.388);
        assert_eq!(result.rtt_avg, 0.400);
        assert_eq!(result.rtt_max, 0.412);
        assert_eq!(result.rtt_stddev, 0.012);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].ip_address, "10.0.0.2");
        assert_eq!(result.results[0].rtt, 0.412);
    }

    #[test]
    fn test_parse_all_lost() {
        let output = "5 packets transmitted, 0 received, 100% packet loss, time 4080ms";
        assert!(matches!(parse_ping(output, "10.0.0.9"), PingResult::Error(_)));
    }

    #[tokio::test]
    async fn test_rejected_command_is_error_result() {
        let options = PingOptions::default();
        let command = options.command("bogus");
        let session = MockSession::new().reply(&command, "% Error: Invalid host");
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let result = driver.ping("bogus", &options).await.unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["error"].as_str().unwrap().contains("% Error: Invalid host"));
    }
}
