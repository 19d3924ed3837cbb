//! The per-cycle collector: discover ports, poll each instance, emit
//! metric points.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use mcmon_proto::{Instance, ProtoResult};

use crate::discover;
use crate::normalize::normalize;
use crate::point::MetricPoint;

/// Drives one collection cycle across all discovered instances.
pub struct Collector {
    /// Host the instances listen on.
    host: String,
    /// Endpoint identity reported with every point.
    endpoint: String,
    /// Per-instance connect/read timeout.
    timeout: Duration,
}

impl Collector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            host: "localhost".to_string(),
            endpoint: local_hostname(),
            timeout,
        }
    }

    /// Discover instances and poll them all. `None` when no matching
    /// process exists — a legitimate state, logged as a warning.
    pub async fn collect(&self) -> Option<Vec<MetricPoint>> {
        let ports = discover::find_instances().await;
        if ports.is_empty() {
            warn!(bin = discover::BIN_NAME, "no matching process found");
            return None;
        }
        debug!(?ports, "listen ports found");
        Some(self.collect_ports(&ports).await)
    }

    /// Poll each port independently. A failed port is logged and
    /// skipped; the remaining ports still contribute their points.
    pub async fn collect_ports(&self, ports: &BTreeSet<u16>) -> Vec<MetricPoint> {
        let now = epoch_secs();
        let mut points = Vec::new();
        for &port in ports {
            match self.poll_port(port, now).await {
                Ok(mut instance_points) => points.append(&mut instance_points),
                Err(e) => warn!(port, error = %e, "instance stats query failed"),
            }
        }
        points
    }

    async fn poll_port(&self, port: u16, now: u64) -> ProtoResult<Vec<MetricPoint>> {
        let mut instance = Instance::new(self.host.as_str(), port, self.timeout);
        let result = instance.stats().await;
        // Close on every exit path; leaking connections across cycles
        // is a correctness bug.
        instance.close().await;

        let stats = normalize(result?);
        Ok(stats
            .iter()
            .map(|(name, value)| {
                MetricPoint::from_stat(name, value.as_f64(), &self.endpoint, port, now)
            })
            .collect())
    }
}

/// Local host identity for the `endpoint` field.
fn local_hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::CounterType;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FULL_STATS: &str = concat!(
        "STAT pid 123\r\n",
        "STAT time 1700000000\r\n",
        "STAT uptime 4000\r\n",
        "STAT bytes 50\r\n",
        "STAT limit_maxbytes 100\r\n",
        "STAT cmd_get 9000\r\n",
        "STAT get_hits 3\r\n",
        "STAT get_misses 1\r\n",
        "STAT incr_hits 0\r\n",
        "STAT incr_misses 0\r\n",
        "STAT decr_hits 0\r\n",
        "STAT decr_misses 0\r\n",
        "STAT delete_hits 0\r\n",
        "STAT delete_misses 0\r\n",
        "END\r\n",
    );

    fn test_collector() -> Collector {
        Collector {
            host: "127.0.0.1".to_string(),
            endpoint: "test-host".to_string(),
            timeout: Duration::from_millis(500),
        }
    }

    /// Fake instance answering `stats` with the given response, then
    /// closing on the next command.
    async fn fake_instance(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut chunk = [0u8; 1024];
            let _ = socket.read(&mut chunk).await;
            let _ = socket.write_all(response.as_bytes()).await;
        });
        port
    }

    #[tokio::test]
    async fn healthy_instance_yields_normalized_points() {
        let collector = test_collector();
        let port = fake_instance(FULL_STATS).await;

        let points = collector.collect_ports(&BTreeSet::from([port])).await;

        // 12 surviving raw stats (pid/time dropped) + usage + 4 ratios.
        assert_eq!(points.len(), 17);
        assert!(points.iter().all(|p| p.endpoint == "test-host"));
        assert!(points.iter().all(|p| p.tags == format!("port={port}")));

        let usage = points.iter().find(|p| p.metric == "mc.usage").unwrap();
        assert_eq!(usage.value, 50.0);
        assert_eq!(usage.counter_type, CounterType::Gauge);

        let cmd_get = points.iter().find(|p| p.metric == "mc.cmd_get_cps").unwrap();
        assert_eq!(cmd_get.counter_type, CounterType::Counter);

        assert!(!points.iter().any(|p| p.metric.starts_with("mc.pid")));
        assert!(!points.iter().any(|p| p.metric == "mc.time_cps"));
    }

    #[tokio::test]
    async fn failed_port_does_not_abort_others() {
        let collector = test_collector();
        let good = fake_instance(FULL_STATS).await;

        // Hangs up before the sentinel.
        let bad = fake_instance("STAT pid 1\r\n").await;

        // Nothing listening at all.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let refused = listener.local_addr().unwrap().port();
        drop(listener);

        let ports = BTreeSet::from([good, bad, refused]);
        let points = collector.collect_ports(&ports).await;

        assert_eq!(points.len(), 17);
        assert!(points.iter().all(|p| p.tags == format!("port={good}")));
    }

    #[tokio::test]
    async fn missing_required_stats_pass_through() {
        let collector = test_collector();
        // No hit/miss pairs: normalization degrades to pass-through,
        // so pid/time stay and become counter points.
        let port = fake_instance("STAT pid 123\r\nSTAT uptime 4000\r\nEND\r\n").await;

        let points = collector.collect_ports(&BTreeSet::from([port])).await;

        assert_eq!(points.len(), 2);
        assert!(points.iter().any(|p| p.metric == "mc.pid_cps"));
        assert!(points.iter().any(|p| p.metric == "mc.uptime"));
    }

    #[tokio::test]
    async fn all_points_share_one_timestamp() {
        let collector = test_collector();
        let a = fake_instance(FULL_STATS).await;
        let b = fake_instance(FULL_STATS).await;

        let points = collector.collect_ports(&BTreeSet::from([a, b])).await;
        assert_eq!(points.len(), 34);
        let first = points[0].timestamp;
        assert!(points.iter().all(|p| p.timestamp == first));
    }
}
