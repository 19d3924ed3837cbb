//! Metric points in the push API's wire shape.

use serde::Serialize;

/// Reporting interval the sink assumes between pushes, in seconds.
pub const STEP_SECS: u64 = 60;

/// Prefix for every metric name.
pub const METRIC_PREFIX: &str = "mc";

/// Stats reported as point-in-time gauges. Everything else is a
/// monotonically increasing counter and gets the `_cps` suffix so the
/// sink applies rate handling.
const GAUGE_STATS: [&str; 15] = [
    "get_hit_ratio",
    "incr_hit_ratio",
    "decr_hit_ratio",
    "delete_hit_ratio",
    "usage",
    "curr_connections",
    "total_connections",
    "bytes",
    "pointer_size",
    "uptime",
    "limit_maxbytes",
    "threads",
    "curr_items",
    "total_items",
    "connection_structures",
];

/// How the sink should interpret a value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CounterType {
    Gauge,
    Counter,
}

/// One metric sample, serialized with exactly the field names the push
/// API expects.
#[derive(Debug, Clone, Serialize)]
pub struct MetricPoint {
    pub metric: String,
    pub endpoint: String,
    pub timestamp: u64,
    pub step: u64,
    pub value: f64,
    #[serde(rename = "counterType")]
    pub counter_type: CounterType,
    pub tags: String,
}

impl MetricPoint {
    /// Build the point for one stat of one instance.
    pub fn from_stat(name: &str, value: f64, endpoint: &str, port: u16, timestamp: u64) -> Self {
        let (suffix, counter_type) = if is_gauge(name) {
            ("", CounterType::Gauge)
        } else {
            ("_cps", CounterType::Counter)
        };
        Self {
            metric: format!("{METRIC_PREFIX}.{name}{suffix}"),
            endpoint: endpoint.to_string(),
            timestamp,
            step: STEP_SECS,
            value,
            counter_type,
            tags: format!("port={port}"),
        }
    }
}

fn is_gauge(name: &str) -> bool {
    GAUGE_STATS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_stat_keeps_name() {
        let point = MetricPoint::from_stat("usage", 50.0, "host-1", 11211, 1_700_000_000);
        assert_eq!(point.metric, "mc.usage");
        assert_eq!(point.counter_type, CounterType::Gauge);
    }

    #[test]
    fn counter_stat_gets_cps_suffix() {
        let point = MetricPoint::from_stat("cmd_get", 9000.0, "host-1", 11211, 1_700_000_000);
        assert_eq!(point.metric, "mc.cmd_get_cps");
        assert_eq!(point.counter_type, CounterType::Counter);
    }

    #[test]
    fn tags_encode_port() {
        let point = MetricPoint::from_stat("uptime", 1.0, "host-1", 11213, 0);
        assert_eq!(point.tags, "port=11213");
        assert_eq!(point.step, STEP_SECS);
    }

    #[test]
    fn wire_field_names() {
        let point = MetricPoint::from_stat("usage", 50.0, "host-1", 11211, 1_700_000_000);
        let json = serde_json::to_value(&point).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["counterType", "endpoint", "metric", "step", "tags", "timestamp", "value"]
        );
        assert_eq!(json["counterType"], "GAUGE");
    }

    #[test]
    fn counter_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&CounterType::Counter).unwrap(), "\"COUNTER\"");
    }
}
