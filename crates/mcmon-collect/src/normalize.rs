//! Stat normalization — derived ratios, identity-field removal.

use thiserror::Error;
use tracing::warn;

use mcmon_proto::{RawStats, StatValue};

/// Errors that can occur while deriving monitoring stats.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("required stat missing: {0}")]
    MissingStat(String),
}

/// The four hit-ratio fields and their hit/miss source keys.
const RATIO_PAIRS: [(&str, &str, &str); 4] = [
    ("get_hit_ratio", "get_hits", "get_misses"),
    ("incr_hit_ratio", "incr_hits", "incr_misses"),
    ("decr_hit_ratio", "decr_hits", "decr_misses"),
    ("delete_hit_ratio", "delete_hits", "delete_misses"),
];

/// Turn a raw stat map into a monitoring-ready one: drop the `pid` and
/// `time` identity fields, add `usage` and the four `*_hit_ratio`
/// fields.
///
/// If any required source key is absent, the failure is logged and the
/// input is returned unmodified — never a partial computation. Callers
/// proceed with whatever is present.
pub fn normalize(stats: RawStats) -> RawStats {
    match derive(&stats) {
        Ok(derived) => {
            let mut out = stats;
            out.remove("pid");
            out.remove("time");
            for (name, value) in derived {
                out.insert(name, StatValue::Float(value));
            }
            out
        }
        Err(e) => {
            warn!(error = %e, "stats normalization failed, passing raw stats through");
            stats
        }
    }
}

fn derive(stats: &RawStats) -> Result<Vec<(&'static str, f64)>, NormalizeError> {
    let bytes = required(stats, "bytes")?;
    let limit = required(stats, "limit_maxbytes")?;
    let usage = if limit == 0.0 { 0.0 } else { 100.0 * bytes / limit };

    let mut derived = vec![("usage", usage)];
    for (name, hits_key, misses_key) in RATIO_PAIRS {
        let hits = required(stats, hits_key)?;
        let misses = required(stats, misses_key)?;
        let denom = hits + misses;
        let ratio = if denom == 0.0 { 0.0 } else { 100.0 * hits / denom };
        derived.push((name, ratio));
    }
    Ok(derived)
}

fn required(stats: &RawStats, name: &str) -> Result<f64, NormalizeError> {
    stats
        .get(name)
        .map(StatValue::as_f64)
        .ok_or_else(|| NormalizeError::MissingStat(name.to_string()))
}
