//! mcmon-collect — one collection cycle over all local memcached instances.
//!
//! # Architecture
//!
//! ```text
//! Collector
//!   ├── discover::find_instances() → listening ports from the process table
//!   ├── per port: Instance::stats() → normalize() → MetricPoints
//!   └── collect() → all instances' points, failures skipped per port
//! ```
//!
//! Failure posture: a port that refuses, times out, or talks garbage is
//! logged and skipped; a stat map missing required keys passes through
//! un-normalized. A half-successful cycle beats no metrics at all.

pub mod collector;
pub mod discover;
pub mod normalize;
pub mod point;

pub use collector::Collector;
pub use normalize::{NormalizeError, normalize};
pub use point::{CounterType, MetricPoint};
