//! mcmon-push — HTTP push transport for metric points.
//!
//! Serializes a point list and POSTs it to the configured sink URL.
//! Strictly fire-and-forget: no retries, and every failure is logged
//! with the payload size, never propagated. The agent's availability
//! must exceed its correctness.

pub mod client;

pub use client::push;
