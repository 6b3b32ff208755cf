#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Metric primitives and registry.
//!
//! Counters, gauges and histograms recorded by the executor and its
//! subscribers. This crate has no knowledge of execution events — those
//! live in `engine-events` — it is purely the numeric accounting layer.

pub mod metrics;

pub use metrics::{Counter, Gauge, Histogram, MetricsRegistry, NoopMetricsRegistry};
