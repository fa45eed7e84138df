//! Renders nested server statistics snapshots in the Prometheus exposition format.
//!
//! A [`MetricRegistry`] holds an ordered list of [`Descriptor`]s, each of which knows where its
//! value lives inside a statistics snapshot and how to render it: counters and gauges read a
//! single value, multi-dimensional gauges read one value per labelled series, and histograms read
//! an object of precomputed bucket counts and render them as cumulative buckets.
//!
//! Snapshots are plain [`serde_json::Value`]s. Values that are missing from a snapshot are not
//! errors; the affected series, or the whole metric, is simply left out.
//!
//! ```
//! use serde_json::json;
//! use statistics_exposition::MetricRegistry;
//!
//! let mut registry = MetricRegistry::new();
//! registry
//!     .register_counter("foo", ["system", "foo"], "bar")
//!     .register_histogram("lat", ["client", "lat"], &[10.0, 20.0], "Latency.");
//!
//! let snapshot = json!({ "system": { "foo": 42 } });
//! let rendered = registry.format_all(Some(&snapshot)).unwrap();
//! assert_eq!(rendered, "# HELP foo bar\n# TYPE foo counter\nfoo 42\n");
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod descriptor;
pub use self::descriptor::{Descriptor, Dimension, Histogram, MetricType, MultiGauge, SingleValue};

mod error;
pub use self::error::FormatError;

pub mod formatting;

mod path;
pub use self::path::{is_truthy, resolve};

mod registry;
pub use self::registry::MetricRegistry;

mod render;
