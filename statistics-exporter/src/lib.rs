//! Serves database server statistics to Prometheus.
//!
//! The server samples its own statistics periodically and stores each sample as a nested
//! document. This crate renders the most recent sample in the Prometheus exposition format on
//! every scrape:
//!
//! - a [`SnapshotSource`] provides the latest sample, or nothing if none was collected yet
//! - a [`MetricRegistry`], usually filled by [`catalog::register_server_statistics`], describes
//!   which values to export and how
//! - an [`ExpositionHandle`] ties both together, and the [`ExporterBuilder`] serves it over HTTP
//!
//! ```no_run
//! use statistics_exporter::{catalog, ExporterBuilder, MetricRegistry, SharedSnapshot};
//!
//! let mut registry = MetricRegistry::new();
//! catalog::register_server_statistics(&mut registry, &catalog::BucketLayout::default());
//!
//! let snapshots = SharedSnapshot::new();
//! ExporterBuilder::new()
//!     .with_http_listener(([127, 0, 0, 1], 9000))
//!     .install(registry, snapshots.clone())
//!     .expect("failed to install statistics exporter");
//!
//! // Elsewhere, whenever the server records a new sample:
//! snapshots.publish_json(r#"{"system": {"numberOfThreads": 12}}"#).unwrap();
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;

mod common;
pub use self::common::BuildError;

mod exporter;
pub use self::exporter::builder::ExporterBuilder;
pub use self::exporter::ExporterError;
#[cfg(feature = "http-listener")]
pub use self::exporter::ExporterFuture;

mod handle;
pub use self::handle::{ExpositionHandle, RenderError};

mod source;
pub use self::source::{SharedSnapshot, SnapshotSource, SourceError};

pub use statistics_exposition::{Descriptor, Dimension, FormatError, MetricRegistry};
