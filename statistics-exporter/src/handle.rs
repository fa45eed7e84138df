use std::sync::Arc;

use statistics_exposition::{FormatError, MetricRegistry};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::source::{SnapshotSource, SourceError};

/// Errors that could occur while rendering a scrape.
#[derive(Debug, ThisError)]
pub enum RenderError {
    /// The latest snapshot could not be fetched.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The snapshot did not match the registered metrics.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Handle for rendering the latest statistics snapshot.
///
/// The registry is frozen once a handle exists, so any number of scrapes can render through clones
/// of the same handle concurrently.
#[derive(Clone)]
pub struct ExpositionHandle {
    registry: Arc<MetricRegistry>,
    source: Arc<dyn SnapshotSource>,
}

impl ExpositionHandle {
    /// Creates a new [`ExpositionHandle`] rendering snapshots from `source` with `registry`.
    pub fn new<S>(registry: MetricRegistry, source: S) -> Self
    where
        S: SnapshotSource + 'static,
    {
        Self { registry: Arc::new(registry), source: Arc::new(source) }
    }

    /// Gets the registry this handle renders with.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Fetches the latest snapshot and renders it in the Prometheus exposition format.
    ///
    /// Renders an empty string if no snapshot has been collected yet.
    pub fn render(&self) -> Result<String, RenderError> {
        let snapshot = self.source.latest()?;
        let output = self.registry.format_all(snapshot.as_ref())?;
        debug!(
            has_snapshot = snapshot.is_some(),
            bytes = output.len(),
            "Rendered statistics snapshot."
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpositionHandle, RenderError};
    use crate::source::{SharedSnapshot, SourceError};
    use serde_json::{json, Value};
    use statistics_exposition::{FormatError, MetricRegistry};

    fn registry() -> MetricRegistry {
        let mut registry = MetricRegistry::new();
        registry
            .register_counter("foo", ["system", "foo"], "bar")
            .register_histogram("lat", ["client", "lat"], &[10.0, 20.0], "Latency.");
        registry
    }

    #[test]
    fn test_render_follows_published_snapshots() {
        let shared = SharedSnapshot::new();
        let handle = ExpositionHandle::new(registry(), shared.clone());
        assert_eq!(handle.render().unwrap(), "");

        shared.publish(json!({ "system": { "foo": 42 } }));
        assert_eq!(handle.render().unwrap(), "# HELP foo bar\n# TYPE foo counter\nfoo 42\n");

        shared.clear();
        assert_eq!(handle.render().unwrap(), "");
    }

    #[test]
    fn test_render_surfaces_format_errors() {
        let shared = SharedSnapshot::new();
        shared.publish(json!({ "client": { "lat": { "counts": [1], "count": 1, "sum": 1 } } }));
        let handle = ExpositionHandle::new(registry(), shared);

        match handle.render() {
            Err(RenderError::Format(FormatError::BucketMismatch { name, cuts, counts })) => {
                assert_eq!((name.as_str(), cuts, counts), ("lat", 2, 1));
            }
            other => panic!("expected a bucket mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_render_surfaces_source_errors() {
        let source = || -> Result<Option<Value>, SourceError> {
            Err(SourceError::Unavailable("timed out".to_owned()))
        };
        let handle = ExpositionHandle::new(registry(), source);

        let err = handle.render().unwrap_err();
        assert!(matches!(err, RenderError::Source(SourceError::Unavailable(_))));
        assert_eq!(err.to_string(), "failed to query statistics store: timed out");
    }
}
