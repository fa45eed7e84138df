//! Sources of statistics snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error as ThisError;

/// Errors that could occur while fetching a snapshot.
#[derive(Debug, ThisError)]
pub enum SourceError {
    /// The backing store could not be queried.
    #[error("failed to query statistics store: {0}")]
    Unavailable(String),

    /// The backing store returned something that is not a statistics snapshot.
    #[error("statistics store returned an invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Provides the most recent statistics snapshot.
///
/// Implementations are queried once per scrape. Returning `Ok(None)` means no snapshot has been
/// collected yet, which renders as an empty scrape rather than an error.
pub trait SnapshotSource: Send + Sync {
    /// Fetches the latest snapshot.
    fn latest(&self) -> Result<Option<Value>, SourceError>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Result<Option<Value>, SourceError> + Send + Sync,
{
    fn latest(&self) -> Result<Option<Value>, SourceError> {
        self()
    }
}

/// A snapshot slot that a statistics collector publishes into.
///
/// Cloning is cheap and every clone observes the same slot.
#[derive(Clone, Debug, Default)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Option<Value>>>,
}

impl SharedSnapshot {
    /// Creates an empty [`SharedSnapshot`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot.
    pub fn publish(&self, snapshot: Value) {
        *self.inner.write() = Some(snapshot);
    }

    /// Parses `json` and publishes it as the current snapshot.
    pub fn publish_json(&self, json: &str) -> Result<(), SourceError> {
        let snapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::InvalidSnapshot(e.to_string()))?;
        self.publish(snapshot);
        Ok(())
    }

    /// Drops the current snapshot, if any.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

impl SnapshotSource for SharedSnapshot {
    fn latest(&self) -> Result<Option<Value>, SourceError> {
        Ok(self.inner.read().clone())
    }
}
