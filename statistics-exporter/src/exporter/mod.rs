#[cfg(feature = "http-listener")]
use std::future::Future;
#[cfg(feature = "http-listener")]
use std::net::SocketAddr;
#[cfg(feature = "http-listener")]
use std::pin::Pin;

use thiserror::Error as ThisError;

/// Errors that stop a running exporter.
#[derive(Debug, ThisError)]
pub enum ExporterError {
    /// The HTTP listener could not keep accepting connections.
    #[error("HTTP listener failed: {0}")]
    HttpListener(String),
}

/// Convenience type for Future implementing an exporter.
#[cfg(feature = "http-listener")]
pub type ExporterFuture = Pin<Box<dyn Future<Output = Result<(), ExporterError>> + Send + 'static>>;

#[derive(Clone, Debug)]
enum ExporterConfig {
    // Run an HTTP listener on the given `listen_address`.
    #[cfg(feature = "http-listener")]
    HttpListener { listen_address: SocketAddr },

    #[allow(dead_code)]
    Unconfigured,
}

impl ExporterConfig {
    #[cfg_attr(not(feature = "http-listener"), allow(dead_code))]
    fn as_type_str(&self) -> &'static str {
        match self {
            #[cfg(feature = "http-listener")]
            Self::HttpListener { .. } => "http-listener",
            Self::Unconfigured => "unconfigured",
        }
    }
}

#[cfg(feature = "http-listener")]
mod http_listener;

pub(crate) mod builder;
