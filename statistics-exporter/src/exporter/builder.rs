#[cfg(feature = "http-listener")]
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
#[cfg(feature = "http-listener")]
use std::thread;

#[cfg(feature = "http-listener")]
use ipnet::IpNet;
use statistics_exposition::MetricRegistry;
#[cfg(feature = "http-listener")]
use tracing::error;

#[cfg(feature = "http-listener")]
use crate::common::BuildError;
use crate::source::SnapshotSource;
use crate::ExpositionHandle;

use super::ExporterConfig;
#[cfg(feature = "http-listener")]
use super::ExporterFuture;

/// Builder for creating and installing a statistics exporter.
pub struct ExporterBuilder {
    #[cfg_attr(not(feature = "http-listener"), allow(dead_code))]
    exporter_config: ExporterConfig,
    #[cfg(feature = "http-listener")]
    allowed_addresses: Option<Vec<IpNet>>,
}

impl ExporterBuilder {
    /// Creates a new [`ExporterBuilder`].
    pub fn new() -> Self {
        #[cfg(feature = "http-listener")]
        let exporter_config = ExporterConfig::HttpListener {
            listen_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 9000),
        };
        #[cfg(not(feature = "http-listener"))]
        let exporter_config = ExporterConfig::Unconfigured;

        Self {
            exporter_config,
            #[cfg(feature = "http-listener")]
            allowed_addresses: None,
        }
    }

    /// Configures the exporter to expose an HTTP listener that functions as a [scrape endpoint].
    ///
    /// The HTTP listener that is spawned will respond to requests on any path with the rendered
    /// snapshot, except for `/health`, which always responds with `OK`.
    ///
    /// Defaults to enabled, listening at `0.0.0.0:9000`.
    ///
    /// [scrape endpoint]: https://prometheus.io/docs/instrumenting/exposition_formats/#text-based-format
    #[cfg(feature = "http-listener")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-listener")))]
    #[must_use]
    pub fn with_http_listener(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.exporter_config = ExporterConfig::HttpListener { listen_address: addr.into() };
        self
    }

    /// Adds an IP address or subnet to the allowlist for the scrape endpoint.
    ///
    /// If a client makes a request to the scrape endpoint and their IP is not present in the
    /// allowlist, either directly or within any of the allowed subnets, they will receive a 403
    /// Forbidden response.
    ///
    /// Defaults to allowing all IPs.
    ///
    /// ## Security Considerations
    ///
    /// On its own, an IP allowlist is insufficient for access control, if the exporter is running
    /// in an environment alongside applications (such as web browsers) that are susceptible to [DNS
    /// rebinding](https://en.wikipedia.org/wiki/DNS_rebinding) attacks.
    ///
    /// ## Errors
    ///
    /// If the given address cannot be parsed into an IP address or subnet, an error variant will be
    /// returned describing the error.
    #[cfg(feature = "http-listener")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-listener")))]
    pub fn add_allowed_address<A>(mut self, address: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        use std::str::FromStr;

        let address = IpNet::from_str(address.as_ref())
            .map_err(|e| BuildError::InvalidAllowlistAddress(e.to_string()))?;
        self.allowed_addresses.get_or_insert(vec![]).push(address);

        Ok(self)
    }

    /// Builds the exporter and installs it in the background.
    ///
    /// When called from within a Tokio runtime, the exporter future is spawned directly into the
    /// runtime. Otherwise, a new single-threaded Tokio runtime is created on a background thread,
    /// and the exporter is spawned there.
    ///
    /// The returned handle renders the same snapshots the endpoint serves.
    ///
    /// ## Errors
    ///
    /// If there is an error while either building the exporter or spawning its runtime, an error
    /// variant will be returned describing the error.
    #[cfg(feature = "http-listener")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-listener")))]
    pub fn install<S>(
        self,
        registry: MetricRegistry,
        source: S,
    ) -> Result<ExpositionHandle, BuildError>
    where
        S: SnapshotSource + 'static,
    {
        use tokio::runtime;

        let handle = if let Ok(runtime_handle) = runtime::Handle::try_current() {
            let (handle, exporter) = {
                let _g = runtime_handle.enter();
                self.build(registry, source)?
            };

            runtime_handle.spawn(async move {
                if let Err(e) = exporter.await {
                    error!(error = %e, "Statistics exporter stopped.");
                }
            });

            handle
        } else {
            let thread_name =
                format!("statistics-exporter-{}", self.exporter_config.as_type_str());

            let runtime = runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| BuildError::FailedToCreateRuntime(e.to_string()))?;

            let (handle, exporter) = {
                let _g = runtime.enter();
                self.build(registry, source)?
            };

            thread::Builder::new()
                .name(thread_name)
                .spawn(move || {
                    if let Err(e) = runtime.block_on(exporter) {
                        error!(error = %e, "Statistics exporter stopped.");
                    }
                })
                .map_err(|e| BuildError::FailedToCreateRuntime(e.to_string()))?;

            handle
        };

        Ok(handle)
    }

    /// Builds the handle and its exporter future.
    ///
    /// The exporter future must be polled, typically by spawning it onto a Tokio runtime, for the
    /// scrape endpoint to serve requests.
    ///
    /// ## Errors
    ///
    /// If there is an error while building the exporter, such as the listen address already being
    /// in use, an error variant will be returned describing the error.
    #[cfg(feature = "http-listener")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-listener")))]
    pub fn build<S>(
        mut self,
        registry: MetricRegistry,
        source: S,
    ) -> Result<(ExpositionHandle, ExporterFuture), BuildError>
    where
        S: SnapshotSource + 'static,
    {
        let allowed_addresses = self.allowed_addresses.take();
        let exporter_config = self.exporter_config.clone();
        let handle = self.build_handle(registry, source);

        let exporter = match exporter_config {
            ExporterConfig::Unconfigured => Err(BuildError::MissingExporterConfiguration)?,
            ExporterConfig::HttpListener { listen_address } => {
                super::http_listener::new_http_listener(
                    handle.clone(),
                    listen_address,
                    allowed_addresses,
                )?
            }
        };

        Ok((handle, exporter))
    }

    /// Builds a handle without an exporter.
    ///
    /// This is useful when the scrape endpoint is served by an application's own HTTP server,
    /// which can call [`ExpositionHandle::render`] from its request handler.
    pub fn build_handle<S>(self, registry: MetricRegistry, source: S) -> ExpositionHandle
    where
        S: SnapshotSource + 'static,
    {
        ExpositionHandle::new(registry, source)
    }
}

impl Default for ExporterBuilder {
    fn default() -> Self {
        ExporterBuilder::new()
    }
}
