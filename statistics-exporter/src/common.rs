use thiserror::Error as ThisError;

/// Errors that could occur while building or installing an exporter.
#[derive(Debug, ThisError)]
pub enum BuildError {
    /// There was an issue when creating the necessary Tokio runtime to launch the exporter.
    #[error("failed to create Tokio runtime for exporter: {0}")]
    FailedToCreateRuntime(String),

    /// There was an issue when creating the HTTP listener.
    #[error("failed to create HTTP listener: {0}")]
    FailedToCreateHTTPListener(String),

    /// No exporter was configured.
    #[error(
        "attempted to build exporter with no exporters enabled; did you disable default features \
         and forget to enable the `http-listener` feature?"
    )]
    MissingExporterConfiguration,

    /// The given address could not be parsed successfully as an IP address/subnet.
    #[error("failed to parse address as a valid IP address/subnet: {0}")]
    InvalidAllowlistAddress(String),
}
