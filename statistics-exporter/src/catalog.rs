//! The metrics exported from a database server's periodic statistics samples.
//!
//! Each sample is a nested document with `system`, `client` and `server` sections; the client
//! section holds histograms whose bucket counts are precomputed against the server's configured
//! distributions, which [`BucketLayout`] mirrors.

use statistics_exposition::{Dimension, MetricRegistry};

/// Bucket upper bounds of the histograms the server records.
///
/// These have to match the distributions the server was built with, or rendering fails with a
/// bucket mismatch.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketLayout {
    /// Connection time buckets, in seconds.
    pub connection_time: Vec<f64>,
    /// Request time buckets (total, request, queue and I/O time), in seconds.
    pub request_time: Vec<f64>,
    /// Response size buckets, in bytes.
    pub bytes_sent: Vec<f64>,
    /// Request size buckets, in bytes.
    pub bytes_received: Vec<f64>,
}

impl Default for BucketLayout {
    fn default() -> Self {
        BucketLayout {
            connection_time: vec![0.1, 1.0, 60.0],
            request_time: vec![0.01, 0.05, 0.1, 0.2, 0.5, 1.0],
            bytes_sent: vec![250.0, 1000.0, 2000.0, 5000.0, 10000.0],
            bytes_received: vec![250.0, 1000.0, 2000.0, 5000.0, 10000.0],
        }
    }
}

/// Registers the server statistics metrics into `registry`.
pub fn register_server_statistics(registry: &mut MetricRegistry, buckets: &BucketLayout) {
    // system
    registry
        .register_counter(
            "arango_minor_page_faults",
            ["system", "minorPageFaults"],
            "The number of minor faults the process has made which have not required loading a \
             memory page from disk. This figure is not reported on Windows.",
        )
        .register_counter(
            "arango_major_page_faults",
            ["system", "majorPageFaults"],
            "On Windows, this figure contains the total number of page faults. On other system, \
             this figure contains the number of major faults the process has made which have \
             required loading a memory page from disk.",
        )
        .register_counter(
            "arango_user_time",
            ["system", "userTime"],
            "Amount of time that this process has been scheduled in user mode, measured in seconds.",
        )
        .register_counter(
            "arango_system_time",
            ["system", "systemTime"],
            "Amount of time that this process has been scheduled in kernel mode, measured in \
             seconds.",
        )
        .register_gauge(
            "arango_number_of_threads",
            ["system", "numberOfThreads"],
            "Number of threads in the arangod process.",
        )
        .register_gauge(
            "arango_resident_size",
            ["system", "residentSize"],
            "The total size of the number of pages the process has in real memory. This is just \
             the pages which count toward text, data, or stack space. This does not include pages \
             which have not been demand-loaded in, or which are swapped out. The resident set size \
             is reported in bytes.",
        )
        .register_gauge(
            "arango_resident_size_percent",
            ["system", "residentSizePercent"],
            "The percentage of physical memory used by the process as resident set size.",
        )
        .register_gauge(
            "arango_virtual_size",
            ["system", "virtualSize"],
            "On Windows, this figure contains the total amount of memory that the memory manager \
             has committed for the arangod process. On other systems, this figure contains The \
             size of the virtual memory the process is using.",
        );

    // client
    registry
        .register_gauge(
            "arango_number_of_http_connections",
            ["client", "httpConnections"],
            "Number of open client http connections.",
        )
        .register_histogram(
            "arango_connection_time",
            ["client", "connectionTime"],
            &buckets.connection_time,
            "Total connection time of a client.",
        )
        .register_histogram(
            "arango_total_time",
            ["client", "totalTime"],
            &buckets.request_time,
            "Total time needed to answer a request.",
        )
        .register_histogram(
            "arango_request_time",
            ["client", "requestTime"],
            &buckets.request_time,
            "Request time needed to answer a request.",
        )
        .register_histogram(
            "arango_queue_time",
            ["client", "queueTime"],
            &buckets.request_time,
            "Queue time needed to answer a request.",
        )
        .register_histogram(
            "arango_io_time",
            ["client", "ioTime"],
            &buckets.request_time,
            "IO time needed to answer a request.",
        )
        .register_histogram(
            "arango_bytes_sent",
            ["client", "bytesSent"],
            &buckets.bytes_sent,
            "Bytes sent for a request.",
        )
        .register_histogram(
            "arango_bytes_received",
            ["client", "bytesReceived"],
            &buckets.bytes_received,
            "Bytes received for a request.",
        );

    // server
    registry
        .register_multi_gauge(
            "arango_v8_context",
            "ArangoDB v8 Contexts",
            status_dimensions(
                "arango_v8_context",
                &["server", "v8Context"],
                &["available", "busy", "dirty", "free", "max"],
            ),
        )
        .register_multi_gauge(
            "arango_threads",
            "ArangoDB Threads",
            status_dimensions(
                "arango_threads",
                &["server", "threads"],
                &["running", "working", "blocked"],
            ),
        );
}

fn status_dimensions(name: &str, parent: &[&str], statuses: &[&str]) -> Vec<Dimension> {
    statuses
        .iter()
        .map(|status| {
            let path = parent.iter().chain(std::iter::once(status)).copied();
            Dimension::new(format!("{}{{status=\"{}\"}}", name, status), path)
        })
        .collect()
}
