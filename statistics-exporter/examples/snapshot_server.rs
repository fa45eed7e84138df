use std::thread;
use std::time::Duration;

use serde_json::json;
use statistics_exporter::{catalog, ExporterBuilder, MetricRegistry, SharedSnapshot};

fn main() {
    tracing_subscriber::fmt::init();

    // Metrics have to be registered before the exporter starts serving scrapes.
    let mut registry = MetricRegistry::new();
    catalog::register_server_statistics(&mut registry, &catalog::BucketLayout::default());

    let snapshots = SharedSnapshot::new();
    ExporterBuilder::new()
        .install(registry, snapshots.clone())
        .expect("failed to install statistics exporter");

    // Pretend to be the server's statistics collector, publishing a fresh sample every second.
    let mut requests = [0u64; 7];
    let mut iteration = 0u64;
    loop {
        iteration += 1;
        requests[(iteration % 7) as usize] += iteration % 3 + 1;
        let count: u64 = requests.iter().sum();

        snapshots.publish(json!({
            "time": iteration,
            "system": {
                "minorPageFaults": iteration * 17,
                "majorPageFaults": iteration / 10,
                "userTime": iteration as f64 * 0.25,
                "systemTime": iteration as f64 * 0.05,
                "numberOfThreads": 24 + iteration % 4,
                "residentSize": 104_857_600 + iteration * 4096,
            },
            "client": {
                "httpConnections": iteration % 5,
                "requestTime": {
                    "counts": requests,
                    "count": count,
                    "sum": count as f64 * 0.042,
                },
            },
            "server": {
                "threads": { "running": 8, "working": iteration % 3, "blocked": 0 },
            },
        }));

        thread::sleep(Duration::from_secs(1));
    }
}
