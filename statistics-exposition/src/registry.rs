use serde_json::Value;

use crate::descriptor::{to_path, Descriptor, Dimension, Histogram, MultiGauge, SingleValue};
use crate::render::render_descriptor;
use crate::FormatError;

/// An ordered set of metric descriptors.
///
/// Descriptors are rendered in the order they were registered. Nothing about a descriptor's path
/// or cuts is checked at registration time: the shape of the statistics snapshot is only known
/// once one is rendered.
///
/// A registry is meant to be filled once at startup and then shared read-only, typically behind an
/// `Arc`, for as long as the process serves scrapes.
#[derive(Clone, Debug, Default)]
pub struct MetricRegistry {
    descriptors: Vec<Descriptor>,
}

impl MetricRegistry {
    /// Creates an empty [`MetricRegistry`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor.
    pub fn register(&mut self, descriptor: Descriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registers a counter read from `path`.
    pub fn register_counter<N, P, S, H>(&mut self, name: N, path: P, help: H) -> &mut Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
        H: Into<String>,
    {
        self.register(Descriptor::Counter(SingleValue::new(name, path, help)))
    }

    /// Registers a gauge read from `path`.
    pub fn register_gauge<N, P, S, H>(&mut self, name: N, path: P, help: H) -> &mut Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
        H: Into<String>,
    {
        self.register(Descriptor::Gauge(SingleValue::new(name, path, help)))
    }

    /// Registers a gauge with one series per dimension.
    ///
    /// A dimension is only rendered when its value is present and non-zero, so that only observed
    /// components of the gauge are reported. The `# HELP`/`# TYPE` header is always rendered.
    pub fn register_multi_gauge<N, H, D>(&mut self, name: N, help: H, dimensions: D) -> &mut Self
    where
        N: Into<String>,
        H: Into<String>,
        D: IntoIterator<Item = Dimension>,
    {
        self.register(Descriptor::MultiGauge(MultiGauge {
            name: name.into(),
            help: help.into(),
            dimensions: dimensions.into_iter().collect(),
        }))
    }

    /// Registers a histogram read from `path`, with the given ascending bucket upper bounds.
    pub fn register_histogram<N, P, S, H>(
        &mut self,
        name: N,
        path: P,
        cuts: &[f64],
        help: H,
    ) -> &mut Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
        H: Into<String>,
    {
        self.register(Descriptor::Histogram(Histogram {
            name: name.into(),
            path: to_path(path),
            help: help.into(),
            cuts: cuts.to_vec(),
        }))
    }

    /// Removes every descriptor.
    ///
    /// Only useful for isolating tests that share a registry.
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    /// Gets the registered descriptors, in exposition order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Gets the number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no descriptor has been registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Renders every descriptor against `snapshot` in the Prometheus exposition format.
    ///
    /// Returns an empty string when there is no snapshot. Otherwise, the output ends with a single
    /// newline, even when none of the descriptors found anything to report, so a present but empty
    /// snapshot renders as `"\n"`. An empty registry always renders as an empty string.
    ///
    /// ## Errors
    ///
    /// If a descriptor disagrees with the shape of the snapshot, such as a histogram whose bucket
    /// counts do not match its cuts, rendering stops and the error is returned. No partial output
    /// is produced.
    pub fn format_all(&self, snapshot: Option<&Value>) -> Result<String, FormatError> {
        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => return Ok(String::new()),
        };

        let mut output = String::new();
        for descriptor in &self.descriptors {
            render_descriptor(&mut output, descriptor, snapshot)?;
        }

        // Keep the final line terminated even when every block came up empty.
        if output.is_empty() && !self.descriptors.is_empty() {
            output.push('\n');
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::MetricRegistry;
    use crate::{Dimension, FormatError};
    use serde_json::json;

    fn v8_dimensions() -> Vec<Dimension> {
        ["available", "busy", "dirty"]
            .iter()
            .map(|&status| {
                Dimension::new(
                    format!("v8_context{{status=\"{}\"}}", status),
                    vec!["server", "v8Context", status],
                )
            })
            .collect()
    }

    #[test]
    fn test_no_snapshot_renders_nothing() {
        let mut registry = MetricRegistry::new();
        assert_eq!(registry.format_all(None), Ok(String::new()));

        registry
            .register_counter("foo", ["a"], "bar")
            .register_histogram("lat", ["b"], &[10.0], "latency")
            .register_multi_gauge("threads", "threads", v8_dimensions());
        assert_eq!(registry.format_all(None), Ok(String::new()));
    }

    #[test]
    fn test_counter() {
        let mut registry = MetricRegistry::new();
        registry.register_counter("foo", ["system", "foo"], "bar");

        let snapshot = json!({ "system": { "foo": 42 } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(rendered, "# HELP foo bar\n# TYPE foo counter\nfoo 42\n");
    }

    #[test]
    fn test_gauge_zero_is_present() {
        let mut registry = MetricRegistry::new();
        registry.register_gauge("connections", ["client", "httpConnections"], "Open connections.");

        let snapshot = json!({ "client": { "httpConnections": 0 } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(
            rendered,
            concat!(
                "# HELP connections Open connections.\n",
                "# TYPE connections gauge\n",
                "connections 0\n",
            )
        );
    }

    #[test]
    fn test_absent_gauge_contributes_nothing() {
        let mut registry = MetricRegistry::new();
        registry
            .register_counter("first", ["system", "first"], "First.")
            .register_gauge("missing", ["system", "missing"], "Missing.")
            .register_gauge("null", ["system", "null"], "Null.")
            .register_gauge("last", ["system", "last"], "Last.");

        let snapshot = json!({ "system": { "first": 1, "null": null, "last": 2.5 } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(
            rendered,
            concat!(
                "# HELP first First.\n",
                "# TYPE first counter\n",
                "first 1\n",
                "# HELP last Last.\n",
                "# TYPE last gauge\n",
                "last 2.5\n",
            )
        );
    }

    #[test]
    fn test_only_absent_values_renders_single_newline() {
        let mut registry = MetricRegistry::new();
        assert_eq!(registry.format_all(Some(&json!({}))), Ok(String::new()));

        registry.register_counter("foo", ["system", "foo"], "Foo.");
        assert_eq!(registry.format_all(Some(&json!({}))), Ok("\n".to_owned()));

        registry.register_histogram("lat", ["client", "lat"], &[1.0], "Latency.");
        assert_eq!(
            registry.format_all(Some(&json!({ "system": { "bar": 1 } }))),
            Ok("\n".to_owned())
        );
        assert_eq!(registry.format_all(None), Ok(String::new()));
    }

    #[test]
    fn test_multi_gauge_skips_falsy_dimensions() {
        let mut registry = MetricRegistry::new();
        registry.register_multi_gauge(
            "gauge",
            "Dimensions.",
            vec![
                Dimension::new("gauge{label=\"a\"}", ["a"]),
                Dimension::new("gauge{label=\"b\"}", ["b"]),
                Dimension::new("gauge{label=\"c\"}", ["c"]),
            ],
        );

        let snapshot = json!({ "a": 0, "b": 5 });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(
            rendered,
            concat!("# HELP gauge Dimensions.\n", "# TYPE gauge gauge\n", "gauge{label=\"b\"} 5\n")
        );
    }

    #[test]
    fn test_multi_gauge_header_without_values() {
        let mut registry = MetricRegistry::new();
        registry.register_multi_gauge("v8_context", "V8 contexts.", v8_dimensions());

        let rendered = registry.format_all(Some(&json!({ "server": {} }))).unwrap();
        assert_eq!(rendered, "# HELP v8_context V8 contexts.\n# TYPE v8_context gauge\n");

        let snapshot = json!({ "server": { "v8Context": { "available": 3, "busy": 0, "dirty": 1 } } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();
        assert_eq!(
            rendered,
            concat!(
                "# HELP v8_context V8 contexts.\n",
                "# TYPE v8_context gauge\n",
                "v8_context{status=\"available\"} 3\n",
                "v8_context{status=\"dirty\"} 1\n",
            )
        );
    }

    #[test]
    fn test_histogram() {
        let mut registry = MetricRegistry::new();
        registry.register_histogram("lat", ["client", "lat"], &[10.0, 20.0], "Latency.");

        let snapshot = json!({
            "client": { "lat": { "counts": [3, 4, 2], "count": 9, "sum": 123.5 } }
        });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(
            rendered,
            concat!(
                "# HELP lat Latency.\n",
                "# TYPE lat histogram\n",
                "lat_bucket{le=\"10\"} 3\n",
                "lat_bucket{le=\"20\"} 7\n",
                "lat_bucket{le=\"+Inf\"} 9\n",
                "lat_count 9\n",
                "lat_sum 123.5\n",
            )
        );
    }

    #[test]
    fn test_histogram_fractional_cuts() {
        let mut registry = MetricRegistry::new();
        registry.register_histogram("conn", ["conn"], &[0.1, 1.0, 60.0], "Connection time.");

        let snapshot = json!({ "conn": { "counts": [0, 2, 0, 1], "count": 3, "sum": 61.25 } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(
            rendered,
            concat!(
                "# HELP conn Connection time.\n",
                "# TYPE conn histogram\n",
                "conn_bucket{le=\"0.1\"} 0\n",
                "conn_bucket{le=\"1\"} 2\n",
                "conn_bucket{le=\"60\"} 2\n",
                "conn_bucket{le=\"+Inf\"} 3\n",
                "conn_count 3\n",
                "conn_sum 61.25\n",
            )
        );
    }

    #[test]
    fn test_histogram_trusts_reported_count() {
        let mut registry = MetricRegistry::new();
        registry.register_histogram("lat", ["lat"], &[1.0], "Latency.");

        // Bucket counts add up to 5, but the reported count wins.
        let snapshot = json!({ "lat": { "counts": [2, 3], "count": 4, "sum": 8 } });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();

        assert!(rendered.contains("lat_bucket{le=\"1\"} 2\n"));
        assert!(rendered.contains("lat_bucket{le=\"+Inf\"} 4\n"));
        assert!(rendered.contains("lat_count 4\n"));
    }

    #[test]
    fn test_histogram_bucket_mismatch_fails() {
        let mut registry = MetricRegistry::new();
        registry
            .register_counter("foo", ["foo"], "Foo.")
            .register_histogram("lat", ["lat"], &[10.0, 20.0], "Latency.");

        let snapshot = json!({ "foo": 1, "lat": { "counts": [3, 4], "count": 7, "sum": 10 } });
        let result = registry.format_all(Some(&snapshot));

        assert_eq!(
            result,
            Err(FormatError::BucketMismatch { name: "lat".to_owned(), cuts: 2, counts: 2 })
        );
    }

    #[test]
    fn test_malformed_values_fail() {
        let mut registry = MetricRegistry::new();
        registry.register_histogram("lat", ["lat"], &[10.0], "Latency.");

        let cases = &[
            json!({ "lat": 5 }),
            json!({ "lat": { "counts": [1, "x"], "count": 1, "sum": 1 } }),
            json!({ "lat": { "counts": [1, 0], "sum": 1 } }),
            json!({ "lat": { "counts": [1, 0], "count": 1 } }),
        ];
        for snapshot in cases {
            let result = registry.format_all(Some(snapshot));
            assert!(
                matches!(result, Err(FormatError::MalformedHistogram { ref name, .. }) if name == "lat"),
                "unexpected result for {}: {:?}",
                snapshot,
                result
            );
        }

        registry.clear();
        registry.register_gauge("nested", ["system"], "Not a scalar.");
        let result = registry.format_all(Some(&json!({ "system": { "a": 1 } })));
        assert_eq!(result, Err(FormatError::NonScalar { name: "nested".to_owned() }));
    }

    #[test]
    fn test_registration_order_is_exposition_order() {
        let mut registry = MetricRegistry::new();
        registry
            .register_gauge("c", ["c"], "C.")
            .register_counter("a", ["a"], "A.")
            .register_gauge("b", ["b"], "B.");

        let snapshot = json!({ "a": 1, "b": 2, "c": 3 });
        let rendered = registry.format_all(Some(&snapshot)).unwrap();
        let names = rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(|line| line.split(' ').next().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_format_all_is_idempotent() {
        let mut registry = MetricRegistry::new();
        registry
            .register_counter("foo", ["foo"], "Foo.")
            .register_multi_gauge("v8_context", "V8 contexts.", v8_dimensions())
            .register_histogram("lat", ["lat"], &[1.0], "Latency.");

        let snapshot = json!({
            "foo": 3,
            "server": { "v8Context": { "busy": 2 } },
            "lat": { "counts": [1, 1], "count": 2, "sum": 3.5 },
        });
        let first = registry.format_all(Some(&snapshot)).unwrap();
        let second = registry.format_all(Some(&snapshot)).unwrap();

        assert_eq!(first, second);
        assert!(first.ends_with('\n') && !first.ends_with("\n\n"));
    }

    #[test]
    fn test_clear() {
        let mut registry = MetricRegistry::new();
        registry.register_counter("foo", ["foo"], "Foo.");
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.format_all(Some(&json!({ "foo": 1 }))), Ok(String::new()));

        registry.register_counter("bar", ["bar"], "Bar.");
        assert_eq!(registry.format_all(Some(&json!({ "foo": 1 }))), Ok("\n".to_owned()));
    }
}
