use std::fmt;

/// The Prometheus type of a metric, as written on its `# TYPE` line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MetricType {
    /// A monotonically increasing value.
    Counter,
    /// A value that can go up and down.
    Gauge,
    /// A bucketed distribution.
    Histogram,
}

impl MetricType {
    /// Gets the exposition name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric whose value lives at a single path in the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleValue {
    /// Metric name.
    pub name: String,
    /// Keys leading to the value.
    pub path: Vec<String>,
    /// Help text.
    pub help: String,
}

impl SingleValue {
    /// Creates a new [`SingleValue`].
    pub fn new<N, P, S, H>(name: N, path: P, help: H) -> Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
        H: Into<String>,
    {
        SingleValue { name: name.into(), path: to_path(path), help: help.into() }
    }
}

/// One labelled series of a multi-dimensional gauge.
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    /// Series as written in the exposition, labels included, e.g. `arango_threads{status="busy"}`.
    pub series: String,
    /// Keys leading to the value.
    pub path: Vec<String>,
}

impl Dimension {
    /// Creates a new [`Dimension`].
    pub fn new<N, P, S>(series: N, path: P) -> Self
    where
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Dimension { series: series.into(), path: to_path(path) }
    }
}

/// A gauge reported as a fixed set of labelled series.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiGauge {
    /// Metric name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Series, in exposition order.
    pub dimensions: Vec<Dimension>,
}

/// A histogram whose buckets are precomputed by the statistics producer.
///
/// The value at `path` is expected to be an object with `counts`, `count` and `sum` fields, where
/// `counts` holds one entry per cut plus one for the overflow bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// Metric name.
    pub name: String,
    /// Keys leading to the histogram object.
    pub path: Vec<String>,
    /// Help text.
    pub help: String,
    /// Upper bucket bounds, ascending.
    pub cuts: Vec<f64>,
}

/// A registered metric definition.
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptor {
    /// A single-valued counter.
    Counter(SingleValue),
    /// A single-valued gauge.
    Gauge(SingleValue),
    /// A gauge with one series per configured dimension.
    MultiGauge(MultiGauge),
    /// A histogram with cumulative buckets.
    Histogram(Histogram),
}

impl Descriptor {
    /// Gets the metric name.
    pub fn name(&self) -> &str {
        match self {
            Descriptor::Counter(m) | Descriptor::Gauge(m) => &m.name,
            Descriptor::MultiGauge(m) => &m.name,
            Descriptor::Histogram(m) => &m.name,
        }
    }

    /// Gets the help text.
    pub fn help(&self) -> &str {
        match self {
            Descriptor::Counter(m) | Descriptor::Gauge(m) => &m.help,
            Descriptor::MultiGauge(m) => &m.help,
            Descriptor::Histogram(m) => &m.help,
        }
    }

    /// Gets the metric type.
    pub fn metric_type(&self) -> MetricType {
        match self {
            Descriptor::Counter(_) => MetricType::Counter,
            Descriptor::Gauge(_) | Descriptor::MultiGauge(_) => MetricType::Gauge,
            Descriptor::Histogram(_) => MetricType::Histogram,
        }
    }
}

pub(crate) fn to_path<P, S>(path: P) -> Vec<String>
where
    P: IntoIterator<Item = S>,
    S: Into<String>,
{
    path.into_iter().map(Into::into).collect()
}
