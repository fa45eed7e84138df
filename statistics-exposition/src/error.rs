use thiserror::Error as ThisError;

/// Errors that abort rendering a snapshot.
///
/// Each of these means the registered descriptors and the statistics producer disagree about the
/// shape of the snapshot. Missing values are never errors; they simply produce no output.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FormatError {
    /// A histogram's bucket counts do not line up with its configured cuts.
    #[error(
        "histogram `{name}` has {counts} bucket counts, which is incompatible with its {cuts} cuts"
    )]
    BucketMismatch {
        /// Name of the offending metric.
        name: String,
        /// Number of configured cuts.
        cuts: usize,
        /// Number of bucket counts found in the snapshot.
        counts: usize,
    },

    /// A histogram value is missing one of `counts`, `count` or `sum`, or holds non-numbers.
    #[error("histogram `{name}` is malformed: {reason}")]
    MalformedHistogram {
        /// Name of the offending metric.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A counter or gauge resolved to an object or array instead of a scalar.
    #[error("metric `{name}` resolved to a non-scalar value")]
    NonScalar {
        /// Name of the offending metric or dimension series.
        name: String,
    },
}
