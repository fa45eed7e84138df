use serde_json::{Number, Value};
use tracing::warn;

use crate::descriptor::{Descriptor, Histogram, MultiGauge, SingleValue};
use crate::formatting::{
    write_help_line, write_metric_line, write_series_line, write_type_line, Bound, SampleNumber,
    SampleValue, Tally,
};
use crate::path::{is_truthy, resolve};
use crate::FormatError;

/// Appends the block for `descriptor` to `buffer`, or nothing if its value is absent.
pub(crate) fn render_descriptor(
    buffer: &mut String,
    descriptor: &Descriptor,
    snapshot: &Value,
) -> Result<(), FormatError> {
    let metric_type = descriptor.metric_type().as_str();
    match descriptor {
        Descriptor::Counter(metric) | Descriptor::Gauge(metric) => {
            render_single_value(buffer, metric, metric_type, snapshot)
        }
        Descriptor::MultiGauge(metric) => render_multi_gauge(buffer, metric, metric_type, snapshot),
        Descriptor::Histogram(metric) => render_histogram(buffer, metric, metric_type, snapshot),
    }
}

fn render_single_value(
    buffer: &mut String,
    metric: &SingleValue,
    metric_type: &str,
    snapshot: &Value,
) -> Result<(), FormatError> {
    let value = match resolve(Some(snapshot), &metric.path) {
        Some(value) => value,
        None => return Ok(()),
    };
    let value =
        SampleValue::new(value).ok_or_else(|| FormatError::NonScalar { name: metric.name.clone() })?;

    write_help_line(buffer, &metric.name, &metric.help);
    write_type_line(buffer, &metric.name, metric_type);
    write_metric_line::<&str, _>(buffer, &metric.name, None, None, value);
    Ok(())
}

fn render_multi_gauge(
    buffer: &mut String,
    metric: &MultiGauge,
    metric_type: &str,
    snapshot: &Value,
) -> Result<(), FormatError> {
    write_help_line(buffer, &metric.name, &metric.help);
    write_type_line(buffer, &metric.name, metric_type);

    for dimension in &metric.dimensions {
        let value = resolve(Some(snapshot), &dimension.path);
        if !is_truthy(value) {
            continue;
        }

        let value = value
            .and_then(SampleValue::new)
            .ok_or_else(|| FormatError::NonScalar { name: dimension.series.clone() })?;
        write_series_line(buffer, &dimension.series, value);
    }
    Ok(())
}

fn render_histogram(
    buffer: &mut String,
    metric: &Histogram,
    metric_type: &str,
    snapshot: &Value,
) -> Result<(), FormatError> {
    let object = match resolve(Some(snapshot), &metric.path) {
        Some(object) => object,
        None => return Ok(()),
    };
    let malformed =
        |reason| FormatError::MalformedHistogram { name: metric.name.clone(), reason };

    let counts = object
        .get("counts")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing `counts` array"))?;
    if counts.len() != metric.cuts.len() + 1 {
        return Err(FormatError::BucketMismatch {
            name: metric.name.clone(),
            cuts: metric.cuts.len(),
            counts: counts.len(),
        });
    }
    let counts = counts
        .iter()
        .map(Value::as_number)
        .collect::<Option<Vec<&Number>>>()
        .ok_or_else(|| malformed("non-numeric entry in `counts`"))?;
    let count = object
        .get("count")
        .and_then(Value::as_number)
        .ok_or_else(|| malformed("missing numeric `count`"))?;
    let sum = object
        .get("sum")
        .and_then(Value::as_number)
        .ok_or_else(|| malformed("missing numeric `sum`"))?;

    write_help_line(buffer, &metric.name, &metric.help);
    write_type_line(buffer, &metric.name, metric_type);

    let mut running = Tally::default();
    for (cut, bucket) in metric.cuts.iter().zip(&counts) {
        running = running.add(bucket);
        write_metric_line(buffer, &metric.name, Some("bucket"), Some(("le", Bound(*cut))), running);
    }

    // The overflow bucket is reported as the producer's own total.
    if let Some(total) = disagreeing_total(&counts, count) {
        warn!(
            metric = metric.name.as_str(),
            buckets = %total,
            count = %count,
            "Histogram bucket counts do not add up to its reported count."
        );
    }

    let (count, sum) = (SampleNumber(count), SampleNumber(sum));
    write_metric_line(buffer, &metric.name, Some("bucket"), Some(("le", "+Inf")), count);
    write_metric_line::<&str, _>(buffer, &metric.name, Some("count"), None, count);
    write_metric_line::<&str, _>(buffer, &metric.name, Some("sum"), None, sum);
    Ok(())
}

/// Returns the sum of `counts` when it differs from the reported `count`.
fn disagreeing_total(counts: &[&Number], count: &Number) -> Option<Tally> {
    let total = counts.iter().fold(Tally::default(), |total, n| total.add(n));
    (Some(total.as_f64()) != count.as_f64()).then_some(total)
}
