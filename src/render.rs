//! Summary output: the plain-text block per metric, or a JSON document.

use crate::config::{OutputConfig, OutputFormat};
use crate::extract::Metric;
use crate::stats::{self, round_to, StatsError};
use crate::store::{MetricSeries, ResultStore};
use crate::summary::SummaryError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

const SEPARATOR: &str = "=====================";

/// Rounded statistics for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub max: f64,
}

impl MetricSummary {
    pub fn compute(series: &MetricSeries, opts: &OutputConfig) -> Result<Self, SummaryError> {
        let metric = series.metric;
        let values = &series.values;
        Ok(Self {
            metric,
            count: values.len(),
            mean: round_to(stats::mean(values).map_err(insufficient(metric))?, opts.mean_digits),
            std: round_to(stats::stdev(values).map_err(insufficient(metric))?, opts.std_digits),
            max: round_to(stats::max(values).map_err(insufficient(metric))?, opts.max_digits),
        })
    }
}

fn insufficient(metric: Metric) -> impl Fn(StatsError) -> SummaryError {
    move |source| SummaryError::InsufficientData { metric, source }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    metrics: Vec<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<BTreeMap<Metric, &'a [f64]>>,
}

/// Write the summary in the configured format.
pub fn write_summary<W: Write>(
    store: &ResultStore,
    opts: &OutputConfig,
    out: &mut W,
) -> Result<(), SummaryError> {
    match opts.format {
        OutputFormat::Text => write_text(store, opts, out),
        OutputFormat::Json => write_json(store, opts, out),
    }
}

/// Four lines per metric (avg, std, max, separator), then the raw dump.
///
/// Lines go out as each statistic is computed, so a metric with too few
/// values leaves the lines before it in `out`.
pub fn write_text<W: Write>(
    store: &ResultStore,
    opts: &OutputConfig,
    out: &mut W,
) -> Result<(), SummaryError> {
    for series in store.iter() {
        let metric = series.metric;
        let values = &series.values;

        let mean = stats::mean(values).map_err(insufficient(metric))?;
        writeln!(out, "avg. [{metric}]: {:?}", round_to(mean, opts.mean_digits))?;

        let std = stats::stdev(values).map_err(insufficient(metric))?;
        writeln!(out, "std. [{metric}]: {:?}", round_to(std, opts.std_digits))?;

        let max = stats::max(values).map_err(insufficient(metric))?;
        writeln!(out, "max. [{metric}]: {:?}", round_to(max, opts.max_digits))?;

        writeln!(out, "{SEPARATOR}")?;
    }

    if opts.dump_values {
        writeln!(out, "{store}")?;
    }
    Ok(())
}

pub fn write_json<W: Write>(
    store: &ResultStore,
    opts: &OutputConfig,
    out: &mut W,
) -> Result<(), SummaryError> {
    let metrics = store
        .iter()
        .map(|s| MetricSummary::compute(s, opts))
        .collect::<Result<Vec<_>, _>>()?;

    let values = opts.dump_values.then(|| {
        store
            .iter()
            .map(|s| (s.metric, s.values.as_slice()))
            .collect()
    });

    serde_json::to_writer_pretty(&mut *out, &JsonSummary { metrics, values })?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_from(rows: &[(Metric, f64)]) -> ResultStore {
        let mut store = ResultStore::new();
        for &(m, v) in rows {
            store.push(m, v);
        }
        store
    }

    fn two_runs() -> ResultStore {
        store_from(&[
            (Metric::Accuracy, 0.90),
            (Metric::Macro, 0.86),
            (Metric::Weighted, 0.90),
            (Metric::Accuracy, 0.92),
            (Metric::Macro, 0.87),
            (Metric::Weighted, 0.91),
        ])
    }

    fn render_text(store: &ResultStore, opts: &OutputConfig) -> (String, Result<(), SummaryError>) {
        let mut buf = Vec::new();
        let result = write_text(store, opts, &mut buf);
        (String::from_utf8(buf).unwrap(), result)
    }

    #[test]
    fn text_output_for_two_runs() {
        let (text, result) = render_text(&two_runs(), &OutputConfig::default());
        result.unwrap();
        let expected = "\
avg. [accuracy]: 0.91
std. [accuracy]: 0.01
max. [accuracy]: 0.92
=====================
avg. [macro]: 0.865
std. [macro]: 0.01
max. [macro]: 0.87
=====================
avg. [weighted]: 0.905
std. [weighted]: 0.01
max. [weighted]: 0.91
=====================
{'accuracy': [0.9, 0.92], 'macro': [0.86, 0.87], 'weighted': [0.9, 0.91]}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn identical_runs_have_zero_std() {
        let mut rows = Vec::new();
        for _ in 0..5 {
            rows.push((Metric::Accuracy, 0.9));
            rows.push((Metric::Macro, 0.8));
            rows.push((Metric::Weighted, 0.85));
        }
        let (text, result) = render_text(&store_from(&rows), &OutputConfig::default());
        result.unwrap();
        assert!(text.contains("avg. [accuracy]: 0.9\n"));
        assert!(text.contains("avg. [macro]: 0.8\n"));
        assert!(text.contains("avg. [weighted]: 0.85\n"));
        assert_eq!(text.matches(": 0.0\n").count(), 3);
        assert_eq!(text.matches(SEPARATOR).count(), 3);
    }

    #[test]
    fn single_run_fails_after_first_mean() {
        let store = store_from(&[
            (Metric::Accuracy, 0.9),
            (Metric::Macro, 0.8),
            (Metric::Weighted, 0.85),
        ]);
        let (text, result) = render_text(&store, &OutputConfig::default());
        assert_eq!(text, "avg. [accuracy]: 0.9\n");
        match result.unwrap_err() {
            SummaryError::InsufficientData { metric, source } => {
                assert_eq!(metric, Metric::Accuracy);
                assert!(source.to_string().contains("standard deviation"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_series_fails_on_mean() {
        let store = store_from(&[(Metric::Accuracy, 0.9), (Metric::Accuracy, 0.92)]);
        let (text, result) = render_text(&store, &OutputConfig::default());
        assert!(text.ends_with(&format!("{SEPARATOR}\n")));
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SummaryError::InsufficientData {
                metric: Metric::Macro,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "[macro] mean requires at least 1 data point, found 0"
        );
    }

    #[test]
    fn text_without_dump() {
        let opts = OutputConfig {
            dump_values: false,
            ..Default::default()
        };
        let (text, result) = render_text(&two_runs(), &opts);
        result.unwrap();
        assert!(text.ends_with(&format!("{SEPARATOR}\n")));
        assert!(!text.contains("{'accuracy'"));
    }

    fn single_metric_block(values: &[f64]) -> String {
        let mut rows = Vec::new();
        for &v in values {
            for metric in Metric::ALL {
                rows.push((metric, v));
            }
        }
        let (text, result) = render_text(&store_from(&rows), &OutputConfig::default());
        result.unwrap();
        text.lines().take(3).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn averages_round_like_exact_decimal() {
        assert_eq!(
            single_metric_block(&[0.8, 0.801]),
            "avg. [accuracy]: 0.8\nstd. [accuracy]: 0.0\nmax. [accuracy]: 0.801"
        );
        assert!(single_metric_block(&[0.8, 0.8, 0.8, 0.81])
            .starts_with("avg. [accuracy]: 0.802\n"));
        assert_eq!(
            single_metric_block(&[0.86, 0.87, 0.87, 0.87]),
            "avg. [accuracy]: 0.867\nstd. [accuracy]: 0.01\nmax. [accuracy]: 0.87"
        );
    }

    #[test]
    fn custom_digits() {
        let opts = OutputConfig {
            std_digits: 4,
            ..Default::default()
        };
        let (text, result) = render_text(&two_runs(), &opts);
        result.unwrap();
        assert!(text.contains("std. [accuracy]: 0.0141\n"));
    }

    #[test]
    fn rendering_is_repeatable() {
        let store = two_runs();
        let (first, _) = render_text(&store, &OutputConfig::default());
        let (second, _) = render_text(&store, &OutputConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn json_matches_text_numbers() {
        let opts = OutputConfig {
            format: OutputFormat::Json,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write_summary(&two_runs(), &opts, &mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let metrics = v["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0]["metric"], "accuracy");
        assert_eq!(metrics[0]["count"], 2);
        assert_eq!(metrics[0]["mean"], 0.91);
        assert_eq!(metrics[0]["std"], 0.01);
        assert_eq!(metrics[0]["max"], 0.92);
        assert_eq!(metrics[1]["metric"], "macro");
        assert_eq!(metrics[2]["metric"], "weighted");
        assert_eq!(v["values"]["macro"], serde_json::json!([0.86, 0.87]));
    }

    #[test]
    fn json_without_values() {
        let opts = OutputConfig {
            format: OutputFormat::Json,
            dump_values: false,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write_summary(&two_runs(), &opts, &mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(v.get("values").is_none());
    }

    #[test]
    fn json_insufficient_data_writes_nothing() {
        let opts = OutputConfig {
            format: OutputFormat::Json,
            ..Default::default()
        };
        let mut buf = Vec::new();
        let err = write_summary(&ResultStore::new(), &opts, &mut buf).unwrap_err();
        assert!(matches!(err, SummaryError::InsufficientData { .. }));
        assert!(buf.is_empty());
    }
}
