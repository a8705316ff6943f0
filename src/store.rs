/// Per-metric accumulation of extracted report values.
use crate::extract::{Metric, RowExtractor};

/// Ordered values collected for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: Metric,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One series per metric, always all three, in `Metric::ALL` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultStore {
    series: [MetricSeries; 3],
}

/// A row the extractor recognized but could not read.
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based line number within the ingested text.
    pub line: usize,
    pub error: crate::extract::ExtractError,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            series: Metric::ALL.map(MetricSeries::new),
        }
    }

    fn slot(metric: Metric) -> usize {
        match metric {
            Metric::Accuracy => 0,
            Metric::Macro => 1,
            Metric::Weighted => 2,
        }
    }

    pub fn push(&mut self, metric: Metric, value: f64) {
        self.series[Self::slot(metric)].values.push(value);
    }

    pub fn get(&self, metric: Metric) -> &MetricSeries {
        &self.series[Self::slot(metric)]
    }

    /// Series in output order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSeries> {
        self.series.iter()
    }

    /// Total number of values across all metrics.
    pub fn total(&self) -> usize {
        self.series.iter().map(MetricSeries::len).sum()
    }

    /// Classify every line of `text` and append the values it yields.
    ///
    /// `on_failure` decides what happens to a recognized row that cannot be
    /// read: returning `Err` aborts ingestion with that error, returning
    /// `Ok(())` skips the row. Returns the number of values appended.
    pub fn ingest<E, F>(
        &mut self,
        text: &str,
        extractor: &dyn RowExtractor,
        mut on_failure: F,
    ) -> Result<usize, E>
    where
        F: FnMut(RowFailure) -> Result<(), E>,
    {
        let mut appended = 0;
        for (idx, line) in split_lines(text).enumerate() {
            match extractor.extract(line) {
                Ok(Some(row)) => {
                    tracing::trace!(
                        line = idx + 1,
                        metric = %row.metric,
                        value = row.value,
                        "row matched"
                    );
                    self.push(row.metric, row.value);
                    appended += 1;
                }
                Ok(None) => {}
                Err(error) => on_failure(RowFailure {
                    line: idx + 1,
                    error,
                })?,
            }
        }
        Ok(appended)
    }
}

/// Split on `\n`, `\r\n` and a lone `\r`, the way text-mode readers do.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_terminator('\n')
        .flat_map(|chunk| chunk.strip_suffix('\r').unwrap_or(chunk).split('\r'))
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Dict-style dump: `{'accuracy': [0.9, 0.92], 'macro': [], 'weighted': [0.9]}`.
impl std::fmt::Display for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, series) in self.series.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': [", series.metric)?;
            for (j, v) in series.values.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{v:?}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}
