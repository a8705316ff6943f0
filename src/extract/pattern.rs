/// Named-capture extraction: one regex per row type instead of token indices.
///
/// Matches rows like:
/// - `accuracy                           0.912       400`
/// - `   macro avg       0.88      0.85      0.86       400`
use super::{parse_value, Column, ExtractError, Extracted, Metric, RowExtractor};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ACCURACY_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*accuracy(?:$| +(?P<value>[^ ]+))").unwrap()
});

static AGGREGATE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<label>macro|weighted)(?: avg)?(?: +(?P<precision>[^ ]+))?(?: +(?P<recall>[^ ]+))?(?: +(?P<f1>[^ ]+))?(?: .*)?$",
    )
    .unwrap()
});

/// Capture group names for the aggregate-row columns, in column order.
const COLUMN_GROUPS: [&str; 3] = ["precision", "recall", "f1"];

pub struct PatternExtractor {
    column: Column,
}

impl PatternExtractor {
    pub fn new(column: Column) -> Self {
        Self { column }
    }

    fn extract_accuracy(&self, caps: &Captures) -> Result<Extracted, ExtractError> {
        match caps.name("value") {
            Some(m) => parse_value(Metric::Accuracy, m.as_str()),
            None => Err(ExtractError::MissingField {
                metric: Metric::Accuracy,
                index: 1,
                found: 1,
            }),
        }
    }

    fn extract_aggregate(&self, caps: &Captures) -> Result<Extracted, ExtractError> {
        let metric = match &caps["label"] {
            "macro" => Metric::Macro,
            _ => Metric::Weighted,
        };
        let index = self.column.index();
        match caps.name(COLUMN_GROUPS[index - 1]) {
            Some(m) => parse_value(metric, m.as_str()),
            None => {
                let present = COLUMN_GROUPS
                    .iter()
                    .take_while(|g| caps.name(g).is_some())
                    .count();
                Err(ExtractError::MissingField {
                    metric,
                    index,
                    found: present + 1,
                })
            }
        }
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(Column::default())
    }
}

impl RowExtractor for PatternExtractor {
    fn name(&self) -> &str {
        "pattern"
    }

    fn extract(&self, line: &str) -> Result<Option<Extracted>, ExtractError> {
        let line = line.trim_end();
        if let Some(caps) = ACCURACY_ROW.captures(line) {
            return self.extract_accuracy(&caps).map(Some);
        }
        if let Some(caps) = AGGREGATE_ROW.captures(line) {
            return self.extract_aggregate(&caps).map(Some);
        }
        Ok(None)
    }
}
