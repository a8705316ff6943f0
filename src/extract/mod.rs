pub mod pattern;
pub mod positional;

use serde::{Deserialize, Serialize};

pub use pattern::PatternExtractor;
pub use positional::PositionalExtractor;

/// Aggregate metrics tracked across repeated classification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Macro,
    Weighted,
}

impl Metric {
    /// All metrics in output order.
    pub const ALL: [Metric; 3] = [Metric::Accuracy, Metric::Macro, Metric::Weighted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Macro => "macro",
            Metric::Weighted => "weighted",
        }
    }

    /// Match a row label (first token after normalization).
    pub fn from_label(label: &str) -> Option<Metric> {
        match label {
            "accuracy" => Some(Metric::Accuracy),
            "macro" => Some(Metric::Macro),
            "weighted" => Some(Metric::Weighted),
            _ => None,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which column of a macro/weighted row feeds the summary.
///
/// Report rows read `label precision recall f1-score support`, so the
/// column doubles as the token index after the label. The accuracy row
/// (`accuracy value support`) always reads index 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Column {
    Precision,
    Recall,
    #[default]
    #[serde(alias = "f1")]
    #[value(alias = "f1")]
    F1Score,
}

impl Column {
    pub fn index(&self) -> usize {
        match self {
            Column::Precision => 1,
            Column::Recall => 2,
            Column::F1Score => 3,
        }
    }

    /// Token index holding the value for `metric`.
    pub fn index_for(&self, metric: Metric) -> usize {
        match metric {
            Metric::Accuracy => 1,
            Metric::Macro | Metric::Weighted => self.index(),
        }
    }
}

/// Extraction strategy selectable from config or CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Split on spaces and pick the value by token index.
    #[default]
    Positional,
    /// Named-capture regex per row type.
    Pattern,
}

/// A value pulled from one report row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extracted {
    pub metric: Metric,
    pub value: f64,
}

/// Errors produced while extracting a value from a recognized row.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The selected token is not a valid float.
    NumericParse { metric: Metric, token: String },
    /// The row ends before the selected column.
    MissingField {
        metric: Metric,
        index: usize,
        found: usize,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NumericParse { metric, token } => {
                write!(f, "could not convert '{token}' to float for {metric} row")
            }
            ExtractError::MissingField {
                metric,
                index,
                found,
            } => write!(
                f,
                "{metric} row has {found} tokens, expected a value at index {index}"
            ),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Classifies report lines and pulls out the metric value they carry.
pub trait RowExtractor {
    /// Human-readable extractor name (e.g., "positional").
    fn name(&self) -> &str;

    /// Classify one line.
    ///
    /// `Ok(None)` means the line is not an aggregate row and is ignored.
    fn extract(&self, line: &str) -> Result<Option<Extracted>, ExtractError>;
}

/// Build the extractor for `kind` reading `column` from aggregate rows.
pub fn create_extractor(kind: ExtractorKind, column: Column) -> Box<dyn RowExtractor> {
    match kind {
        ExtractorKind::Positional => Box::new(PositionalExtractor::new(column)),
        ExtractorKind::Pattern => Box::new(PatternExtractor::new(column)),
    }
}

/// Parse a report value. `nan` and `inf` are rejected along with text.
pub(crate) fn parse_value(metric: Metric, token: &str) -> Result<Extracted, ExtractError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Extracted { metric, value }),
        _ => Err(ExtractError::NumericParse {
            metric,
            token: token.to_string(),
        }),
    }
}
