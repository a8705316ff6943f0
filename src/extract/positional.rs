use super::{parse_value, Column, ExtractError, Extracted, Metric, RowExtractor};

/// Token-index extractor mirroring the report's fixed column layout.
///
/// Multi-word labels are folded into single tokens first (`macro avg` →
/// `macro`), then the line is split on spaces and the value is read at the
/// column index for the row's label.
pub struct PositionalExtractor {
    column: Column,
}

impl PositionalExtractor {
    pub fn new(column: Column) -> Self {
        Self { column }
    }
}

impl Default for PositionalExtractor {
    fn default() -> Self {
        Self::new(Column::default())
    }
}

/// Fold `macro avg` / `weighted avg` into one-word labels.
fn normalize_labels(line: &str) -> String {
    line.replace("macro avg", "macro")
        .replace("weighted avg", "weighted")
}

/// Split on spaces, trim each fragment, drop the empty ones.
fn tokenize(line: &str) -> Vec<&str> {
    line.split(' ')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

impl RowExtractor for PositionalExtractor {
    fn name(&self) -> &str {
        "positional"
    }

    fn extract(&self, line: &str) -> Result<Option<Extracted>, ExtractError> {
        let normalized = normalize_labels(line);
        let tokens = tokenize(&normalized);

        let Some(metric) = tokens.first().and_then(|label| Metric::from_label(label)) else {
            return Ok(None);
        };

        let index = self.column.index_for(metric);
        let token = tokens.get(index).ok_or(ExtractError::MissingField {
            metric,
            index,
            found: tokens.len(),
        })?;

        parse_value(metric, token).map(Some)
    }
}
