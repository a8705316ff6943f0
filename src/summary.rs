//! Input resolution and the read → classify → accumulate pass.
//!
//! Every input is read whole before its lines are classified. All inputs pool
//! into a single `ResultStore`; concatenated runs are not told apart.

use crate::config::{ExtractConfig, MalformedPolicy};
use crate::extract::{self, ExtractError, Metric, RowExtractor};
use crate::stats::StatsError;
use crate::store::{ResultStore, RowFailure};
use std::path::{Path, PathBuf};

/// Expand input specs into concrete paths.
///
/// Plain paths pass through untouched (a missing one fails later, on read).
/// An existing file is always taken literally, even if its name contains glob
/// metacharacters. Other specs containing them are expanded in sorted order
/// and must match at least one file.
pub fn resolve_inputs(specs: &[String]) -> Result<Vec<PathBuf>, SummaryError> {
    if specs.is_empty() {
        return Err(SummaryError::NoInputs);
    }

    let mut paths = Vec::new();
    for spec in specs {
        if !is_glob(spec) || Path::new(spec).is_file() {
            paths.push(PathBuf::from(spec));
            continue;
        }

        let entries = glob::glob(spec).map_err(|e| SummaryError::Pattern {
            pattern: spec.clone(),
            detail: e.to_string(),
        })?;

        let mut matched: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(p) if p.is_file() => Some(p),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, pattern = %spec, "skipping unreadable glob entry");
                    None
                }
            })
            .collect();

        if matched.is_empty() {
            return Err(SummaryError::NoMatches {
                pattern: spec.clone(),
            });
        }
        matched.sort();
        tracing::debug!(pattern = %spec, matched = matched.len(), "expanded input pattern");
        paths.append(&mut matched);
    }
    Ok(paths)
}

fn is_glob(spec: &str) -> bool {
    spec.contains(['*', '?', '['])
}

/// Read one file and append its rows to `store`.
pub fn ingest_file(
    store: &mut ResultStore,
    path: &Path,
    extractor: &dyn RowExtractor,
    policy: MalformedPolicy,
) -> Result<usize, SummaryError> {
    let text = std::fs::read_to_string(path).map_err(|e| SummaryError::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;

    let appended = store.ingest(&text, extractor, |failure: RowFailure| match policy {
        MalformedPolicy::Fail => Err(SummaryError::Row {
            path: path.to_path_buf(),
            line: failure.line,
            source: failure.error,
        }),
        MalformedPolicy::Skip => {
            tracing::warn!(
                path = %path.display(),
                line = failure.line,
                error = %failure.error,
                "skipping malformed row"
            );
            Ok(())
        }
    })?;

    tracing::info!(path = %path.display(), rows = appended, "ingested report");
    Ok(appended)
}

/// Build the store from every input, in order.
pub fn collect(paths: &[PathBuf], cfg: &ExtractConfig) -> Result<ResultStore, SummaryError> {
    let extractor = extract::create_extractor(cfg.extractor, cfg.column);
    tracing::debug!(extractor = extractor.name(), column = ?cfg.column, "classifying rows");

    let mut store = ResultStore::new();
    for path in paths {
        ingest_file(&mut store, path, extractor.as_ref(), cfg.on_malformed)?;
    }

    for series in store.iter() {
        if series.is_empty() {
            tracing::warn!(metric = %series.metric, "no rows found for metric");
        } else {
            tracing::debug!(metric = %series.metric, values = series.len(), "series collected");
        }
    }
    tracing::info!(values = store.total(), "collected report values");
    Ok(store)
}

/// Errors that end a summary run.
#[derive(Debug)]
pub enum SummaryError {
    /// No input specs were given.
    NoInputs,
    /// An input file is missing or unreadable.
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A recognized row could not be read.
    Row {
        path: PathBuf,
        line: usize,
        source: ExtractError,
    },
    /// A metric has too few values for a statistic.
    InsufficientData { metric: Metric, source: StatsError },
    /// A glob pattern is malformed.
    Pattern { pattern: String, detail: String },
    /// A glob pattern matched no files.
    NoMatches { pattern: String },
    /// Writing the summary failed.
    Output(std::io::Error),
    /// Encoding the JSON summary failed.
    Serialize(serde_json::Error),
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::NoInputs => write!(f, "no input files given"),
            SummaryError::FileAccess { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            SummaryError::Row { path, line, source } => {
                write!(f, "{}:{line}: {source}", path.display())
            }
            SummaryError::InsufficientData { metric, source } => {
                write!(f, "[{metric}] {source}")
            }
            SummaryError::Pattern { pattern, detail } => {
                write!(f, "invalid input pattern '{pattern}': {detail}")
            }
            SummaryError::NoMatches { pattern } => {
                write!(f, "input pattern '{pattern}' matched no files")
            }
            SummaryError::Output(e) => write!(f, "failed to write summary: {e}"),
            SummaryError::Serialize(e) => write!(f, "failed to encode summary: {e}"),
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SummaryError::FileAccess { source, .. } => Some(source),
            SummaryError::Row { source, .. } => Some(source),
            SummaryError::InsufficientData { source, .. } => Some(source),
            SummaryError::Output(e) => Some(e),
            SummaryError::Serialize(e) => Some(e),
            SummaryError::NoInputs
            | SummaryError::Pattern { .. }
            | SummaryError::NoMatches { .. } => None,
        }
    }
}

impl From<std::io::Error> for SummaryError {
    fn from(e: std::io::Error) -> Self {
        SummaryError::Output(e)
    }
}

impl From<serde_json::Error> for SummaryError {
    fn from(e: serde_json::Error) -> Self {
        SummaryError::Serialize(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Column, ExtractorKind};
    use tempfile::tempdir;

    const RUN_A: &str = "\
    accuracy                           0.90       400
   macro avg       0.88      0.85      0.86       400
weighted avg       0.91      0.90      0.90       400
";

    const RUN_B: &str = "\
    accuracy                           0.92       400
   macro avg       0.89      0.86      0.87       400
weighted avg       0.92      0.91      0.91       400
";

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn plain_paths_pass_through() {
        let specs = vec!["results.txt".to_string(), "other.txt".to_string()];
        let paths = resolve_inputs(&specs).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("results.txt"), PathBuf::from("other.txt")]
        );
    }

    #[test]
    fn empty_specs_is_an_error() {
        assert!(matches!(resolve_inputs(&[]), Err(SummaryError::NoInputs)));
    }

    #[test]
    fn glob_expands_sorted() {
        let dir = tempdir().unwrap();
        write(dir.path(), "run2.txt", RUN_B);
        write(dir.path(), "run1.txt", RUN_A);
        write(dir.path(), "notes.md", "accuracy 0.1 1");

        let pattern = format!("{}/run*.txt", dir.path().display());
        let paths = resolve_inputs(&[pattern]).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["run1.txt", "run2.txt"]);
    }

    #[test]
    fn existing_file_with_brackets_is_literal() {
        let dir = tempdir().unwrap();
        let literal = write(dir.path(), "results[1].txt", RUN_A);
        write(dir.path(), "results1.txt", RUN_B);

        let spec = literal.display().to_string();
        let paths = resolve_inputs(&[spec]).unwrap();
        assert_eq!(paths, vec![literal]);
    }

    #[test]
    fn glob_without_matches_is_an_error() {
        let dir = tempdir().unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        let err = resolve_inputs(&[pattern]).unwrap_err();
        assert!(matches!(err, SummaryError::NoMatches { .. }));
        assert!(err.to_string().contains("matched no files"));
    }

    #[test]
    fn malformed_glob_is_an_error() {
        let err = resolve_inputs(&["runs/[.txt".to_string()]).unwrap_err();
        assert!(matches!(err, SummaryError::Pattern { .. }));
    }

    #[test]
    fn collect_pools_files() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.txt", RUN_A);
        let b = write(dir.path(), "b.txt", RUN_B);

        let store = collect(&[a, b], &ExtractConfig::default()).unwrap();
        assert_eq!(store.get(Metric::Accuracy).values, vec![0.90, 0.92]);
        assert_eq!(store.get(Metric::Macro).values, vec![0.86, 0.87]);
        assert_eq!(store.get(Metric::Weighted).values, vec![0.90, 0.91]);
    }

    #[test]
    fn collect_with_pattern_extractor_and_precision() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.txt", RUN_A);
        let cfg = ExtractConfig {
            extractor: ExtractorKind::Pattern,
            column: Column::Precision,
            on_malformed: MalformedPolicy::Fail,
        };
        let store = collect(&[a], &cfg).unwrap();
        assert_eq!(store.get(Metric::Accuracy).values, vec![0.90]);
        assert_eq!(store.get(Metric::Macro).values, vec![0.88]);
        assert_eq!(store.get(Metric::Weighted).values, vec![0.91]);
    }

    #[test]
    fn missing_file_is_file_access_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("results.txt");
        let err = collect(&[missing], &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, SummaryError::FileAccess { .. }));
        assert!(err.to_string().contains("results.txt"));
    }

    #[test]
    fn malformed_row_fails_with_location() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "bad.txt", "accuracy 0.9 10\nmacro avg 0.1 0.2 x 10\n");
        let err = collect(&[path], &ExtractConfig::default()).unwrap_err();
        match &err {
            SummaryError::Row { line, source, .. } => {
                assert_eq!(*line, 2);
                assert!(matches!(source, ExtractError::NumericParse { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("bad.txt:2:"));
    }

    #[test]
    fn malformed_row_skipped_when_configured() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "bad.txt",
            "accuracy 0.9 10\nmacro avg 0.1 0.2 x 10\nmacro avg 0.1 0.2 0.3 10\n",
        );
        let cfg = ExtractConfig {
            on_malformed: MalformedPolicy::Skip,
            ..Default::default()
        };
        let store = collect(&[path], &cfg).unwrap();
        assert_eq!(store.get(Metric::Macro).values, vec![0.3]);
        assert_eq!(store.get(Metric::Accuracy).values, vec![0.9]);
    }
}
