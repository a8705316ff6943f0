use crate::extract::{Column, ExtractorKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from summary.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SummaryConfig {
    pub input: InputConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Report files or glob patterns; all matches are pooled.
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ExtractConfig {
    pub extractor: ExtractorKind,
    pub column: Column,
    pub on_malformed: MalformedPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub mean_digits: u32,
    pub std_digits: u32,
    pub max_digits: u32,
    pub dump_values: bool,
}

/// What to do with a recognized row whose value cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Abort the run on the first bad row.
    #[default]
    Fail,
    /// Log a warning and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            paths: vec!["results.txt".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            mean_digits: 3,
            std_digits: 2,
            max_digits: 3,
            dump_values: true,
        }
    }
}

impl SummaryConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors from loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
