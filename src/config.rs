//! Runtime configuration, read once at startup from environment variables.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::classifier::{ClassifierBackend, ClassifierConfig, zero_shot};
use crate::error::ConfigError;
use crate::pipeline::History;
use crate::taxonomy::Taxonomy;

const DEFAULT_INPUT_DIR: &str = "./data/emails";
const DEFAULT_OUTPUT_PATH: &str = "./result/output.json";

/// Application configuration for a batch run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory scanned for `.eml` files.
    pub input_dir: PathBuf,
    /// Where the JSON results are written.
    pub output_path: PathBuf,
    pub classifier: ClassifierConfig,
    /// Optional JSON taxonomy replacing the built-in tables.
    pub taxonomy_path: Option<PathBuf>,
    /// Maximum duplicate-history entries (unbounded when `None`).
    pub history_limit: Option<NonZeroUsize>,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (environment, map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let input_dir = lookup("LOAN_TRIAGE_INPUT_DIR")
            .unwrap_or_else(|| DEFAULT_INPUT_DIR.to_string())
            .into();
        let output_path = lookup("LOAN_TRIAGE_OUTPUT")
            .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string())
            .into();

        let backend = match lookup("LOAN_TRIAGE_CLASSIFIER") {
            Some(value) => value.parse()?,
            None => ClassifierBackend::Keyword,
        };

        let endpoint = lookup("LOAN_TRIAGE_ZERO_SHOT_URL")
            .unwrap_or_else(|| zero_shot::DEFAULT_ENDPOINT.to_string());
        let api_token = lookup("HF_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(secrecy::SecretString::from);

        if backend == ClassifierBackend::ZeroShot && api_token.is_none() {
            return Err(ConfigError::MissingEnvVar("HF_API_TOKEN".into()));
        }

        let timeout_secs: u64 = match lookup("LOAN_TRIAGE_CLASSIFIER_TIMEOUT_SECS") {
            Some(value) => parse_positive("LOAN_TRIAGE_CLASSIFIER_TIMEOUT_SECS", &value)?.get() as u64,
            None => zero_shot::DEFAULT_TIMEOUT_SECS,
        };

        let taxonomy_path = lookup("LOAN_TRIAGE_TAXONOMY")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let history_limit = lookup("LOAN_TRIAGE_HISTORY_LIMIT")
            .map(|value| parse_positive("LOAN_TRIAGE_HISTORY_LIMIT", &value))
            .transpose()?;

        Ok(Self {
            input_dir,
            output_path,
            classifier: ClassifierConfig {
                backend,
                endpoint,
                api_token,
                timeout: Duration::from_secs(timeout_secs),
            },
            taxonomy_path,
            history_limit,
        })
    }

    /// Positional arguments override paths: `[input_dir] [output_path]`.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        let mut args = args.into_iter();
        if let Some(input) = args.next() {
            self.input_dir = input.into();
        }
        if let Some(output) = args.next() {
            self.output_path = output.into();
        }
        self
    }

    /// Built-in taxonomy, or the configured file (validated).
    pub fn load_taxonomy(&self) -> Result<Taxonomy, ConfigError> {
        match &self.taxonomy_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading taxonomy");
                Taxonomy::load(path)
            }
            None => Ok(Taxonomy::builtin()),
        }
    }

    /// Fresh session history honouring the configured limit.
    pub fn new_history(&self) -> History {
        match self.history_limit {
            Some(limit) => History::with_limit(limit),
            None => History::new(),
        }
    }
}

fn parse_positive(key: &str, value: &str) -> Result<NonZeroUsize, ConfigError> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value:?} is not a positive integer: {e}"),
        })
}
