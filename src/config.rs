use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Rusty Digest pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend used to run the summarization model.
    pub summarization_provider: SummarizationProvider,
    /// Base URL of the summarization backend.
    pub summarization_url: String,
    /// Model identifier passed to the backend.
    pub summarization_model: String,
    /// Optional bearer token for hosted inference endpoints.
    pub summarization_api_key: Option<String>,
    /// Per-request timeout applied to model calls.
    pub summarization_timeout_secs: u64,
    /// Whether the combined summary is summarized a second time.
    pub summary_mode: SummaryMode,
    /// Budget applied to each chunk, measured in `chunk_budget_unit`.
    pub chunk_max_size: usize,
    /// Unit the chunk budget is measured in.
    pub chunk_budget_unit: BudgetUnit,
    /// Tokenizer encoding used when `chunk_budget_unit` is `tokens`.
    pub chunk_tokenizer: String,
    /// Hard word cap applied to each chunk before it reaches the model.
    pub summary_input_max_words: usize,
    /// Generation bounds for per-chunk summaries.
    pub summary_max_length: usize,
    /// Minimum generation length for per-chunk summaries.
    pub summary_min_length: usize,
    /// Character budget for the text submitted to the final pass.
    pub reduce_max_chars: usize,
    /// Generation bounds for the final pass.
    pub reduce_max_length: usize,
    /// Minimum generation length for the final pass.
    pub reduce_min_length: usize,
    /// Whether extracted text is normalized before chunking.
    pub text_cleaning: bool,
    /// Number of characters shown in extracted text previews.
    pub preview_max_chars: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hugging Face style inference endpoint (`/models/{model}`).
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
}

/// Aggregation strategy applied to the per-chunk summaries.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryMode {
    /// The joined chunk summaries are the final summary.
    SingleStage,
    /// The joined chunk summaries are summarized once more.
    TwoStage,
}

/// Unit used when measuring chunk sizes.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    /// Whitespace-delimited words.
    Words,
    /// BPE tokens from the configured tokenizer.
    Tokens,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summarization_provider = parse_env_or(
            "SUMMARIZATION_PROVIDER",
            SummarizationProvider::HuggingFace,
        )?;
        let summarization_url = load_env_optional("SUMMARIZATION_URL").unwrap_or_else(|| {
            match summarization_provider {
                SummarizationProvider::HuggingFace => DEFAULT_HUGGINGFACE_URL.to_string(),
                SummarizationProvider::Ollama => DEFAULT_OLLAMA_URL.to_string(),
            }
        });

        let config = Self {
            summarization_provider,
            summarization_url,
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            summarization_api_key: load_env_optional("SUMMARIZATION_API_KEY"),
            summarization_timeout_secs: parse_env_or("SUMMARIZATION_TIMEOUT_SECS", 120)?,
            summary_mode: parse_env_or("SUMMARY_MODE", SummaryMode::TwoStage)?,
            chunk_max_size: parse_env_or("CHUNK_MAX_SIZE", 1000)?,
            chunk_budget_unit: parse_env_or("CHUNK_BUDGET_UNIT", BudgetUnit::Words)?,
            chunk_tokenizer: load_env_optional("CHUNK_TOKENIZER")
                .unwrap_or_else(|| "cl100k_base".to_string()),
            summary_input_max_words: parse_env_or("SUMMARY_INPUT_MAX_WORDS", 400)?,
            summary_max_length: parse_env_or("SUMMARY_MAX_LENGTH", 150)?,
            summary_min_length: parse_env_or("SUMMARY_MIN_LENGTH", 40)?,
            reduce_max_chars: parse_env_or("REDUCE_MAX_CHARS", 1024)?,
            reduce_max_length: parse_env_or("REDUCE_MAX_LENGTH", 200)?,
            reduce_min_length: parse_env_or("REDUCE_MIN_LENGTH", 60)?,
            text_cleaning: parse_bool_env_or("TEXT_CLEANING", true)?,
            preview_max_chars: parse_env_or("PREVIEW_MAX_CHARS", 3000)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_max_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_MAX_SIZE".into()));
        }
        if self.summary_input_max_words == 0 {
            return Err(ConfigError::InvalidValue("SUMMARY_INPUT_MAX_WORDS".into()));
        }
        if self.reduce_max_chars == 0 {
            return Err(ConfigError::InvalidValue("REDUCE_MAX_CHARS".into()));
        }
        if self.summary_min_length > self.summary_max_length {
            return Err(ConfigError::InvalidValue("SUMMARY_MIN_LENGTH".into()));
        }
        if self.reduce_min_length > self.reduce_max_length {
            return Err(ConfigError::InvalidValue("REDUCE_MIN_LENGTH".into()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summarization_provider: SummarizationProvider::HuggingFace,
            summarization_url: DEFAULT_HUGGINGFACE_URL.to_string(),
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            summarization_api_key: None,
            summarization_timeout_secs: 120,
            summary_mode: SummaryMode::TwoStage,
            chunk_max_size: 1000,
            chunk_budget_unit: BudgetUnit::Words,
            chunk_tokenizer: "cl100k_base".to_string(),
            summary_input_max_words: 400,
            summary_max_length: 150,
            summary_min_length: 40,
            reduce_max_chars: 1024,
            reduce_max_length: 200,
            reduce_min_length: 60,
            text_cleaning: true,
            preview_max_chars: 3000,
            server_port: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn parse_bool_env_or(key: &str, default: bool) -> Result<bool, ConfigError> {
    match load_env_optional(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key.to_string())),
        },
        None => Ok(default),
    }
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl FromStr for SummaryMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "single" | "single-stage" => Ok(Self::SingleStage),
            "two-stage" | "two" | "map-reduce" => Ok(Self::TwoStage),
            _ => Err(()),
        }
    }
}

impl FromStr for BudgetUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "words" | "word" => Ok(Self::Words),
            "tokens" | "token" => Ok(Self::Tokens),
            _ => Err(()),
        }
    }
}

impl SummaryMode {
    /// Stable label used in responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleStage => "single-stage",
            Self::TwoStage => "two-stage",
        }
    }
}

impl BudgetUnit {
    /// Stable label used in responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Tokens => "tokens",
        }
    }
}

impl SummarizationProvider {
    /// Stable label used in responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Ollama => "ollama",
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        provider = config.summarization_provider.as_str(),
        url = %config.summarization_url,
        model = %config.summarization_model,
        mode = config.summary_mode.as_str(),
        chunk_max_size = config.chunk_max_size,
        unit = ?config.chunk_budget_unit,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    // A second initialization keeps the first configuration.
    let _ = CONFIG.set(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mode_parses_aliases() {
        assert_eq!("single".parse::<SummaryMode>(), Ok(SummaryMode::SingleStage));
        assert_eq!("two_stage".parse::<SummaryMode>(), Ok(SummaryMode::TwoStage));
        assert_eq!("Two-Stage".parse::<SummaryMode>(), Ok(SummaryMode::TwoStage));
        assert!("three".parse::<SummaryMode>().is_err());
    }

    #[test]
    fn provider_and_unit_parse_case_insensitively() {
        assert_eq!("HF".parse::<SummarizationProvider>(), Ok(SummarizationProvider::HuggingFace));
        assert_eq!("Ollama".parse::<SummarizationProvider>(), Ok(SummarizationProvider::Ollama));
        assert_eq!("TOKENS".parse::<BudgetUnit>(), Ok(BudgetUnit::Tokens));
        assert!("bytes".parse::<BudgetUnit>().is_err());
    }

    #[test]
    fn default_config_matches_reference_parameters() {
        let config = Config::default();
        assert_eq!(config.chunk_max_size, 1000);
        assert_eq!(config.summary_max_length, 150);
        assert_eq!(config.summary_min_length, 40);
        assert_eq!(config.reduce_max_chars, 1024);
        assert_eq!(config.preview_max_chars, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_lengths() {
        let config = Config {
            summary_min_length: 200,
            summary_max_length: 100,
            ..Config::default()
        };
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SUMMARY_MIN_LENGTH"));
    }

    #[test]
    fn validate_rejects_zero_budgets() {
        let cases = [
            (
                Config {
                    chunk_max_size: 0,
                    ..Config::default()
                },
                "CHUNK_MAX_SIZE",
            ),
            (
                Config {
                    summary_input_max_words: 0,
                    ..Config::default()
                },
                "SUMMARY_INPUT_MAX_WORDS",
            ),
            (
                Config {
                    reduce_max_chars: 0,
                    ..Config::default()
                },
                "REDUCE_MAX_CHARS",
            ),
        ];
        for (config, expected) in cases {
            let error = config.validate().unwrap_err();
            assert!(matches!(error, ConfigError::InvalidValue(ref key) if key == expected));
        }
    }
}
