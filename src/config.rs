//! Configuration management for cspbypass.
//!
//! Structured configuration options that can be loaded from environment
//! variables or command-line arguments. It centralizes where the dataset is
//! fetched from, the request timeout, the input debounce delay and output
//! preferences.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main configuration structure for cspbypass.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Where the dataset and credits come from
    pub source: SourceConfig,

    /// Query handling
    pub search: SearchConfig,

    /// Output preferences
    pub output: OutputConfig,
}

/// Dataset location and transport settings
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// GitHub REST API base URL
    pub api_base: String,

    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch (or any git ref) to read from
    pub branch: String,

    /// Path of the TSV dataset inside the repository
    pub data_path: String,

    /// Path of the credits file inside the repository
    pub credits_path: String,

    /// Read files from this local directory instead of GitHub
    pub local_dir: Option<PathBuf>,

    /// Timeout for each HTTP request
    pub request_timeout: Duration,

    /// User agent sent to the API (GitHub rejects requests without one)
    pub user_agent: String,
}

/// Query handling configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Quiet period before an edited query is evaluated
    pub debounce_delay: Duration,
}

/// Output and rendering configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Maximum number of records to render (0 = unlimited)
    pub max_results: usize,

    /// Page that share links point to
    pub share_base_url: String,

    /// Print contributor credits after the results
    pub show_credits: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: "renniepak".to_string(),
            repo: "CSPBypass".to_string(),
            branch: "main".to_string(),
            data_path: "data.tsv".to_string(),
            credits_path: "credits.txt".to_string(),
            local_dir: None,
            request_timeout: Duration::from_secs(10),
            user_agent: format!("cspbypass/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(300),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_results: 0, // unlimited
            share_base_url: "https://cspbypass.com/".to_string(),
            show_credits: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup (environment-like).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Source location
        if let Some(v) = lookup("CSPBYPASS_API_BASE") {
            config.source.api_base = v;
        }
        if let Some(v) = lookup("CSPBYPASS_OWNER") {
            config.source.owner = v;
        }
        if let Some(v) = lookup("CSPBYPASS_REPO") {
            config.source.repo = v;
        }
        if let Some(v) = lookup("CSPBYPASS_BRANCH") {
            config.source.branch = v;
        }
        if let Some(v) = lookup("CSPBYPASS_DATA_PATH") {
            config.source.data_path = v;
        }
        if let Some(v) = lookup("CSPBYPASS_CREDITS_PATH") {
            config.source.credits_path = v;
        }
        if let Some(v) = lookup("CSPBYPASS_DATA_DIR") {
            config.source.local_dir = Some(PathBuf::from(v));
        }
        if let Some(timeout) = lookup("CSPBYPASS_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse::<u64>()
        {
            config.source.request_timeout = Duration::from_secs(secs);
        }

        // Search
        if let Some(delay) = lookup("CSPBYPASS_DEBOUNCE_MS")
            && let Ok(ms) = delay.parse::<u64>()
        {
            config.search.debounce_delay = Duration::from_millis(ms);
        }

        // Output preferences
        if let Some(max_results) = lookup("CSPBYPASS_MAX_RESULTS")
            && let Ok(max) = max_results.parse::<usize>()
        {
            config.output.max_results = max;
        }
        if let Some(v) = lookup("CSPBYPASS_SHARE_URL") {
            config.output.share_base_url = v;
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref dir) = cli.data_dir {
            self.source.local_dir = Some(dir.clone());
        }
        if let Some(ref owner) = cli.owner {
            self.source.owner = owner.clone();
        }
        if let Some(ref repo) = cli.repo {
            self.source.repo = repo.clone();
        }
        if let Some(ref branch) = cli.branch {
            self.source.branch = branch.clone();
        }
        if let Some(limit) = cli.limit {
            self.output.max_results = limit;
        }
        if let Some(ms) = cli.debounce_ms {
            self.search.debounce_delay = Duration::from_millis(ms);
        }
        if cli.credits {
            self.output.show_credits = true;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("source.owner", &self.source.owner),
            ("source.repo", &self.source.repo),
            ("source.branch", &self.source.branch),
            ("source.data_path", &self.source.data_path),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: "Must not be empty".to_string(),
                });
            }
        }

        if self.source.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "source.request_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.source.local_dir.is_none() {
            url::Url::parse(&self.source.api_base).map_err(|e| ConfigError::InvalidValue {
                field: "source.api_base".to_string(),
                value: self.source.api_base.clone(),
                reason: e.to_string(),
            })?;
        }

        url::Url::parse(&self.output.share_base_url).map_err(|e| ConfigError::InvalidValue {
            field: "output.share_base_url".to_string(),
            value: self.output.share_base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Human-readable description of where data is loaded from.
    pub fn source_label(&self) -> String {
        match self.source.local_dir {
            Some(ref dir) => dir.display().to_string(),
            None => format!(
                "github.com/{}/{}@{}",
                self.source.owner, self.source.repo, self.source.branch
            ),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}
