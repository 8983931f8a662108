use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line interface definition.
/// Search a CSP bypass dataset by domain/payload text or by pasting a policy.
///
/// Verbosity levels:
/// 0 - silent (only final output)
/// 1 - errors (default)
/// 2 - warnings + errors
/// 3 - info
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Find CSP bypass gadgets for a domain, a payload snippet or a pasted script-src/default-src policy"
)]
pub struct Cli {
    /// Search text, or a policy such as "script-src 'self' *.googleapis.com".
    /// Omit with --interactive or --from-link.
    pub query: Option<String>,

    /// Read data.tsv and credits.txt from this directory instead of GitHub
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Repository owner hosting the dataset
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name hosting the dataset
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch (or any git ref) to read the dataset from
    #[arg(long)]
    pub branch: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Plain text output instead of the styled layout
    #[arg(long)]
    pub plain: bool,

    /// Disable colors in styled output
    #[arg(long)]
    pub no_color: bool,

    /// Show at most this many results (0 = all)
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Delay before an interactive edit is evaluated, in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Also load and print the contributor credits
    #[arg(long)]
    pub credits: bool,

    /// Print a shareable link for the query
    #[arg(long)]
    pub link: bool,

    /// Restore the query from a shareable link
    #[arg(long, value_name = "URL", conflicts_with = "query")]
    pub from_link: Option<String>,

    /// Read queries from stdin, one edit per line
    #[arg(long, short = 'i', conflicts_with_all = ["query", "from_link"])]
    pub interactive: bool,

    /// Print the JSON schema of the structured output and exit
    #[arg(long)]
    pub generate_schema: bool,

    /// Verbosity level (0,1,2,3,5)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,
}

/// Output formats selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (styled on a terminal unless --plain)
    Text,
    /// Tab-separated rows in the dataset layout
    Tsv,
    /// HTML list fragment with escaped payloads
    Html,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Are info-level messages enabled?
    pub fn info_enabled(&self) -> bool {
        self.verbose >= 3
    }

    /// Are error-level messages enabled?
    pub fn error_enabled(&self) -> bool {
        self.verbose >= 1
    }

    /// Styled layout applies to text output unless --plain was given.
    pub fn should_use_styling(&self) -> bool {
        self.format == OutputFormat::Text && !self.plain
    }
}
