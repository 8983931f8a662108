//! cspbypass Library
//!
//! Search a dataset of Content-Security-Policy bypass gadgets. A query is
//! either plain text (matched against entry domains and payloads) or a
//! pasted policy, in which case the `script-src` (or `default-src`) host
//! sources are turned into search terms. This library provides:
//!
//! - Parsing of the tab-separated dataset (`dataset`)
//! - Policy interpretation and term extraction (`csp`)
//! - The query engine (`query`) and a reloadable catalog (`facade`)
//! - Pluggable sources for the dataset and credits (`sources`)
//! - Text, TSV, HTML, JSON and YAML rendering
//!
//! # Example
//!
//! ```rust
//! use cspbypass::dataset::parse;
//! use cspbypass::query::search;
//!
//! let dataset = parse("Domain\tCode\nwww.google.com\t<script src=\"https://www.google.com/x\"></script>\n");
//! let results = search(&dataset, "script-src 'self' https://*.google.com");
//! assert_eq!(results.len(), 1);
//! assert_eq!(results.terms, vec![".google.com".to_string()]);
//! ```

// Re-export all modules for library use
pub mod app;
pub mod cli;
pub mod config;
pub mod credits;
pub mod csp;
pub mod dataset;
pub mod debounce;
pub mod errors;
pub mod facade;
pub mod logging;
pub mod output;
pub mod query;
pub mod share;
pub mod sources;
pub mod structured_output;
pub mod styled_output;

// Re-export commonly used types and functions for convenience
pub use credits::Credits;
pub use csp::{Policy, SourceDirective};
pub use dataset::{Dataset, Record};
pub use debounce::Debouncer;
pub use errors::{CspBypassError, ErrorCategory, Result};
pub use facade::Catalog;
pub use output::{OutputFormat, SearchReport};
pub use query::{QueryMode, ResultSet, search};
pub use sources::{DirectorySource, GithubSource, TextSource};
pub use styled_output::StyledFormatter;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
