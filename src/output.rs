//! Output formatting for search results.
//!
//! This module provides the line-oriented output formats: human-readable
//! text, tab-separated rows (same layout as the dataset), and an HTML list
//! fragment. JSON and YAML go through `structured_output`, colored terminal
//! output through `styled_output`.
//!
//! Every human-facing format puts the `'unsafe-inline'` advisory ahead of
//! the matched records when the result set asks for it.

use std::io;

use crate::credits::Credits;
use crate::dataset::Record;
use crate::query::{QueryMode, ResultSet};

/// Fixed entry rendered ahead of the results when the policy allows inline
/// scripts without a nonce or hash. Not a dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    pub title: &'static str,
    pub payload: &'static str,
    pub note: &'static str,
}

pub const UNSAFE_INLINE_ADVISORY: Advisory = Advisory {
    title: "'unsafe-inline'",
    payload: "<script>alert(document.domain)</script>",
    note: "The policy allows inline scripts and has no nonce or hash source, so any HTML injection executes directly.",
};

/// A finished search plus the context needed to render it.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub results: ResultSet,
    pub metadata: ReportMetadata,
}

/// Context about how the results were produced.
#[derive(Debug, Clone, Default)]
pub struct ReportMetadata {
    /// Where the dataset came from
    pub source: String,

    /// Records in the dataset snapshot that was searched
    pub dataset_size: usize,

    /// Matches before `max_results` was applied
    pub total_matches: usize,

    /// How long the search took
    pub duration_us: Option<u64>,

    /// Link restoring this query
    pub share_link: Option<String>,

    /// Contributor credits to print after the results
    pub credits: Option<Credits>,

    /// Non-fatal problems (e.g. a failed dataset load)
    pub warnings: Vec<String>,
}

impl SearchReport {
    /// Wrap a result set, keeping at most `max_results` records (0 = all).
    pub fn new(mut results: ResultSet, max_results: usize) -> Self {
        let total_matches = results.records.len();
        if max_results > 0 {
            results.records.truncate(max_results);
        }
        Self {
            results,
            metadata: ReportMetadata {
                total_matches,
                ..Default::default()
            },
        }
    }

    pub fn advisory(&self) -> Option<&'static Advisory> {
        self.results
            .show_unsafe_inline
            .then_some(&UNSAFE_INLINE_ADVISORY)
    }

    pub fn is_truncated(&self) -> bool {
        self.metadata.total_matches > self.results.records.len()
    }
}

/// Output format options
#[derive(Debug, Clone)]
pub enum OutputFormat {
    /// Human-readable text format
    Text {
        /// Show the author of each entry
        show_author: bool,
        /// Show how the query was interpreted
        show_metadata: bool,
    },

    /// One `domain<TAB>code<TAB>author` row per record
    Tsv,

    /// `<li>` list fragment
    Html,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text {
            show_author: true,
            show_metadata: false,
        }
    }
}

/// Output formatter trait
pub trait OutputFormatter {
    /// Format the report
    fn format_report(&self, report: &SearchReport) -> io::Result<String>;

    /// Get the file extension for this format
    fn file_extension(&self) -> &'static str;
}

/// Text output formatter
pub struct TextFormatter {
    show_author: bool,
    show_metadata: bool,
}

impl TextFormatter {
    pub fn new(show_author: bool, show_metadata: bool) -> Self {
        Self {
            show_author,
            show_metadata,
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_report(&self, report: &SearchReport) -> io::Result<String> {
        let results = &report.results;
        let mut output = String::new();

        if self.show_metadata {
            output.push_str(&format!("Query: {}\n", results.query));
            output.push_str(&format!("Mode: {}", results.mode));
            if let Some(directive) = results.directive {
                output.push_str(&format!(" ({directive})"));
            }
            output.push('\n');
            if results.mode == QueryMode::CspDirective {
                output.push_str(&format!("Terms: {}\n", results.terms.join(", ")));
            }
            if !report.metadata.source.is_empty() {
                output.push_str(&format!(
                    "Dataset: {} records from {}\n",
                    report.metadata.dataset_size, report.metadata.source
                ));
            }
            output.push('\n');
        }

        if let Some(advisory) = report.advisory() {
            output.push_str(&format!("[!] {}\n", advisory.title));
            output.push_str(&format!("    {}\n", advisory.payload));
            output.push_str(&format!("    {}\n\n", advisory.note));
        }

        if results.records.is_empty() {
            if !results.query.is_empty() {
                output.push_str(&format!("No results for {}\n", results.query));
            }
        } else {
            for record in &results.records {
                output.push_str(&format!("{}\n", record.domain));
                output.push_str(&format!("    {}\n", record.code));
                if self.show_author
                    && let Some(author) = record.author()
                {
                    output.push_str(&format!("    (by {author})\n"));
                }
                output.push('\n');
            }
        }

        if report.is_truncated() {
            output.push_str(&format!(
                "... {} more result(s) not shown\n",
                report.metadata.total_matches - results.records.len()
            ));
        }

        if let Some(ref link) = report.metadata.share_link {
            output.push_str(&format!("Share: {link}\n"));
        }

        if let Some(ref credits) = report.metadata.credits
            && !credits.is_empty()
        {
            output.push_str(&format!("Credits: {credits}\n"));
        }

        if self.show_metadata && !report.metadata.warnings.is_empty() {
            output.push('\n');
            output.push_str("Warnings:\n");
            for warning in &report.metadata.warnings {
                output.push_str(&format!("  {}\n", warning));
            }
        }

        Ok(output)
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

/// Tab-separated output formatter (dataset layout, no header)
pub struct TsvFormatter;

impl OutputFormatter for TsvFormatter {
    fn format_report(&self, report: &SearchReport) -> io::Result<String> {
        let mut output = String::new();
        if let Some(advisory) = report.advisory() {
            output.push_str(&format!("{}\t{}\t\n", advisory.title, advisory.payload));
        }
        for record in &report.results.records {
            output.push_str(&tsv_row(record));
        }
        Ok(output)
    }

    fn file_extension(&self) -> &'static str {
        "tsv"
    }
}

fn tsv_row(record: &Record) -> String {
    format!("{}\t{}\t{}\n", record.domain, record.code, record.author)
}

/// HTML list formatter: every field is escaped, payloads are shown, never run.
pub struct HtmlFormatter;

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &SearchReport) -> io::Result<String> {
        let mut output = String::new();
        if let Some(advisory) = report.advisory() {
            output.push_str(&format!(
                "<li class=\"advisory\"><strong>{}</strong><br><br>{}<br><br><em>{}</em></li>\n",
                html_escape(advisory.title),
                html_escape(advisory.payload),
                html_escape(advisory.note)
            ));
        }
        for record in &report.results.records {
            output.push_str(&format!(
                "<li><strong>{}</strong><br><br>{}</li>\n",
                html_escape(&record.domain),
                html_escape(&record.code)
            ));
        }
        Ok(output)
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }
}

/// Escape text for use in HTML element content and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Create a formatter based on the output format
pub fn create_formatter(format: &OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text {
            show_author,
            show_metadata,
        } => Box::new(TextFormatter::new(*show_author, *show_metadata)),
        OutputFormat::Tsv => Box::new(TsvFormatter),
        OutputFormat::Html => Box::new(HtmlFormatter),
    }
}
