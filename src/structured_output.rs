//! Structured output module for JSON and YAML serialization.
//!
//! [`SearchOutput`] is the machine-readable form of a search: how the query
//! was interpreted, the advisory (if any), the matched records and some
//! statistics about the run. The JSON schema for it is generated from the
//! types with `schemars` (`--generate-schema`).

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::csp::SourceDirective;
use crate::dataset::Record;
use crate::output::{Advisory, SearchReport};
use crate::query::QueryMode;

/// Root structure for all cspbypass output in structured formats
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SearchOutput {
    /// Tool version and metadata
    pub metadata: OutputMetadata,

    /// How the query was interpreted
    pub input: InputInfo,

    /// Inline-script advisory, present when the policy allows inline
    /// scripts without a nonce or hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<AdvisoryInfo>,

    /// Matched dataset records, in discovery order
    pub results: Vec<Record>,

    /// Counts and timing
    pub statistics: SearchStatistics,

    /// Link restoring this query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_link: Option<String>,

    /// Dataset contributors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub credits: Vec<String>,

    /// Warnings encountered during processing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Tool metadata and versioning information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct OutputMetadata {
    /// Tool name
    pub tool_name: String,

    /// Tool version
    pub version: String,

    /// Timestamp when the search ran
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// Version of this output format
    pub schema_version: String,

    /// Where the dataset came from
    pub source: String,
}

/// Query as typed and as interpreted
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct InputInfo {
    /// Query after whitespace normalization
    pub query: String,

    /// Plain substring search or CSP interpretation
    pub mode: QueryMode,

    /// Directive whose source list was used (CSP mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<SourceDirective>,

    /// Host search terms derived from the policy (CSP mode only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<String>,
}

/// Rendered form of the `'unsafe-inline'` advisory
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AdvisoryInfo {
    pub title: String,
    pub payload: String,
    pub note: String,
}

impl From<&Advisory> for AdvisoryInfo {
    fn from(advisory: &Advisory) -> Self {
        Self {
            title: advisory.title.to_string(),
            payload: advisory.payload.to_string(),
            note: advisory.note.to_string(),
        }
    }
}

/// Search statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SearchStatistics {
    /// Records in the dataset that was searched
    pub dataset_records: usize,

    /// Records that matched
    pub matched: usize,

    /// Records included in this output (after the result limit)
    pub returned: usize,

    /// Time spent searching, in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_time_us: Option<u64>,
}

impl SearchOutput {
    /// Create an empty output structure with basic metadata
    pub fn new() -> Self {
        Self {
            metadata: OutputMetadata {
                tool_name: "cspbypass".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: chrono::Utc::now(),
                schema_version: "1.0.0".to_string(),
                source: String::new(),
            },
            input: InputInfo {
                query: String::new(),
                mode: QueryMode::Plain,
                directive: None,
                terms: Vec::new(),
            },
            advisory: None,
            results: Vec::new(),
            statistics: SearchStatistics::default(),
            share_link: None,
            credits: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Build the structured form of a rendered report
    pub fn from_report(report: &SearchReport) -> Self {
        let results = &report.results;
        let meta = &report.metadata;
        let mut output = Self::new();

        output.metadata.source = meta.source.clone();
        output.input = InputInfo {
            query: results.query.clone(),
            mode: results.mode,
            directive: results.directive,
            terms: results.terms.clone(),
        };
        output.advisory = report.advisory().map(AdvisoryInfo::from);
        output.results = results.records.clone();
        output.statistics = SearchStatistics {
            dataset_records: meta.dataset_size,
            matched: meta.total_matches,
            returned: results.records.len(),
            search_time_us: meta.duration_us,
        };
        output.share_link = meta.share_link.clone();
        output.credits = meta
            .credits
            .as_ref()
            .map(|c| c.names().to_vec())
            .unwrap_or_default();
        output.warnings = meta.warnings.clone();
        output
    }

    /// Generate JSON schema for this output format
    pub fn generate_json_schema() -> Result<String> {
        let schema = schemars::schema_for!(SearchOutput);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for SearchOutput {
    fn default() -> Self {
        Self::new()
    }
}
