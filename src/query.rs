//! Query engine.
//!
//! Every evaluation classifies the raw query from scratch:
//!
//! * **Plain**: case-insensitive substring match against `domain` or `code`,
//!   in dataset order.
//! * **CSP directive**: the query mentions `script-src` or `default-src`, so
//!   it is read as a policy. Host terms are extracted from the effective
//!   source list (see [`crate::csp`]), each term is matched in turn and the
//!   union is deduplicated by `(domain, code)` in first-discovery order.
//!
//! The engine never fails; no match is expressed as an empty [`ResultSet`].

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::csp::{self, DEFAULT_SRC, Policy, SCRIPT_SRC, SourceDirective};
use crate::dataset::{Dataset, Record};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// How a query was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Plain,
    CspDirective,
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QueryMode::Plain => "plain",
            QueryMode::CspDirective => "csp",
        })
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Whitespace-collapsed, trimmed query (original case)
    pub query: String,
    pub mode: QueryMode,
    /// Directive whose sources were searched (CSP mode only)
    pub directive: Option<SourceDirective>,
    /// Host terms searched for (CSP mode only)
    pub terms: Vec<String>,
    /// Unique matches in discovery order
    pub records: Vec<Record>,
    /// Renderers prepend the `'unsafe-inline'` advisory when set
    pub show_unsafe_inline: bool,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

/// Classify a normalized query.
pub fn classify(normalized: &str) -> QueryMode {
    let lowered = normalized.to_lowercase();
    if lowered.contains(SCRIPT_SRC) || lowered.contains(DEFAULT_SRC) {
        QueryMode::CspDirective
    } else {
        QueryMode::Plain
    }
}

/// Run a query against a dataset snapshot.
pub fn search(dataset: &Dataset, raw_query: &str) -> ResultSet {
    let query = normalize(raw_query);
    if query.is_empty() {
        return ResultSet::default();
    }
    match classify(&query) {
        QueryMode::Plain => {
            let records = search_plain(dataset, &query);
            ResultSet {
                query,
                mode: QueryMode::Plain,
                records,
                ..Default::default()
            }
        }
        QueryMode::CspDirective => search_policy(dataset, query),
    }
}

fn search_plain(dataset: &Dataset, query: &str) -> Vec<Record> {
    let needle = query.to_lowercase();
    dataset
        .iter_folded()
        .filter(|(_, domain, code)| domain.contains(&needle) || code.contains(&needle))
        .map(|(record, _, _)| record.clone())
        .collect()
}

fn search_policy(dataset: &Dataset, query: String) -> ResultSet {
    let policy = Policy::parse(&query);
    let (directive, effective) = policy.effective_sources();
    let show_unsafe_inline = csp::shows_unsafe_inline(effective);
    let terms = csp::extract_terms(effective);
    let records = match_terms(dataset, &terms);

    ResultSet {
        query,
        mode: QueryMode::CspDirective,
        directive,
        terms,
        records,
        show_unsafe_inline,
    }
}

/// Union of the matches of every term, first discovery wins.
pub fn match_terms(dataset: &Dataset, terms: &[String]) -> Vec<Record> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut out = Vec::new();
    for term in terms {
        let needle = term.to_lowercase();
        for (record, domain, code) in dataset.iter_folded() {
            if (domain.contains(&needle) || code.contains(&needle))
                && seen.insert(record.identity())
            {
                out.push(record.clone());
            }
        }
    }
    out
}
