//! Content-Security-Policy interpretation.
//!
//! Turns a pasted policy into the inputs of a dataset lookup:
//!
//! - the *effective* script source list (`script-src`, falling back to
//!   `default-src`)
//! - whether the `'unsafe-inline'` advisory applies
//! - the host search terms derived from the source expressions
//!
//! Wildcard hosts are reduced with a suffix heuristic rather than a real CSP
//! source matcher: `https://*.cdn.example.com` becomes `.cdn.example.com`,
//! which is then matched as a plain substring against dataset entries.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCRIPT_SRC: &str = "script-src";
pub const DEFAULT_SRC: &str = "default-src";
pub const UNSAFE_INLINE: &str = "'unsafe-inline'";

/// Header names users tend to paste along with the policy.
const HEADER_PREFIXES: &[&str] = &[
    "content-security-policy-report-only:",
    "content-security-policy:",
];

static NONCE_OR_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^'?(nonce-|sha256-|sha384-|sha512-)").unwrap());

static DOT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());

/// Directive whose source list drove the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SourceDirective {
    ScriptSrc,
    DefaultSrc,
}

impl SourceDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDirective::ScriptSrc => SCRIPT_SRC,
            SourceDirective::DefaultSrc => DEFAULT_SRC,
        }
    }
}

impl std::fmt::Display for SourceDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed policy: lowercased directive name -> raw value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    directives: HashMap<String, String>,
}

impl Policy {
    /// Parse a `;` separated policy. Later directives with the same name
    /// replace earlier ones. Never fails; junk yields junk directive names
    /// that nothing looks up.
    pub fn parse(input: &str) -> Self {
        let mut body = input.trim();
        let lowered = body.to_ascii_lowercase();
        for prefix in HEADER_PREFIXES {
            if lowered.starts_with(prefix) {
                body = body[prefix.len()..].trim_start();
                break;
            }
        }

        let mut directives = HashMap::new();
        for directive in body.split(';') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            let (name, value) = match directive.split_once(char::is_whitespace) {
                Some((name, value)) => (name, value.trim()),
                None => (directive, ""),
            };
            directives.insert(name.to_ascii_lowercase(), value.to_string());
        }
        Self { directives }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Source list governing scripts, with the directive it came from.
    pub fn effective_sources(&self) -> (Option<SourceDirective>, &str) {
        if let Some(v) = self.get(SCRIPT_SRC) {
            (Some(SourceDirective::ScriptSrc), v)
        } else if let Some(v) = self.get(DEFAULT_SRC) {
            (Some(SourceDirective::DefaultSrc), v)
        } else {
            (None, "")
        }
    }
}

/// `'unsafe-inline'` is only worth flagging when no nonce or hash source
/// accompanies it; browsers ignore it in that case.
pub fn shows_unsafe_inline(effective: &str) -> bool {
    let mut unsafe_inline = false;
    for token in effective.split_whitespace() {
        if NONCE_OR_HASH.is_match(token) {
            return false;
        }
        if token.eq_ignore_ascii_case(UNSAFE_INLINE) {
            unsafe_inline = true;
        }
    }
    unsafe_inline
}

/// Drop a leading `http://` or `https://`; schemes are case-insensitive.
fn strip_scheme(token: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if token
            .get(..scheme.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(scheme))
        {
            return &token[scheme.len()..];
        }
    }
    token
}

/// Reduce a wildcard host expression to the suffix searched for.
///
/// Keeps the last two `*`-separated segments, forces a leading dot and
/// collapses dot runs: `*.cdn.example.com` -> `.cdn.example.com`,
/// `https://*.a.*.example.com` -> `.a.example.com`, `*.example.com/*` ->
/// `.example.com/`.
pub fn normalize_wildcard(token: &str) -> String {
    let host = strip_scheme(token);
    let segments: Vec<&str> = host.split('*').collect();
    let tail = segments[segments.len().saturating_sub(2)..].concat();
    let dotted = if tail.starts_with('.') {
        tail
    } else {
        format!(".{tail}")
    };
    DOT_RUN.replace_all(&dotted, ".").into_owned()
}

/// Turn one source expression into a search term, if it names a host.
pub fn term_for(token: &str) -> Option<String> {
    if token.starts_with('\'') {
        // keyword, nonce and hash sources
        return None;
    }
    if !token.contains('.') && !token.contains('*') {
        return None;
    }
    let term = if token.contains('*') {
        normalize_wildcard(token)
    } else {
        strip_scheme(token).to_string()
    };
    Some(term.to_lowercase())
}

/// Search terms of a source list, deduplicated in first-occurrence order.
pub fn extract_terms(effective: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    effective
        .split(' ')
        .filter_map(term_for)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directives_case_insensitively() {
        let policy = Policy::parse("Script-Src 'self' https://a.com; img-src *");
        assert_eq!(policy.get("script-src"), Some("'self' https://a.com"));
        assert_eq!(policy.get("IMG-SRC"), Some("*"));
        assert_eq!(policy.get("object-src"), None);
    }

    #[test]
    fn later_directive_overwrites_earlier() {
        let policy = Policy::parse("script-src a.com; script-src b.com");
        assert_eq!(policy.get(SCRIPT_SRC), Some("b.com"));
    }

    #[test]
    fn header_name_is_stripped() {
        let policy = Policy::parse("Content-Security-Policy: default-src 'self' cdn.x.com");
        assert_eq!(policy.get(DEFAULT_SRC), Some("'self' cdn.x.com"));
        let report = Policy::parse("content-security-policy-report-only: script-src x.io");
        assert_eq!(report.get(SCRIPT_SRC), Some("x.io"));
    }

    #[test]
    fn directive_without_value_is_empty() {
        let policy = Policy::parse("script-src");
        assert_eq!(policy.effective_sources(), (Some(SourceDirective::ScriptSrc), ""));
    }

    #[test]
    fn script_src_wins_over_default_src() {
        let policy = Policy::parse("default-src d.com; script-src s.com");
        assert_eq!(
            policy.effective_sources(),
            (Some(SourceDirective::ScriptSrc), "s.com")
        );
        let fallback = Policy::parse("default-src d.com; img-src i.com");
        assert_eq!(
            fallback.effective_sources(),
            (Some(SourceDirective::DefaultSrc), "d.com")
        );
        assert_eq!(Policy::parse("img-src i.com").effective_sources(), (None, ""));
    }

    #[test]
    fn drops_non_domain_tokens() {
        let terms = extract_terms("'self' 'unsafe-inline' https://cdn.example.com");
        assert_eq!(terms, vec!["cdn.example.com"]);
    }

    #[test]
    fn scheme_only_and_keyword_tokens_are_ignored() {
        assert!(extract_terms("https: data: blob: 'none'").is_empty());
        assert!(extract_terms("'nonce-a.b.c' 'sha256-abc.def'").is_empty());
    }

    #[test]
    fn wildcard_subdomain() {
        assert_eq!(normalize_wildcard("*.cdn.example.com"), ".cdn.example.com");
        assert_eq!(
            normalize_wildcard("https://*.cdn.example.com"),
            ".cdn.example.com"
        );
    }

    #[test]
    fn wildcard_keeps_last_two_segments() {
        assert_eq!(normalize_wildcard("https://*.a.*.example.com"), ".a.example.com");
        assert_eq!(normalize_wildcard("*.example.com/*"), ".example.com/");
        assert_eq!(normalize_wildcard("x*y*z"), ".yz");
    }

    #[test]
    fn wildcard_without_dot_gets_prefix() {
        assert_eq!(normalize_wildcard("*example.com"), ".example.com");
        assert_eq!(normalize_wildcard("*"), ".");
    }

    #[test]
    fn terms_are_lowercased_and_deduplicated() {
        let terms = extract_terms("A.com https://a.com *.B.com http://*.b.com a.com");
        assert_eq!(terms, vec!["a.com", ".b.com"]);
    }

    #[test]
    fn uppercase_schemes_are_stripped() {
        assert_eq!(term_for("HTTPS://*.example.com").as_deref(), Some(".example.com"));
        assert_eq!(term_for("Http://*.Example.com").as_deref(), Some(".example.com"));
        assert_eq!(term_for("HTTPS://cdn.example.com").as_deref(), Some("cdn.example.com"));
        assert_eq!(
            extract_terms("HTTPS://*.example.com https://*.example.com"),
            vec![".example.com"]
        );
    }

    #[test]
    fn literal_keeps_path() {
        assert_eq!(
            extract_terms("https://www.google.com/recaptcha/"),
            vec!["www.google.com/recaptcha/"]
        );
    }

    #[test]
    fn unsafe_inline_without_mitigation() {
        assert!(shows_unsafe_inline("'unsafe-inline' https://x.com"));
        assert!(shows_unsafe_inline("'UNSAFE-INLINE'"));
    }

    #[test]
    fn unsafe_inline_neutralized_by_nonce_or_hash() {
        assert!(!shows_unsafe_inline("'unsafe-inline' 'nonce-abc123'"));
        assert!(!shows_unsafe_inline("'sha256-xyz=' 'unsafe-inline'"));
        assert!(!shows_unsafe_inline("'unsafe-inline' 'sha384-xyz='"));
        assert!(!shows_unsafe_inline("'unsafe-inline' 'sha512-xyz='"));
    }

    #[test]
    fn no_unsafe_inline_no_advisory() {
        assert!(!shows_unsafe_inline("'self' https://x.com"));
        assert!(!shows_unsafe_inline(""));
    }
}
