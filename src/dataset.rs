//! Dataset parsing.
//!
//! The bypass dataset is a hand-maintained, tab-separated file:
//!
//! ```text
//! Domain<TAB>Code[<TAB>Author]
//! www.google.com<TAB><script src="https://www.google.com/complete/search?client=chrome&jsonp=alert(1);"></script><TAB>someone
//! ```
//!
//! The first line is always a header and is discarded. Rows are split on
//! the tab character only; each column is trimmed. A row needs a non-empty
//! domain and code to become a [`Record`]; anything else is dropped without
//! an error since dirty rows are expected in the source file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column delimiter of the dataset file.
pub const DELIMITER: char = '\t';

/// One bypass entry: a host and a payload known to work against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    /// Host (or host pattern) the payload is served from
    pub domain: String,

    /// Payload / gadget snippet
    pub code: String,

    /// Contributor credited for the entry (may be empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
}

impl Record {
    pub fn new(
        domain: impl Into<String>,
        code: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            code: code.into(),
            author: author.into(),
        }
    }

    /// Identity used for deduplication: exact `(domain, code)` equality.
    pub fn identity(&self) -> (&str, &str) {
        (&self.domain, &self.code)
    }

    pub fn author(&self) -> Option<&str> {
        if self.author.is_empty() {
            None
        } else {
            Some(&self.author)
        }
    }

    /// Parse a single data row. Returns `None` for rows without a usable
    /// domain and code.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut columns = line
            .trim_end_matches('\r')
            .split(DELIMITER)
            .map(str::trim);
        let domain = columns.next().filter(|c| !c.is_empty())?;
        let code = columns.next().filter(|c| !c.is_empty())?;
        let author = columns.next().unwrap_or("");
        Some(Self::new(domain, code, author))
    }
}

/// Ordered, immutable snapshot of the parsed dataset.
///
/// Alongside the records it keeps a lowercased copy of every `domain` and
/// `code`, computed once here so that every keystroke-driven search does
/// not have to fold the whole dataset again.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    folded: Vec<(String, String)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let folded = records
            .iter()
            .map(|r| (r.domain.to_lowercase(), r.code.to_lowercase()))
            .collect();
        Self { records, folded }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Records paired with their lowercased `(domain, code)`.
    pub(crate) fn iter_folded(&self) -> impl Iterator<Item = (&Record, &str, &str)> {
        self.records
            .iter()
            .zip(&self.folded)
            .map(|(r, (d, c))| (r, d.as_str(), c.as_str()))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Parse raw dataset text.
///
/// Total: malformed rows are skipped, and empty input yields an empty
/// dataset.
pub fn parse(raw: &str) -> Dataset {
    let records = raw
        .trim()
        .split('\n')
        .skip(1)
        .filter_map(Record::from_line)
        .collect();
    Dataset::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_always_discarded() {
        let ds = parse("www.google.com\talert(1)\nfoo.com\tbar");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].domain, "foo.com");
    }

    #[test]
    fn rows_keep_file_order() {
        let raw = "Domain\tCode\n\
                   a.com\tone\n\
                   b.com\ttwo\n\
                   c.com\tthree\n";
        let ds = parse(raw);
        let domains: Vec<&str> = ds.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn short_rows_are_dropped() {
        let ds = parse("H1\tH2\nonlyone\nfoo\tbar");
        assert_eq!(ds.records(), &[Record::new("foo", "bar", "")]);
    }

    #[test]
    fn empty_columns_are_dropped() {
        let ds = parse("H1\tH2\n\tcode\ndomain\t\n   \t  \nok.com\tok");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].domain, "ok.com");
    }

    #[test]
    fn third_column_becomes_author() {
        let ds = parse("Domain\tCode\tAuthor\na.com\tx\talice\nb.com\ty\t\nc.com\tz");
        assert_eq!(ds.records()[0].author(), Some("alice"));
        assert_eq!(ds.records()[1].author(), None);
        assert_eq!(ds.records()[2].author(), None);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let ds = parse("H\na.com\tx\tbob\tnotes\tmore");
        assert_eq!(ds.records(), &[Record::new("a.com", "x", "bob")]);
    }

    #[test]
    fn crlf_and_surrounding_whitespace_are_tolerated() {
        let ds = parse("\n\n  Domain\tCode\r\na.com\t<script>x</script>\r\n\n  ");
        assert_eq!(ds.records(), &[Record::new("a.com", "<script>x</script>", "")]);
    }

    #[test]
    fn spaces_are_not_delimiters() {
        // Strict tab policy: a space separated row has a single column.
        let ds = parse("H\na.com <script></script>");
        assert!(ds.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        assert!(parse("").is_empty());
        assert!(parse("   \n  ").is_empty());
        assert!(parse("Domain\tCode").is_empty());
    }

    #[test]
    fn folded_view_is_lowercase() {
        let ds = parse("H\nWWW.Google.COM\tAlert(1)");
        let (record, domain, code) = ds.iter_folded().next().unwrap();
        assert_eq!(record.domain, "WWW.Google.COM");
        assert_eq!(domain, "www.google.com");
        assert_eq!(code, "alert(1)");
    }
}
