//! Contributor credits shown next to the dataset.

use std::fmt;

/// Newline separated list of contributor names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    names: Vec<String>,
}

impl Credits {
    /// Parse the credits file: one name per line, blank lines ignored.
    pub fn parse(raw: &str) -> Self {
        let names = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(", "))
    }
}
