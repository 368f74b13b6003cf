//! Schema vs data statement classification
//!
//! Index and constraint changes cannot share a transaction with data
//! changes, so the engine runs them on their own. Classification is purely
//! textual and is recomputed from the statement text every time.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::splitter::is_blank_or_comment_line;

static SCHEMA_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^CREATE (UNIQUE )?INDEX",
        r"^CREATE CONSTRAINT",
        r"^DROP INDEX",
        r"^DROP CONSTRAINT",
        r"^CREATE FULLTEXT INDEX",
        r"^CREATE LOOKUP INDEX",
        r"^CREATE POINT INDEX",
        r"^CREATE RANGE INDEX",
        r"^CREATE TEXT INDEX",
    ])
    .expect("valid regex set")
});

static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid regex"));

/// Whether a statement changes the schema or the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Creates or drops an index or constraint
    Schema,
    /// Anything else
    Data,
}

impl StatementKind {
    pub fn is_schema(&self) -> bool {
        matches!(self, StatementKind::Schema)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Schema => "schema",
            StatementKind::Data => "data",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercase, comment-free, single-spaced form of a statement
pub fn normalize_statement(statement: &str) -> String {
    let joined = statement
        .lines()
        .filter(|line| !is_blank_or_comment_line(line))
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    WHITESPACE_RUN.replace_all(&joined, " ").trim().to_string()
}

/// Classify a statement as schema-altering or data-altering
pub fn classify_statement(statement: &str) -> StatementKind {
    let normalized = normalize_statement(statement);
    if SCHEMA_PATTERNS.is_match(&normalized) {
        StatementKind::Schema
    } else {
        StatementKind::Data
    }
}
