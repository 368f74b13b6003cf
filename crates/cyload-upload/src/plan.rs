//! Parsed statements and execution planning
//!
//! A plan is the ordered list of execution units the engine walks: every
//! schema statement is a unit on its own, and consecutive data statements
//! are grouped into batches of at most `batch_size`, each of which maps to
//! one transaction.

use serde::{Deserialize, Serialize};

use crate::classify::{StatementKind, classify_statement};
use crate::splitter::split_statements;

/// One parsed statement of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// 0-based position in the script
    pub index: usize,
    /// Trimmed statement text
    pub text: String,
    /// Classification derived from `text`
    pub kind: StatementKind,
}

impl Statement {
    /// Create a statement, classifying its text
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = classify_statement(&text);
        Self { index, text, kind }
    }

    pub fn is_schema(&self) -> bool {
        self.kind.is_schema()
    }

    /// First `max_chars` characters on a single line, for logs and listings
    pub fn preview(&self, max_chars: usize) -> String {
        let flat: String = self
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if flat.chars().count() > max_chars {
            let head: String = flat.chars().take(max_chars).collect();
            format!("{head}...")
        } else {
            flat
        }
    }
}

/// Split and classify a script
pub fn parse_statements(script: &str) -> Vec<Statement> {
    split_statements(script)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Statement::new(index, text))
        .collect()
}

/// A unit of execution: one transaction or one standalone schema statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionUnit {
    /// A single schema statement run in its own implicit transaction
    Schema { index: usize },
    /// `len` consecutive data statements starting at `start`, run in one transaction
    Batch { start: usize, len: usize },
}

impl ExecutionUnit {
    /// Index of the first statement in this unit
    pub fn start(&self) -> usize {
        match self {
            ExecutionUnit::Schema { index } => *index,
            ExecutionUnit::Batch { start, .. } => *start,
        }
    }

    /// Number of statements covered by this unit
    pub fn len(&self) -> usize {
        match self {
            ExecutionUnit::Schema { .. } => 1,
            ExecutionUnit::Batch { len, .. } => *len,
        }
    }

    /// Units are never empty; provided for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index one past the last statement in this unit
    pub fn end(&self) -> usize {
        self.start() + self.len()
    }
}

/// Group statements into execution units
///
/// A `batch_size` of zero is treated as one.
pub fn plan_units(statements: &[Statement], batch_size: usize) -> Vec<ExecutionUnit> {
    let batch_size = batch_size.max(1);
    let mut units = Vec::new();
    let mut i = 0;

    while i < statements.len() {
        if statements[i].is_schema() {
            units.push(ExecutionUnit::Schema { index: i });
            i += 1;
            continue;
        }

        let start = i;
        while i < statements.len() && i - start < batch_size && !statements[i].is_schema() {
            i += 1;
        }
        units.push(ExecutionUnit::Batch {
            start,
            len: i - start,
        });
    }

    units
}
