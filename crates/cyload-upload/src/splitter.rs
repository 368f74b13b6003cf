//! Cypher script splitting
//!
//! Splits a script into statements on semicolons, leaving semicolons inside
//! single- or double-quoted literals alone. Segments made only of `//` line
//! comments are dropped. Unterminated quotes are not an error: the rest of
//! the input simply accumulates into the final statement.

const LINE_COMMENT: &str = "//";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Split a multi-statement Cypher script into trimmed, non-empty statements
///
/// A leading byte order mark is ignored. Inside a quoted literal a backslash escapes the next character, so
/// `'it\'s'` stays one literal. A quote character only toggles its own mode
/// when the other quote mode is inactive.
pub fn split_statements(script: &str) -> Vec<String> {
    let script = script.strip_prefix(BYTE_ORDER_MARK).unwrap_or(script);
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let chars: Vec<char> = script.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];

        if c == '\\' && (in_single_quote || in_double_quote) && i + 1 < len {
            current.push(c);
            current.push(chars[i + 1]);
            i += 2;
            continue;
        }

        match c {
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            ';' if !in_single_quote && !in_double_quote => {
                flush_statement(&mut current, &mut statements);
                i += 1;
                continue;
            }
            _ => {}
        }

        current.push(c);
        i += 1;
    }

    flush_statement(&mut current, &mut statements);

    tracing::trace!(statements = statements.len(), "split cypher script");
    statements
}

fn flush_statement(current: &mut String, statements: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() && !is_comment_only(trimmed) {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

/// Check whether a statement holds nothing but `//` comments and blank lines
pub fn is_comment_only(statement: &str) -> bool {
    statement.lines().all(is_blank_or_comment_line)
}

pub(crate) fn is_blank_or_comment_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(LINE_COMMENT)
}
