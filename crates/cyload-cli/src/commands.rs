//! Offline inspection commands

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use cyload_upload::{ExecutionUnit, Statement, parse_statements, plan_units};
use serde_json::json;

/// Characters of statement text shown in tables
const PREVIEW_CHARS: usize = 80;

/// Read and parse a script file
pub async fn read_statements(path: &Path) -> Result<Vec<Statement>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script {:?}", path))?;
    let statements = parse_statements(&content);
    tracing::debug!(path = %path.display(), statements = statements.len(), "script parsed");
    Ok(statements)
}

pub fn statements_table(statements: &[Statement]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Kind", "Statement"]);

    for statement in statements {
        table.add_row(vec![
            (statement.index + 1).to_string(),
            statement.kind.to_string(),
            statement.preview(PREVIEW_CHARS),
        ]);
    }
    table
}

pub fn plan_table(statements: &[Statement], units: &[ExecutionUnit]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Unit", "Type", "Statements", "First statement"]);

    for (i, unit) in units.iter().enumerate() {
        let kind = match unit {
            ExecutionUnit::Schema { .. } => "schema",
            ExecutionUnit::Batch { .. } => "transaction",
        };
        let range = if unit.len() == 1 {
            (unit.start() + 1).to_string()
        } else {
            format!("{}-{}", unit.start() + 1, unit.end())
        };
        table.add_row(vec![
            (i + 1).to_string(),
            kind.to_string(),
            range,
            statements[unit.start()].preview(PREVIEW_CHARS),
        ]);
    }
    table
}

pub fn plan_json(
    file: &Path,
    statements: &[Statement],
    units: &[ExecutionUnit],
    batch_size: usize,
) -> serde_json::Value {
    json!({
        "file": file.display().to_string(),
        "batchSize": batch_size,
        "totalStatements": statements.len(),
        "schemaStatements": statements.iter().filter(|s| s.is_schema()).count(),
        "units": units,
    })
}

/// `cyload statements <FILE>`
pub async fn statements(file: &Path, as_json: bool) -> Result<()> {
    let statements = read_statements(file).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else if statements.is_empty() {
        println!("No valid Cypher statements found in file");
    } else {
        println!("{}", statements_table(&statements));
    }
    Ok(())
}

/// `cyload plan <FILE>`
pub async fn plan(file: &Path, batch_size: usize, as_json: bool) -> Result<()> {
    let statements = read_statements(file).await?;
    let units = plan_units(&statements, batch_size);
    tracing::info!(
        statements = statements.len(),
        units = units.len(),
        batch_size,
        "execution plan built"
    );

    if as_json {
        let value = plan_json(file, &statements, &units, batch_size);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", plan_table(&statements, &units));
        println!(
            "{} statement(s) in {} unit(s), batch size {}",
            statements.len(),
            units.len(),
            batch_size
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = "CREATE INDEX FOR (n:P) ON (n.id);\n\
                          CREATE (:P {id: 1});\n\
                          CREATE (:P {id: 2});\n\
                          CREATE (:P {id: 3});";

    #[test]
    fn test_statements_table_lists_kinds() {
        let rendered = statements_table(&parse_statements(SCRIPT)).to_string();
        assert!(rendered.contains("schema"));
        assert!(rendered.contains("CREATE (:P {id: 3})"));
    }

    #[test]
    fn test_plan_table_ranges() {
        let statements = parse_statements(SCRIPT);
        let units = plan_units(&statements, 2);
        let rendered = plan_table(&statements, &units).to_string();

        assert!(rendered.contains("2-3"));
        assert!(rendered.contains("transaction"));
    }

    #[test]
    fn test_plan_json() {
        let statements = parse_statements(SCRIPT);
        let units = plan_units(&statements, 2);
        let value = plan_json(Path::new("seed.cypher"), &statements, &units, 2);

        assert_eq!(value["totalStatements"], 4);
        assert_eq!(value["schemaStatements"], 1);
        assert_eq!(
            value["units"],
            json!([
                {"type": "schema", "index": 0},
                {"type": "batch", "start": 1, "len": 2},
                {"type": "batch", "start": 3, "len": 1},
            ])
        );
    }

    #[tokio::test]
    async fn test_read_statements_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.cypher");
        std::fs::write(&path, SCRIPT).unwrap();

        let statements = read_statements(&path).await.unwrap();
        assert_eq!(statements.len(), 4);
    }

    #[tokio::test]
    async fn test_read_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_statements(&dir.path().join("nope.cypher"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read script"));
    }
}
