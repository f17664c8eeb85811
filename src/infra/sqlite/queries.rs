use anyhow::{Context, Result};
use rusqlite::types::{ToSql, Value};
use rusqlite::Connection;

use crate::domain::entities::table::RowImage;
use crate::domain::entities::value::CellValue;
use crate::usecase::ports::repo::TabularData;
use crate::usecase::services::update_command::UpdateCommandTemplate;

pub fn to_sql_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Integer(v) => Value::Integer(*v),
        CellValue::Real(v) => Value::Real(*v),
        CellValue::Text(v) => Value::Text(v.clone()),
        CellValue::Blob(v) => Value::Blob(v.clone()),
    }
}

pub fn from_sql_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Integer(v) => CellValue::Integer(v),
        Value::Real(v) => CellValue::Real(v),
        Value::Text(v) => CellValue::Text(v),
        Value::Blob(v) => CellValue::Blob(v),
    }
}

pub fn fill_from_query(conn: &Connection, query: &str) -> Result<TabularData> {
    let mut stmt = conn
        .prepare(query)
        .with_context(|| format!("failed to prepare query: {query}"))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = columns.len();

    let mut rows = Vec::new();
    let mut result = stmt.query([]).context("failed to run query")?;
    while let Some(row) = result.next().context("failed to read query row")? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value: Value = row
                .get(idx)
                .with_context(|| format!("failed to read column {idx}"))?;
            values.push(from_sql_value(value));
        }
        rows.push(values);
    }

    Ok(TabularData { columns, rows })
}

/// Execute the template for one row with named parameters bound from the
/// row image. Returns the affected row count.
pub fn execute_update(
    conn: &Connection,
    template: &UpdateCommandTemplate,
    row: RowImage<'_>,
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(template.sql())?;
    let bound: Vec<(&str, Value)> = template
        .bind(row)
        .into_iter()
        .map(|(name, value)| (name, to_sql_value(value)))
        .collect();
    let params: Vec<(&str, &dyn ToSql)> = bound
        .iter()
        .map(|(name, value)| (*name, value as &dyn ToSql))
        .collect();
    stmt.execute(params.as_slice())
}
