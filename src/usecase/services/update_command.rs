use std::collections::HashSet;

use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::table::RowImage;
use crate::domain::entities::value::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// Bound to the current value, assigns the column.
    Set,
    /// Bound to the original value, matches the persisted row.
    Where,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateParam {
    pub name: String,
    pub column: String,
    /// Position of `column` in schema order.
    pub ordinal: usize,
    pub role: ParamRole,
}

/// Parameterized UPDATE statement for one table. Built once per session and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCommandTemplate {
    table: String,
    sql: String,
    params: Vec<UpdateParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("table `{0}` has no columns")]
    NoColumns(String),
}

impl UpdateCommandTemplate {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[UpdateParam] {
        &self.params
    }

    pub fn set_params(&self) -> impl Iterator<Item = &UpdateParam> {
        self.params.iter().filter(|p| p.role == ParamRole::Set)
    }

    pub fn where_params(&self) -> impl Iterator<Item = &UpdateParam> {
        self.params.iter().filter(|p| p.role == ParamRole::Where)
    }

    /// A table made only of key columns has nothing to assign.
    pub fn is_writable(&self) -> bool {
        self.set_params().next().is_some()
    }

    /// Pair every parameter with the value it binds for `row`.
    pub fn bind<'a>(&'a self, row: RowImage<'a>) -> Vec<(&'a str, &'a CellValue)> {
        self.params
            .iter()
            .filter_map(|param| {
                let values = match param.role {
                    ParamRole::Set => row.current,
                    ParamRole::Where => row.original,
                };
                values
                    .get(param.ordinal)
                    .map(|value| (param.name.as_str(), value))
            })
            .collect()
    }
}

/// Build the optimistic-concurrency UPDATE for `schema`.
///
/// Every column is matched in WHERE against its original value; non-key
/// columns are additionally assigned in SET from their current value.
///
/// Matching uses plain `=`, so a row whose original values include NULL
/// never matches and its update always reports a conflict.
pub fn build_update_command(schema: &SchemaDescriptor) -> Result<UpdateCommandTemplate, BuildError> {
    if schema.columns.is_empty() {
        return Err(BuildError::NoColumns(schema.table.clone()));
    }

    let mut used_names = HashSet::new();
    let mut params = Vec::with_capacity(schema.columns.len() * 2);
    let mut set_clauses = Vec::new();
    let mut where_clauses = Vec::new();

    for (ordinal, column) in schema.columns.iter().enumerate() {
        let where_name = param_name("W", &column.name, ordinal, &mut used_names);
        where_clauses.push(format!("{}={where_name}", quote_ident(&column.name)));
        params.push(UpdateParam {
            name: where_name,
            column: column.name.clone(),
            ordinal,
            role: ParamRole::Where,
        });

        if !column.primary_key {
            let set_name = param_name("S", &column.name, ordinal, &mut used_names);
            set_clauses.push(format!("{}={set_name}", quote_ident(&column.name)));
            params.push(UpdateParam {
                name: set_name,
                column: column.name.clone(),
                ordinal,
                role: ParamRole::Set,
            });
        }
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(&schema.table),
        set_clauses.join(","),
        where_clauses.join(" AND ")
    );

    Ok(UpdateCommandTemplate {
        table: schema.table.clone(),
        sql,
        params,
    })
}

/// `SELECT` over every schema column, used when a session has no explicit query.
pub fn select_statement(schema: &SchemaDescriptor, filter: Option<&str>) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {columns} FROM {}", quote_ident(&schema.table));
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn param_name(prefix: &str, column: &str, ordinal: usize, used: &mut HashSet<String>) -> String {
    let sanitized: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let base = format!("@{prefix}_{sanitized}");
    let mut name = base.clone();
    let mut suffix = ordinal;
    while used.contains(&name) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    used.insert(name.clone());
    name
}
