/// One column of the table being edited, as reported by the schema lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub declared_type: String,
    pub primary_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, primary_key: bool) -> Self {
        ColumnSchema {
            name: name.into(),
            declared_type: declared_type.into(),
            primary_key,
        }
    }
}

/// Static metadata for the edited table. Column order is the table's
/// declaration order and is the storage order of every buffered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub table: String,
    pub columns: Vec<ColumnSchema>,
}

impl SchemaDescriptor {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        SchemaDescriptor {
            table: table.into(),
            columns,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|column| column.primary_key)
    }
}
