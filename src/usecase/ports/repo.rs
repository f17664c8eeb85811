use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::table::RowImage;
use crate::domain::entities::value::CellValue;
use crate::usecase::services::update_command::UpdateCommandTemplate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    #[error("table `{0}` does not exist")]
    TableNotFound(String),
    #[error("{message}")]
    Database { code: Option<i32>, message: String },
    #[error("{0}")]
    Message(String),
}

impl RepoError {
    pub fn code(&self) -> Option<i32> {
        match self {
            RepoError::Database { code, .. } => *code,
            _ => None,
        }
    }
}

/// Schema lookup and data layer for the table being edited.
///
/// One repository instance owns one live connection for the lifetime of the
/// session that holds it.
pub trait TableRepository {
    fn table_schema(&self, table: &str) -> Result<SchemaDescriptor, RepoError>;

    fn fill_from_query(&self, query: &str) -> Result<TabularData, RepoError>;

    fn begin(&mut self) -> Result<(), RepoError>;

    /// Run the update template for one row, returning the affected row count.
    fn execute_update(
        &mut self,
        template: &UpdateCommandTemplate,
        row: RowImage<'_>,
    ) -> Result<usize, RepoError>;

    /// Commit (`true`) or roll back (`false`) the work since `begin`.
    fn finish(&mut self, commit: bool) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}
