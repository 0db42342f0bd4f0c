use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Unsupported file '{0}': expected an .xlsx or .xls workbook")]
    UnsupportedFile(String),

    #[error("Cannot tell the import kind from file name '{0}'")]
    UnknownKind(String),

    #[error("Workbook has no {0} sheet")]
    MissingSheet(String),

    #[error("Sheet '{sheet}', column {column}: expected header '{expected}', found '{found}'")]
    HeaderMismatch {
        sheet: String,
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Year {0} is outside the supported range 1900-9999")]
    InvalidYear(i32),

    #[error("Failed to build template: {0}")]
    Template(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Backend rejected {table} insert ({status}): {body}")]
    Backend {
        table: &'static str,
        status: u16,
        body: String,
    },

    #[error("Write task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ImporterError {
    /// Errors caused by the uploaded file itself; the whole import is rejected
    /// and nothing has been written.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImporterError::Workbook(_)
                | ImporterError::UnsupportedFile(_)
                | ImporterError::UnknownKind(_)
                | ImporterError::MissingSheet(_)
                | ImporterError::HeaderMismatch { .. }
                | ImporterError::InvalidYear(_)
        )
    }
}
