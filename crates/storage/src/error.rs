use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    pub fn is_check_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23514")
        )
    }
}

/// Maps constraint failures raised by a batch insert into a readable message
/// and leaves every other error untouched.
pub(crate) fn classify_insert_error(table: &str, error: sqlx::Error) -> StorageError {
    let error = StorageError::from(error);
    if error.is_foreign_key_violation() {
        return StorageError::ConstraintViolation(format!(
            "{table}: referenced row does not exist"
        ));
    }
    if error.is_check_violation() {
        return StorageError::ConstraintViolation(format!("{table}: value out of range"));
    }
    error
}
