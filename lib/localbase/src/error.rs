use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Storage error: {message}")]
    Storage {
        /// Store-specific error code, when the store reports one.
        code: Option<String>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid select shape: {0}")]
    InvalidShape(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Refusing to {0} without filters")]
    MissingFilters(&'static str),
}

impl DbError {
    /// Build a storage error without a store code.
    pub fn storage(message: impl Into<String>) -> Self {
        DbError::Storage {
            code: None,
            message: message.into(),
        }
    }

    /// Machine-readable code for this error.
    ///
    /// Storage errors report the store's own code when one is available.
    pub fn code(&self) -> &str {
        match self {
            DbError::Storage {
                code: Some(code), ..
            } => code.as_str(),
            DbError::Storage { code: None, .. } => "storage",
            DbError::Serialization(_) => "serialization",
            DbError::InvalidIdentifier(_) => "invalid_identifier",
            DbError::InvalidShape(_) => "invalid_shape",
            DbError::InvalidRow(_) => "invalid_row",
            DbError::MissingFilters(_) => "missing_filters",
        }
    }

    /// Human-readable message, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            DbError::Storage { message, .. } => message.clone(),
            DbError::Serialization(e) => e.to_string(),
            DbError::InvalidIdentifier(s) | DbError::InvalidShape(s) | DbError::InvalidRow(s) => {
                s.clone()
            }
            DbError::MissingFilters(op) => format!("{} requires at least one filter", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_code_prefers_store_code() {
        let err = DbError::Storage {
            code: Some("2067".to_string()),
            message: "UNIQUE constraint failed: users.id".to_string(),
        };
        assert_eq!(err.code(), "2067");
        assert_eq!(err.message(), "UNIQUE constraint failed: users.id");

        assert_eq!(DbError::storage("disk I/O error").code(), "storage");
    }

    #[test]
    fn missing_filters_message() {
        let err = DbError::MissingFilters("delete");
        assert_eq!(err.code(), "missing_filters");
        assert_eq!(err.to_string(), "Refusing to delete without filters");
    }
}
