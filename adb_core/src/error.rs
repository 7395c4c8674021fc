/// Core error type for antidb
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A row referenced a parent that does not exist
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A CHECK or NOT NULL constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// True for errors raised by the storage engine's integrity constraints
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::UniqueViolation(_) | Error::ForeignKeyViolation(_) | Error::ConstraintViolation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_classification() {
        assert!(Error::UniqueViolation("dup".into()).is_constraint_violation());
        assert!(Error::ForeignKeyViolation("fk".into()).is_constraint_violation());
        assert!(Error::ConstraintViolation("check".into()).is_constraint_violation());
        assert!(!Error::Validation("bad".into()).is_constraint_violation());
        assert!(!Error::NotFound("gone".into()).is_constraint_violation());
    }

    #[test]
    fn test_display_keeps_engine_message() {
        let err = Error::UniqueViolation("UNIQUE constraint failed: pdb.pdb_code".into());
        assert_eq!(
            err.to_string(),
            "Unique constraint violation: UNIQUE constraint failed: pdb.pdb_code"
        );
    }
}
