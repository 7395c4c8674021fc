//! ABOUTME: Maps sqlx failures onto the core error type
//! ABOUTME: Constraint violations keep their own variants so callers can branch on them

use adb_core::Error;
use sqlx::error::ErrorKind;

/// Classify a sqlx error raised while performing `context`.
///
/// Integrity-constraint failures reported by the engine become
/// `UniqueViolation`, `ForeignKeyViolation` or `ConstraintViolation`; the
/// engine's message is carried through untouched after the context prefix.
pub fn classify(context: &str, err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        let message = format!("{}: {}", context, db_err.message());
        return match db_err.kind() {
            ErrorKind::UniqueViolation => Error::UniqueViolation(message),
            ErrorKind::ForeignKeyViolation => Error::ForeignKeyViolation(message),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                Error::ConstraintViolation(message)
            }
            _ => Error::Database(message),
        };
    }

    Error::Database(format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_generic() {
        let err = classify("Failed to find pdb", sqlx::Error::RowNotFound);
        match err {
            Error::Database(msg) => assert!(msg.starts_with("Failed to find pdb: ")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_pool_errors_are_not_constraint_violations() {
        let err = classify("Failed to acquire", sqlx::Error::PoolTimedOut);
        assert!(!err.is_constraint_violation());
    }
}
