/// Repository layer errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Argument missing: {0}")]
    ArgumentMissing(&'static str),
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("Role {0} does not exist")]
    RoleNotFound(String),
    #[error(
        "The type '{0}' does not support personal data export: it declares no personal data fields"
    )]
    PersonalDataUnsupported(&'static str),
    #[error("Connection pool error: {0}")]
    PoolError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        RepositoryError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// True for unique and foreign key violations reported by the database
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::UniqueViolation(_) | RepositoryError::ForeignKeyViolation(_)
        )
    }
}

impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => RepositoryError::NotFound("Record not found".to_string()),
            Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                match kind {
                    DatabaseErrorKind::UniqueViolation => RepositoryError::UniqueViolation(message),
                    DatabaseErrorKind::ForeignKeyViolation => {
                        RepositoryError::ForeignKeyViolation(message)
                    }
                    _ => RepositoryError::DatabaseError(message),
                }
            }
            _ => RepositoryError::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::PoolError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error};

    #[test]
    fn not_found_maps_to_not_found() {
        let err = RepositoryError::from(Error::NotFound);
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn unique_violation_keeps_engine_message() {
        let err = RepositoryError::from(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        ));
        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "Unique constraint violation: duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn foreign_key_violation_is_a_constraint_violation() {
        let err = RepositoryError::from(Error::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("insert or update violates foreign key constraint".to_string()),
        ));
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn other_database_errors_are_generic() {
        let err = RepositoryError::from(Error::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_string()),
        ));
        assert!(matches!(err, RepositoryError::DatabaseError(_)));
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn role_not_found_displays_role_name() {
        let err = RepositoryError::RoleNotFound("NOROLE".to_string());
        assert_eq!(err.to_string(), "Role NOROLE does not exist");
    }
}
