use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    /// Bulk upload body was not a non-empty array.
    #[error("Invalid data format. Array expected.")]
    InvalidBatch,
    #[error("not permitted")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("export error: {0}")]
    Export(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Field-level violations when this is a schema failure, otherwise `None`.
    pub fn schema_errors(&self) -> Option<&[String]> {
        match self {
            ServiceError::Model(models::errors::ModelError::Schema(errs)) => Some(errs.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ModelError;

    #[test]
    fn not_found_message() {
        match ServiceError::not_found("Entry") {
            ServiceError::NotFound(msg) => assert_eq!(msg, "Entry not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn schema_errors_exposed() {
        let err: ServiceError = ModelError::Schema(vec!["City is required".into()]).into();
        assert_eq!(err.schema_errors(), Some(&["City is required".to_string()][..]));
        assert!(ServiceError::Forbidden.schema_errors().is_none());
    }
}
