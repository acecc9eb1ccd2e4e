use thiserror::Error;

/// Failures produced while fetching snapshots or building enriched views.
#[derive(Debug, Error)]
pub enum BracketError {
    /// Network or parse failure reaching an external service.
    #[error("{service} unavailable: {message}")]
    CollaboratorUnavailable { service: String, message: String },

    /// A per-participant statistics lookup failed or found nothing.
    #[error("no statistics for '{name}': {message}")]
    AnnotationUnavailable { name: String, message: String },

    /// A record is missing fields a derived value depends on.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A caller-supplied argument is absent or has the wrong type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The configured tools mode or disabled list refuses this call.
    #[error("operation '{operation}' on '{tool}' is not allowed in {mode} mode")]
    OperationNotAllowed {
        tool: String,
        operation: String,
        mode: String,
    },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BracketError {
    pub fn collaborator(service: &str, message: impl Into<String>) -> Self {
        BracketError::CollaboratorUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn annotation(name: &str, message: impl Into<String>) -> Self {
        BracketError::AnnotationUnavailable {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        BracketError::InvalidInput(message.into())
    }
}

pub type BracketResult<T> = Result<T, BracketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BracketError::collaborator("TrueFinals", "404 Not Found");
        assert_eq!(err.to_string(), "TrueFinals unavailable: 404 Not Found");

        let err = BracketError::OperationNotAllowed {
            tool: "truefinals_games".into(),
            operation: "delete".into(),
            mode: "reporting".into(),
        };
        assert!(err.to_string().contains("reporting mode"));
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: BracketError = parse.unwrap_err().into();
        assert!(matches!(err, BracketError::Serialization(_)));
    }
}
