//! Uniform invocation outcomes and their wire encoding.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::schema::ValidationError;
use crate::tools::ToolError;

/// Per-call failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ToolNotFound,
    InvalidArguments,
    HandlerError,
    EncodingError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::HandlerError => "HandlerError",
            ErrorKind::EncodingError => "EncodingError",
        };
        f.write_str(name)
    }
}

/// A structured failure: `{kind, message, field?}`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationError {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending argument, when the failure is about one.
    pub field: Option<String>,
}

impl InvocationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn tool_not_found(name: &str) -> Self {
        Self::new(ErrorKind::ToolNotFound, format!("tool `{}` not found", name))
    }

    pub fn invalid_arguments(field: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArguments,
            message: message.into(),
            field,
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandlerError, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EncodingError, message)
    }

    /// Encoded failure body.
    pub fn to_json(&self) -> Value {
        let mut body = serde_json::json!({
            "kind": self.kind,
            "message": self.message,
        });
        if let (Some(field), Some(map)) = (&self.field, body.as_object_mut()) {
            map.insert("field".to_string(), Value::String(field.clone()));
        }
        body
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} ({}): {}", self.kind, field, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for InvocationError {}

impl From<ValidationError> for InvocationError {
    fn from(err: ValidationError) -> Self {
        Self::invalid_arguments(err.field, err.message)
    }
}

impl From<ToolError> for InvocationError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Arguments(e) => Self::invalid_arguments(None, e.to_string()),
            ToolError::InvalidArgument { field, message } => {
                Self::invalid_arguments(Some(field), message)
            }
            ToolError::Encoding(message) => Self::encoding(message),
            other => Self::handler(other.to_string()),
        }
    }
}

/// A successful call: `{label, payload}`. The payload is the remote response, untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub label: String,
    pub payload: Value,
}

impl ToolOutput {
    pub fn new(label: impl Into<String>, payload: Value) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }

    /// Encoded success body.
    pub fn to_json(&self) -> Result<String, InvocationError> {
        serde_json::to_string(self).map_err(|e| InvocationError::encoding(e.to_string()))
    }
}

pub type InvocationResult = Result<ToolOutput, InvocationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_encoding_omits_missing_field() {
        let err = InvocationError::tool_not_found("does_not_exist");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"kind": "ToolNotFound", "message": "tool `does_not_exist` not found"})
        );
        assert_eq!(err.to_json(), serde_json::to_value(&err).unwrap());
    }

    #[test]
    fn test_error_encoding_with_field() {
        let err = InvocationError::invalid_arguments(Some("indexName".into()), "missing");
        assert_eq!(
            err.to_json(),
            json!({"kind": "InvalidArguments", "message": "missing", "field": "indexName"})
        );
    }

    #[test]
    fn test_tool_error_mapping() {
        let err: InvocationError = ToolError::invalid_argument("variants", "bad JSON").into();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
        assert_eq!(err.field.as_deref(), Some("variants"));

        let err: InvocationError = ToolError::Encoding("NaN".into()).into();
        assert_eq!(err.kind, ErrorKind::EncodingError);

        let err: InvocationError = ToolError::Api {
            status: 404,
            message: "Index does not exist".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::HandlerError);
        assert!(err.message.contains("404"));
        assert!(err.message.contains("Index does not exist"));
    }

    #[test]
    fn test_output_encoding() {
        let output = ToolOutput::new("settings", json!({"hitsPerPage": 20}));
        assert_eq!(
            output.to_json().unwrap(),
            r#"{"label":"settings","payload":{"hitsPerPage":20}}"#
        );
    }
}
