//! Error types for the domain layer.
//!
//! The engine's taxonomy has four families. Configuration families
//! (`SchemaResolutionError`, `ComparisonConfigError`) may fail a whole
//! section; endpoint and response families are contained to one attribute or
//! task and surface as data.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A document-type schema could not be turned into a resolved tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaResolutionError {
    #[error("No schema configured for document class '{document_class}'")]
    MissingSchema { document_class: String },

    #[error("Reference '{reference}' not found in schema definitions")]
    UnresolvedReference { reference: String },

    #[error("Cyclic reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    #[error("Unsupported reference '{reference}': only local '#/...' pointers are resolved")]
    UnsupportedReference { reference: String },

    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: String, reason: String },
}

impl SchemaResolutionError {
    /// Creates an unresolved reference error.
    pub fn unresolved(reference: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// An evaluation method or directive is unknown or misconfigured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonConfigError {
    #[error("Unknown evaluation method '{name}'")]
    UnknownMethod { name: String },

    #[error("Evaluation method {method} cannot be applied to {kind} field '{path}'")]
    MethodNotApplicable {
        method: String,
        kind: String,
        path: String,
    },

    #[error("Invalid directive '{key}' on '{path}': {reason}")]
    InvalidDirective {
        path: String,
        key: String,
        reason: String,
    },

    #[error("Evaluation method {method} requires an endpoint that is not configured")]
    MissingEndpoint { method: String },
}

impl ComparisonConfigError {
    /// Creates an unknown method error.
    pub fn unknown_method(name: impl Into<String>) -> Self {
        Self::UnknownMethod { name: name.into() }
    }

    /// Creates an invalid directive error.
    pub fn invalid_directive(
        path: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDirective {
            path: path.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// The external inference endpoint failed terminally or exhausted its retries.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{endpoint} failed after {attempts} attempt(s): {message}")]
pub struct ExternalEndpointError {
    pub endpoint: String,
    pub attempts: u32,
    pub message: String,
    /// Whether the final failure was a throttling/transient condition.
    pub transient: bool,
}

impl ExternalEndpointError {
    /// Creates a new endpoint error.
    pub fn new(
        endpoint: impl Into<String>,
        attempts: u32,
        message: impl Into<String>,
        transient: bool,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            attempts,
            message: message.into(),
            transient,
        }
    }
}

/// LLM output could not be parsed into the expected structure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Malformed response: {reason}")]
pub struct MalformedResponseError {
    pub reason: String,
    /// The raw response text, preserved for the report.
    pub raw: String,
}

impl MalformedResponseError {
    /// Creates a new malformed response error.
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Reason text with the raw response appended, truncated for display.
    pub fn to_reason_text(&self) -> String {
        const MAX_RAW: usize = 500;
        let raw: String = self.raw.chars().take(MAX_RAW).collect();
        let ellipsis = if self.raw.chars().count() > MAX_RAW { "..." } else { "" };
        format!("{} (raw response: {}{})", self.reason, raw, ellipsis)
    }
}

/// Umbrella error for the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    SchemaResolution(#[from] SchemaResolutionError),

    #[error(transparent)]
    ComparisonConfig(#[from] ComparisonConfigError),

    #[error(transparent)]
    ExternalEndpoint(#[from] ExternalEndpointError),

    #[error(transparent)]
    MalformedResponse(#[from] MalformedResponseError),
}

impl EngineError {
    /// Configuration errors fail a whole section but never a whole document.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::SchemaResolution(_) | EngineError::ComparisonConfig(_)
        )
    }

    /// Remediation hint shown next to failed sections in reports.
    pub fn remediation(&self) -> &'static str {
        match self {
            EngineError::SchemaResolution(SchemaResolutionError::MissingSchema { .. }) => {
                "Add a schema for this document class to the document-type configuration."
            }
            EngineError::SchemaResolution(_) => {
                "Fix the schema definitions so every $ref points at an existing, non-cyclic definition."
            }
            EngineError::ComparisonConfig(_) => {
                "Use one of EXACT, NUMERIC_EXACT, FUZZY, SEMANTIC, LLM or HUNGARIAN with valid thresholds and weights."
            }
            EngineError::ExternalEndpoint(_) => {
                "Check endpoint availability and quotas, then re-run the failed tasks."
            }
            EngineError::MalformedResponse(_) => {
                "Inspect the raw model output; adjust the prompt or model if this persists."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("document_id");
        assert_eq!(err.to_string(), "Field 'document_id' cannot be empty");
    }

    #[test]
    fn cyclic_reference_displays_chain() {
        let err = SchemaResolutionError::CyclicReference {
            chain: vec!["#/$defs/A".into(), "#/$defs/B".into(), "#/$defs/A".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic reference: #/$defs/A -> #/$defs/B -> #/$defs/A"
        );
    }

    #[test]
    fn configuration_errors_are_classified() {
        let schema: EngineError = SchemaResolutionError::unresolved("#/$defs/X").into();
        let method: EngineError = ComparisonConfigError::unknown_method("CLOSE_ENOUGH").into();
        let endpoint: EngineError =
            ExternalEndpointError::new("llm", 5, "throttled", true).into();

        assert!(schema.is_configuration());
        assert!(method.is_configuration());
        assert!(!endpoint.is_configuration());
    }

    #[test]
    fn missing_schema_remediation_mentions_schema() {
        let err: EngineError = SchemaResolutionError::MissingSchema {
            document_class: "Invoice".into(),
        }
        .into();
        assert!(err.remediation().contains("Add a schema"));
        assert_eq!(
            err.to_string(),
            "No schema configured for document class 'Invoice'"
        );
    }

    #[test]
    fn malformed_reason_truncates_raw_text() {
        let err = MalformedResponseError::new("not JSON", "x".repeat(600));
        let text = err.to_reason_text();
        assert!(text.starts_with("not JSON (raw response: "));
        assert!(text.ends_with("...)"));
    }

    #[test]
    fn endpoint_error_displays_attempts() {
        let err = ExternalEndpointError::new("llm.complete", 5, "rate limited", true);
        assert_eq!(err.to_string(), "llm.complete failed after 5 attempt(s): rate limited");
    }
}
