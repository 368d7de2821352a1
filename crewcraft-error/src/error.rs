//! The one error type every crewcraft crate returns

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// A failure with enough attached to act on it.
///
/// - `kind` says what failed and `status` whether trying again could help
/// - `operation` is the innermost named step; outer steps that re-tag the
///   error push the previous one into `context` under `called`
/// - `context` holds key/value pairs such as the agent role or task index
/// - `source` keeps the wrapped third-party error
///
/// ```rust
/// use crewcraft_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::SchemaMismatch, "missing field `source`")
///     .with_operation("schema::validate")
///     .with_context("schema", "RentalDetails")
///     .with_context("task", "0");
///
/// assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
/// assert!(!err.is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// The status defaults from the kind: temporary if retryable, else permanent
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: match kind.is_retryable() {
                true => ErrorStatus::Temporary,
                false => ErrorStatus::Permanent,
            },
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error; an error has at most one source
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

/// One line, message first: `message (Kind at op; key=value, ...)`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{} ", self.message)?;
        }
        write!(f, "({}", self.kind)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        if self.status == ErrorStatus::Temporary {
            write!(f, ", {}", self.status)?;
        }
        for (i, (key, value)) in self.context.iter().enumerate() {
            let sep = if i == 0 { "; " } else { ", " };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;
        if !self.message.is_empty() {
            writeln!(f, "    message: {}", self.message)?;
        }
        for (key, value) in &self.context {
            writeln!(f, "    {}: {}", key, value)?;
        }
        if let Some(source) = &self.source {
            writeln!(f, "    source: {:?}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string()).with_operation("io").set_source(err)
    }
}

impl Error {
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn agent_not_found(role: impl Into<String>) -> Self {
        let role = role.into();
        Self::new(ErrorKind::AgentNotFound, format!("no agent plays '{}'", role)).with_context("role", role)
    }

    pub fn template_variable_missing(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::TemplateVariableMissing,
            format!("no input for placeholder {{{}}}", name),
        )
        .with_context("variable", name)
    }

    pub fn schema_mismatch(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaMismatch, reason).with_context("schema", schema)
    }

    pub fn iteration_limit(role: impl Into<String>, max: usize) -> Self {
        let role = role.into();
        Self::new(
            ErrorKind::IterationLimit,
            format!("'{}' gave no final answer within {} iterations", role, max),
        )
        .with_context("role", role)
    }

    pub fn tool_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ToolFailed, reason).with_context("tool", name)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn serialization_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationFailed, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_kind() {
        assert_eq!(Error::new(ErrorKind::AgentNotFound, "x").status(), ErrorStatus::Permanent);
        assert_eq!(Error::new(ErrorKind::RateLimited, "x").status(), ErrorStatus::Temporary);
        assert!(Error::new(ErrorKind::RateLimited, "x").is_retryable());
    }

    #[test]
    fn test_operation_chain_kept_in_context() {
        let err = Error::new(ErrorKind::IoFailed, "disk full")
            .with_operation("sink::write_output")
            .with_operation("crew::kickoff");

        assert_eq!(err.operation(), "crew::kickoff");
        assert_eq!(err.context(), [("called", "sink::write_output".to_string())]);
    }

    #[test]
    fn test_display_single_line() {
        let err = Error::schema_mismatch("FullItinerary", "missing field `total_estimated_cost`")
            .with_operation("schema::validate")
            .with_context("task", "2");

        assert_eq!(
            err.to_string(),
            "missing field `total_estimated_cost` (SchemaMismatch at schema::validate; schema=FullItinerary, task=2)"
        );

        let err = Error::new(ErrorKind::NetworkFailed, "connection reset");
        assert_eq!(err.to_string(), "connection reset (NetworkFailed, temporary)");
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_constructors() {
        let err = Error::agent_not_found("Budgeting Agent");
        assert_eq!(err.kind(), ErrorKind::AgentNotFound);
        assert_eq!(err.context()[0], ("role", "Budgeting Agent".to_string()));

        let err = Error::template_variable_missing("topic");
        assert_eq!(err.message(), "no input for placeholder {topic}");

        let err = Error::iteration_limit("Itinerary Planner", 15);
        assert_eq!(err.kind(), ErrorKind::IterationLimit);
        assert!(err.message().contains("15"));
    }
}
