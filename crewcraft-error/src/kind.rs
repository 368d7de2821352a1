//! What went wrong, as a closed set callers can match on

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Nothing more specific applies
    Unexpected,

    // Declaring a crew
    ConfigInvalid,
    InvalidArgument,
    /// A task names a role no agent plays
    AgentNotFound,
    /// A `{placeholder}` has no run input
    TemplateVariableMissing,

    // Running a crew
    /// A structured answer does not fit its output type
    SchemaMismatch,
    /// An agent was still calling tools when its budget ran out
    IterationLimit,
    ToolFailed,
    /// The manager's answer named no usable coworker
    DelegationFailed,

    // Talking to the model
    InferenceFailed,
    ProviderUnavailable,
    RateLimited,
    /// Credentials missing or rejected
    Unauthenticated,

    // Files and the network
    FileNotFound,
    PermissionDenied,
    IoFailed,
    NetworkFailed,
    ParseFailed,
    SerializationFailed,
}

impl ErrorKind {
    /// Kinds that usually clear up on their own
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
