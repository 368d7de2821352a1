//! Error status - how the caller should treat a failure

use std::fmt;

/// Whether an error may go away if the operation is attempted again.
///
/// crewcraft itself never retries; the status is surfaced so callers
/// (and log readers) can tell a flaky provider from a broken config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// Retrying won't help
    Permanent,
    /// Retrying may succeed (rate limits, network blips)
    Temporary,
}

impl ErrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
