//! Provider error conversion
//!
//! Re-exports crewcraft-error and maps provider failures onto it.

pub use crewcraft_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        let (kind, message) = match &err {
            ProviderError::Network(e) => (ErrorKind::NetworkFailed, e.clone()),
            ProviderError::Api { status, message } if *status >= 500 => {
                (ErrorKind::ProviderUnavailable, format!("{}: {}", status, message))
            }
            ProviderError::Api { status, message } => {
                (ErrorKind::InferenceFailed, format!("{}: {}", status, message))
            }
            ProviderError::Parse(e) => (ErrorKind::ParseFailed, e.clone()),
            ProviderError::RateLimited { .. } => (ErrorKind::RateLimited, err.to_string()),
            ProviderError::ModelNotFound(m) => {
                (ErrorKind::ConfigInvalid, format!("model '{}' not found", m))
            }
            ProviderError::Unauthenticated => (ErrorKind::Unauthenticated, err.to_string()),
            ProviderError::EmptyResponse => {
                (ErrorKind::InferenceFailed, "no content in response".to_string())
            }
        };

        let mut error = Error::new(kind, message).with_operation("provider::complete");
        if let ProviderError::RateLimited { retry_after: Some(secs) } = &err {
            error = error.with_context("retry_after", secs.to_string());
        }
        error.set_source(err)
    }
}

/// Create an Unauthenticated error for a missing credential
pub fn missing_credential(var: impl Into<String>) -> Error {
    let var = var.into();
    Error::new(ErrorKind::Unauthenticated, format!("{} is not set", var))
        .with_context("env", var)
}
