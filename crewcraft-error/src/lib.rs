//! # crewcraft-error
//!
//! Shared error handling for the crewcraft crates.
//!
//! - [`ErrorKind`] says what failed (a missing agent, a schema mismatch, a rate limit)
//! - [`ErrorStatus`] says whether trying again could help
//! - context pairs and the operation name point at where it happened
//! - third-party errors ride along as the `source`
//!
//! ```rust
//! use crewcraft_error::{Error, ErrorKind, Result};
//!
//! fn find(role: &str) -> Result<()> {
//!     Err(Error::agent_not_found(role)
//!         .with_operation("crew::build")
//!         .with_context("task", "2"))
//! }
//!
//! assert_eq!(find("Code Writer").unwrap_err().kind(), ErrorKind::AgentNotFound);
//! ```
//!
//! An error is wrapped once, at the boundary where a foreign error enters;
//! callers above it only add context. `From` exists for `std::io::Error` and
//! provider errors, nothing else.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

pub type Result<T> = std::result::Result<T, Error>;
