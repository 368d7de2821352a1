//! The two ready-made crews
//!
//! - [`code`]: four agents take a programming topic from requirements to reviewed code
//! - [`travel`]: a manager model steers three agents through a trip plan with
//!   web search, structured JSON results and human review

pub mod code;
pub mod travel;
