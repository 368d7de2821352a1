//! # crewcraft-llm
//!
//! The boundary between a crew and the hosted model.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (OpenAI-compatible endpoints)
//! - **Messages**: Chat history with tool calls and tool results
//! - **Usage**: Token accounting across every call a crew makes

pub mod error;
pub mod provider;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, ToolCall, ToolDefinition,
    Usage, UsageTracker,
};
