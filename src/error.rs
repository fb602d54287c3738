use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or empty query. Maps to a client error status.
    #[error("query must not be empty")]
    InvalidInput,

    /// A conversation id vanished between resolution and append. Only
    /// reachable when eviction races an in-flight exchange.
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    /// Transport or provider failure from the completion endpoint.
    /// Propagated without retry.
    #[error("completion request failed: {0}")]
    Completion(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Base prompt could not be loaded at startup.
    #[error("prompt error: {0}")]
    Prompt(String),
}
