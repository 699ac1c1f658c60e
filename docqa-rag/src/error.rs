//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
///
/// A refusal is not an error: when the evidence does not contain the answer
/// the generator returns [`AnswerKind::Refusal`](crate::AnswerKind::Refusal).
#[derive(Debug, Error)]
pub enum RagError {
    /// A required setting is missing or invalid. Raised before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source document could not be read or parsed.
    #[error("Document error: {0}")]
    Document(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store is unreachable or rejected a read or write.
    #[error("Storage error ({backend}): {message}")]
    Storage {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model call failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A caller violated an operation's precondition.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RagError {
    pub(crate) fn storage(backend: &str, message: impl Into<String>) -> Self {
        Self::Storage { backend: backend.to_string(), message: message.into() }
    }

    pub(crate) fn generation(provider: &str, message: impl Into<String>) -> Self {
        Self::Generation { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for docqa operations.
pub type Result<T> = std::result::Result<T, RagError>;
