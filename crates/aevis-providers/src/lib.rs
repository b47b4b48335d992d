//! HTTP clients for the external AI collaborators aevis probes through.
//!
//! [`AnswerClient`] talks to an OpenAI-compatible chat-completions gateway
//! and is the only way the engine obtains generated answers.
//! [`SearchClient`] is the injected web-search collaborator paired with
//! platforms that lack native retrieval. [`retry_with_backoff`] provides the
//! cross-cutting retry policy for transient failures.

pub mod answer;
pub mod error;
pub mod retry;
pub mod search;

pub use answer::{Answer, AnswerClient};
pub use error::ProviderError;
pub use retry::{is_retriable, retry_with_backoff};
pub use search::SearchClient;
