//! Query relay to a hosted vector store.
//!
//! A request body is validated into a [`RelayRequest`], forwarded to the
//! provider's Responses API with the file search tool, and the answer text
//! is pulled out of whatever shape the provider returned.

pub mod extract;
pub mod request;
pub mod service;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::{extract_answer, ResponseShape, FALLBACK_ANSWER};
pub use request::{parse_body, validate, RelayRequest, QUERY_FIELDS};
pub use service::{RelayBody, RelayOutcome, RelayService};
pub use upstream::{CompletionApi, OpenAIResponses};
