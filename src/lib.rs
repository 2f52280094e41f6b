//! vsrelay - a small HTTP relay in front of a hosted vector store.
//!
//! Queries arrive as JSON, are forwarded to the OpenAI Responses API with the
//! `file_search` tool scoped to a vector store, and the answer text is
//! returned as `{"answer": ...}`. Search, embedding and document storage all
//! happen on the provider side.
//!
//! # Architecture
//!
//! - `config` - Settings loaded once at startup
//! - `relay` - Request validation, the upstream call and answer extraction
//! - `openai` - Provider client configuration
//! - `cli` - Command-line interface and the HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vsrelay::config::Settings;
//! use vsrelay::relay::RelayService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Arc::new(Settings::load()?);
//!     let relay = RelayService::from_settings(settings)?;
//!
//!     let outcome = relay.relay(br#"{"query": "what is the refund policy?"}"#).await;
//!     println!("{} {}", outcome.status, serde_json::to_string(&outcome.body)?);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod relay;

pub use error::{RelayError, Result, ValidationError};
