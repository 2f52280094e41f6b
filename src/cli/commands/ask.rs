//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::relay::{request::validate_fields, RelayService};
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Run the ask command: one relay call, answer printed to the terminal.
pub async fn run_ask(
    query: &str,
    vector_store: Option<String>,
    model: Option<String>,
    top_k: Option<u32>,
    settings: Settings,
) -> Result<()> {
    let fields = ask_fields(query, vector_store, model, top_k);

    let settings = Arc::new(settings);
    let request = validate_fields(&fields, &settings)?;

    let relay = RelayService::from_settings(settings.clone())?;
    if let Some(reason) = relay.unavailable_reason() {
        anyhow::bail!("{}", reason);
    }

    let spinner = Output::spinner("Searching...");
    let result = relay.answer(&request).await;
    spinner.finish_and_clear();

    let answer = result?;
    Output::answer(&answer, &request.vector_store_id);

    Ok(())
}

/// Shape command-line arguments like a request body so they go through the
/// same validation as HTTP callers.
fn ask_fields(
    query: &str,
    vector_store: Option<String>,
    model: Option<String>,
    top_k: Option<u32>,
) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("query".to_string(), Value::from(query));
    if let Some(id) = vector_store {
        fields.insert("vector_store_id".to_string(), Value::from(id));
    }
    if let Some(model) = model {
        fields.insert("model".to_string(), Value::from(model));
    }
    if let Some(k) = top_k {
        fields.insert("top_k".to_string(), Value::from(k));
    }
    fields
}
