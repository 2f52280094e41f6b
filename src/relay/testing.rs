//! Test doubles for the upstream API.

use super::{CompletionApi, RelayRequest};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upstream double that records requests and replays a canned result.
pub struct FakeUpstream {
    reply: Mutex<Option<Result<Value>>>,
    delay: Duration,
    seen: Mutex<Vec<RelayRequest>>,
}

impl FakeUpstream {
    /// Reply once with `reply`, then with an empty object.
    pub fn replying(reply: Result<Value>) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(reply)),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Sleep for `delay` before replying.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(Ok(json!({})))),
            delay,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far.
    pub fn seen(&self) -> Vec<RelayRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionApi for FakeUpstream {
    async fn create_response(&self, request: &RelayRequest) -> Result<Value> {
        self.seen.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(json!({})))
    }
}
