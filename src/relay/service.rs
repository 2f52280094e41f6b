//! Relay orchestration: validate, call upstream, extract, shape the reply.

use super::extract::extract_answer;
use super::request::{validate, RelayRequest};
use super::upstream::{CompletionApi, OpenAIResponses};
use crate::config::Settings;
use crate::error::{RelayError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// JSON body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayBody {
    Answer {
        answer: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// Status code and body for one relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub status: u16,
    pub body: RelayBody,
}

impl RelayOutcome {
    fn answer(answer: String) -> Self {
        Self {
            status: 200,
            body: RelayBody::Answer { answer },
        }
    }
}

impl From<&RelayError> for RelayOutcome {
    fn from(err: &RelayError) -> Self {
        Self {
            status: err.status_code(),
            body: RelayBody::Error {
                error: err.client_message(),
                detail: err.client_detail(),
            },
        }
    }
}

enum Upstream {
    Ready(Arc<dyn CompletionApi>),
    /// Client could not be built; the reason is reported per request.
    Unavailable(String),
}

/// Stateless relay shared by all requests.
pub struct RelayService {
    settings: Arc<Settings>,
    upstream: Upstream,
}

impl RelayService {
    /// Create a relay backed by the OpenAI Responses API.
    ///
    /// A missing API key does not fail here; relay calls report it instead.
    /// Callers that want to refuse startup check [`RelayService::is_ready`].
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let upstream = match OpenAIResponses::new(&settings) {
            Ok(client) => Upstream::Ready(Arc::new(client)),
            Err(RelayError::Config(reason)) => {
                warn!(%reason, "Upstream client unavailable");
                Upstream::Unavailable(reason)
            }
            Err(e) => return Err(e),
        };
        Ok(Self { settings, upstream })
    }

    /// Create a relay with a custom upstream.
    pub fn with_upstream(settings: Arc<Settings>, upstream: Arc<dyn CompletionApi>) -> Self {
        Self {
            settings,
            upstream: Upstream::Ready(upstream),
        }
    }

    /// Whether upstream calls can be made.
    pub fn is_ready(&self) -> bool {
        matches!(self.upstream, Upstream::Ready(_))
    }

    /// Why upstream calls cannot be made, if they cannot.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.upstream {
            Upstream::Ready(_) => None,
            Upstream::Unavailable(reason) => Some(reason.as_str()),
        }
    }

    /// Settings snapshot this relay was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one raw request body. Never fails; errors become outcomes.
    pub async fn relay(&self, body: &[u8]) -> RelayOutcome {
        let span = info_span!("relay", request_id = %Uuid::new_v4());
        async move {
            let result = match validate(body, &self.settings) {
                Ok(request) => self.answer(&request).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(answer) => RelayOutcome::answer(answer),
                Err(err) => {
                    match &err {
                        RelayError::Validation(e) => info!(reason = %e, "Rejected request"),
                        other => error!(error = %other, "Relay failed"),
                    }
                    RelayOutcome::from(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Forward a validated request and extract its answer.
    pub async fn answer(&self, request: &RelayRequest) -> Result<String> {
        let upstream = match &self.upstream {
            Upstream::Ready(upstream) => upstream,
            Upstream::Unavailable(reason) => return Err(RelayError::Config(reason.clone())),
        };

        info!(
            model = %request.model,
            vector_store_id = %request.vector_store_id,
            top_k = request.top_k,
            "Forwarding query"
        );

        let started = Instant::now();
        let timeout = self.settings.openai.timeout();
        let response = tokio::time::timeout(timeout, upstream.create_response(request))
            .await
            .map_err(|_| RelayError::UpstreamTimeout(timeout))??;

        let answer = extract_answer(&response, self.settings.relay.single_line_answers);
        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            answer_len = answer.len(),
            "Answer extracted"
        );
        Ok(answer)
    }
}
