use async_trait::async_trait;
use std::time::Duration;
use wayfinder_config::BackendConfig;
use wayfinder_http::{HttpClient, HttpError, RequestOpts};

use crate::decode::{BackendResponse, decode_body};
use crate::types::TripRequest;

/// Anything that can turn a trip request into a planner answer.
///
/// Implementations never fail: transport problems come back as
/// [`BackendResponse::Error`].
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    async fn plan(&self, request: &TripRequest) -> BackendResponse;

    /// Where requests go, for logs and the status line.
    fn endpoint(&self) -> &str;
}

/// POSTs trip requests to a single webhook URL.
#[derive(Clone)]
pub struct WebhookClient {
    http: HttpClient,
    endpoint: String,
}

impl WebhookClient {
    pub fn new(endpoint: &str) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(endpoint)?,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(cfg: &BackendConfig) -> Result<Self, HttpError> {
        Ok(Self::new(&cfg.endpoint)?.with_timeout(cfg.timeout()))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl PlannerBackend for WebhookClient {
    async fn plan(&self, request: &TripRequest) -> BackendResponse {
        tracing::info!(
            endpoint = %self.endpoint,
            prompt_len = request.user_prompt.len(),
            lat = request.user_location.lat,
            lng = request.user_location.lng,
            "backend.plan.start"
        );

        let resp = match self
            .http
            .post_json_text("", request, RequestOpts::default())
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(endpoint = %self.endpoint, error = %err, "backend.plan.transport_error");
                return BackendResponse::transport_error(err.to_string());
            }
        };

        // Status and content type are informational only.
        tracing::debug!(
            status = %resp.status,
            content_type = ?resp.content_type,
            body_len = resp.body.len(),
            "backend.plan.response"
        );

        let classified = BackendResponse::from_decoded(decode_body(&resp.body));
        if let BackendResponse::RawText { parse_error, .. } = &classified {
            tracing::warn!(status = %resp.status, %parse_error, "backend.plan.unparsable");
        }
        tracing::info!(kind = classified.kind(), status = %resp.status, "backend.plan.done");
        classified
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_never_times_out() {
        let client = WebhookClient::from_config(&BackendConfig::default()).unwrap();
        assert_eq!(client.http.default_timeout, None);
        assert_eq!(client.http.connect_timeout(), None);
    }

    #[test]
    fn configured_timeout_bounds_connect_too() {
        let cfg = BackendConfig {
            timeout_secs: Some(45),
            ..BackendConfig::default()
        };
        let client = WebhookClient::from_config(&cfg).unwrap();
        assert_eq!(client.http.connect_timeout(), Some(Duration::from_secs(45)));
    }
}
