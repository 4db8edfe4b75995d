use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::{Client, redirect};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{CredentialResolver, ServiceDeskCredentials};
use crate::models::{
    case_url::extract_case_url, service_desk::ServiceDeskPayload, ticket_request::TicketRequest,
};

/// The service desk gets one attempt of this length, there are no retries.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a single relay call.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayResult {
    /// Service desk answered with 2xx.
    Success { status: StatusCode, data: Value },
    /// Service desk answered, but not with 2xx.
    UpstreamError {
        status: StatusCode,
        status_text: String,
        body: Value,
    },
    /// Credentials missing or invalid, nothing was sent.
    ConfigError { reason: String },
    /// No response was received (DNS, refused connection, timeout ...).
    NetworkError { reason: String },
}

impl IntoResponse for RelayResult {
    fn into_response(self) -> Response {
        match self {
            RelayResult::Success { status, data } => (status, Json(data)).into_response(),
            RelayResult::UpstreamError {
                status,
                status_text,
                body,
            } => (
                status,
                Json(json!({
                    "error": "Service desk error",
                    "details": body,
                    "status": status.as_u16(),
                    "statusText": status_text,
                })),
            )
                .into_response(),
            RelayResult::ConfigError { reason } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Configuration error", "details": reason })),
            )
                .into_response(),
            RelayResult::NetworkError { reason } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Network error", "details": reason })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceDeskClient {
    http: Client,
    timeout: Duration,
}

impl ServiceDeskClient {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_timeout(DISPATCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { http, timeout })
    }

    /// Sends the payload once and classifies whatever comes back.
    pub async fn dispatch(
        &self,
        credentials: &ServiceDeskCredentials,
        payload: &ServiceDeskPayload,
    ) -> RelayResult {
        info!("Service desk Request URL: {}", credentials.endpoint_for_logs());

        let resp = match self
            .http
            .post(credentials.endpoint.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return self.network_error(&e),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return self.network_error(&e),
        };

        debug!(%status, "Service desk Response: {}", body);
        classify(status, &body)
    }

    fn network_error(&self, e: &reqwest::Error) -> RelayResult {
        let reason = if e.is_timeout() {
            format!("service desk did not respond within {:?}", self.timeout)
        } else {
            error_chain(e)
        };
        error!(%reason, "no response from service desk");
        RelayResult::NetworkError { reason }
    }
}

/// Turns a received response into a result. Bodies that are not JSON are
/// wrapped as `{"message": <text>}` so callers always get structured data.
pub fn classify(status: StatusCode, body: &str) -> RelayResult {
    let data = serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!({ "message": body }));

    if status.is_success() {
        RelayResult::Success { status, data }
    } else {
        RelayResult::UpstreamError {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: data,
        }
    }
}

fn error_chain(e: &reqwest::Error) -> String {
    let mut reason = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    reason
}

/// Resolve credentials, build the import payload and hand it to the
/// service desk. Missing credentials short-circuit before any request.
#[tracing::instrument(skip_all, fields(relay_id = %Uuid::new_v4(), messages = request.message_count()))]
pub async fn relay(
    resolver: &dyn CredentialResolver,
    client: &ServiceDeskClient,
    request: &TicketRequest,
) -> RelayResult {
    let credentials = match resolver.resolve().await {
        Ok(credentials) => credentials,
        Err(error) => {
            error!(%error, source = %resolver.source(), "service desk configuration invalid");
            return RelayResult::ConfigError {
                reason: error.to_string(),
            };
        }
    };

    let payload = ServiceDeskPayload::from_ticket_request(request, &credentials.identifier);
    let result = client.dispatch(&credentials, &payload).await;

    match &result {
        RelayResult::Success { status, data } => match extract_case_url(data) {
            Some(case_url) => info!(%status, %case_url, "case created"),
            None => info!(%status, "case created, no case URL returned"),
        },
        RelayResult::UpstreamError { status, body, .. } => {
            warn!(%status, %body, "service desk rejected the case");
        }
        RelayResult::ConfigError { .. } | RelayResult::NetworkError { .. } => {}
    }

    result
}
