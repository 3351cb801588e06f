//! Authenticated HTTP access to the moderation backend.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::{ActionError, FetchError},
    protocol::{ActionResponse, ApiErrorBody},
};
use tracing::{debug, error, warn};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Bearer-authenticated client bound to one backend base URL.
///
/// Cloning is cheap; adapters each hold their own handle.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `segments` below the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint(segments);
        let request = self.http.get(url.clone()).query(query);
        let response = self
            .send(Method::GET, &url, request)
            .await
            .map_err(SendFailure::into_fetch)?;
        let body = response.text().await.map_err(|err| {
            log_transport_failure(&Method::GET, &url, &err);
            classify_transport_error(&err)
        })?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        serde_json::from_str(&body).map_err(|err| {
            warn!(
                method = %Method::GET,
                path = url.path(),
                error = %err,
                "moderation api returned an unreadable body"
            );
            FetchError::MalformedResponse(err.to_string())
        })
    }

    /// Posts an approve/reject style body.
    ///
    /// Once the request has left, losing the response is reported as
    /// [`ActionError::ResponseLost`] since the server may have applied it.
    pub async fn post_action<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ActionResponse, ActionError> {
        let url = self.endpoint(segments);
        let request = self.http.post(url.clone()).json(body);
        let response = self
            .send(Method::POST, &url, request)
            .await
            .map_err(SendFailure::into_action)?;
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            log_transport_failure(&Method::POST, &url, &err);
            ActionError::ResponseLost(classify_transport_error(&err))
        })?;

        // Bodies that are not JSON still acknowledge a 2xx.
        let parsed: ActionResponse = serde_json::from_str(&body).unwrap_or_default();
        if parsed.success == Some(false) {
            let message = parsed
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(
                method = %Method::POST,
                path = url.path(),
                status = status.as_u16(),
                message = %message,
                "moderation api rejected the action"
            );
            return Err(ActionError::ServerError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(parsed)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<Response, SendFailure> {
        debug!(method = %method, path = url.path(), "moderation api request");
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| {
                log_transport_failure(&method, url, &err);
                let classified = classify_transport_error(&err);
                if err.is_connect() || err.is_builder() {
                    SendFailure::Unsent(classified)
                } else {
                    SendFailure::Unanswered(classified)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = format!("{:?}", response.headers());
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        error!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            headers = %headers,
            message = %message,
            "moderation api request failed"
        );
        Err(SendFailure::Rejected(FetchError::ServerError {
            status: status.as_u16(),
            message,
        }))
    }
}

/// Where a request failed relative to reaching the server.
enum SendFailure {
    Unsent(FetchError),
    Unanswered(FetchError),
    Rejected(FetchError),
}

impl SendFailure {
    fn into_fetch(self) -> FetchError {
        match self {
            Self::Unsent(err) | Self::Unanswered(err) | Self::Rejected(err) => err,
        }
    }

    fn into_action(self) -> ActionError {
        match self {
            Self::Unsent(err) | Self::Rejected(err) => ActionError::from(err),
            Self::Unanswered(FetchError::Timeout) => ActionError::Timeout,
            Self::Unanswered(err) => ActionError::ResponseLost(err),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("base url must not be empty"));
    }
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).with_context(|| format!("invalid base url '{raw}'"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("base url '{raw}' cannot carry a path"));
    }
    Ok(url)
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string())
}

fn classify_transport_error(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::ServerError {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        FetchError::NetworkUnreachable
    }
}

fn log_transport_failure(method: &Method, url: &Url, err: &reqwest::Error) {
    error!(
        method = %method,
        path = url.path(),
        connect = err.is_connect(),
        timeout = err.is_timeout(),
        error = %err,
        "moderation api request got no response"
    );
}
