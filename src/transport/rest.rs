//! # REST Transport
//!
//! Wraps a `reqwest::Client` configured once from [`ConsoleConfig`]: base URL, request
//! timeout, and the bearer credential attached to every call. Failures come back as
//! [`TransportError`]s with the response body preserved for normalization.
//!
//! A `401` from any call flips the session signal returned by
//! [`RestTransport::session_expired`]. Deciding what to do about it (re-login, exit) is
//! left to whoever observes the signal.

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use resource_sync::{Download, ResponseBody, TransportError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone)]
pub struct RestTransport {
    http: Client,
    base_url: Url,
    session: Arc<watch::Sender<bool>>,
}

impl RestTransport {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ConsoleError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let (session, _) = watch::channel(false);
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session: Arc::new(session),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Becomes `true` once any call is answered with `401 Unauthorized`.
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.session.subscribe()
    }

    /// Clears the session signal, e.g. after the operator supplied a new token.
    pub fn reset_session(&self) {
        self.session.send_replace(false);
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    pub fn request<S: AsRef<str>>(&self, method: Method, segments: &[S]) -> RequestBuilder {
        self.http.request(method, self.url(segments))
    }

    /// Sends the request and returns the response if its status is a success.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Response received");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && !self.session.send_replace(true) {
            warn!("Session expired");
        }

        let body = error_body(response).await;
        Err(TransportError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// Sends the request and parses the body as JSON. An empty body reads as `null`.
    pub async fn json(&self, request: RequestBuilder) -> Result<(u16, Value), TransportError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok((status, Value::Null));
        }
        let body = serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
            status,
            reason: e.to_string(),
        })?;
        Ok((status, body))
    }

    /// Sends the request and keeps the raw body along with its `Content-Type`.
    pub async fn download(
        &self,
        request: RequestBuilder,
        file_stem: String,
    ) -> Result<Download, TransportError> {
        let response = self.send(request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Download {
            file_stem,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

async fn error_body(response: Response) -> ResponseBody {
    let Ok(bytes) = response.bytes().await else {
        return ResponseBody::Empty;
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return ResponseBody::Empty;
    }
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(json) => ResponseBody::Json(json),
        Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
