//! reqwest-backed completion transport
//!
//! One `PUT` per export: JSON body, bearer token, redirects followed up to
//! the client's limit, no timeout. Anything that stops the exchange from
//! completing becomes a [`TransportError`]; a completed exchange is handed to
//! [`validate_response`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use course_export_core::{validate_response, ApiSettingsSource, CompletionTransport};
use course_export_domain::{CourseExportError, DeliveryError, TransportError, TransportErrorKind};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;

use crate::http::{HttpClient, HttpSendError};

/// Sends export payloads to the endpoint named by an [`ApiSettingsSource`].
pub struct HttpCompletionTransport {
    client: HttpClient,
    settings: Arc<dyn ApiSettingsSource>,
}

impl HttpCompletionTransport {
    pub fn new(client: HttpClient, settings: Arc<dyn ApiSettingsSource>) -> Self {
        Self { client, settings }
    }

    /// Transport with the default single-attempt client.
    pub fn with_settings(settings: Arc<dyn ApiSettingsSource>) -> Result<Self, CourseExportError> {
        Ok(Self::new(HttpClient::new()?, settings))
    }

    fn diagnostics(&self, url: &str, started: Instant) -> ConnectionDiagnostics {
        ConnectionDiagnostics {
            url: url.to_string(),
            method: Method::PUT,
            http_version: "HTTP/1.1",
            max_redirects: self.client.max_redirects(),
            total_time: started.elapsed(),
            http_code: 0,
        }
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    #[instrument(skip_all, fields(payload_bytes = payload.len()))]
    async fn send(&self, payload: &str) -> Result<(), DeliveryError> {
        let settings = self.settings.api_settings();
        let started = Instant::now();

        let url = Url::parse(settings.url.trim()).map_err(|err| {
            TransportError::new(
                TransportErrorKind::UrlMalformed,
                format!("URL rejected: {err}"),
                self.diagnostics(&settings.url, started).to_string(),
            )
        })?;

        let request = self
            .client
            .request(Method::PUT, url.clone())
            .bearer_auth(&settings.token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_owned());

        let response = self.client.send_following(request).await.map_err(|err| {
            send_error(err, self.diagnostics(url.as_str(), started))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&err, self.diagnostics(url.as_str(), started)))?;

        debug!(http_status = status, elapsed_ms = started.elapsed().as_millis(), "export response received");
        validate_response(&body, status)?;
        Ok(())
    }
}

/// Connection details attached to every transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDiagnostics {
    pub url: String,
    pub method: Method,
    pub http_version: &'static str,
    pub max_redirects: usize,
    pub total_time: Duration,
    /// Always `0`: no response was received.
    pub http_code: u16,
}

impl fmt::Display for ConnectionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{url: '{}', method: '{}', http_version: '{}', max_redirects: {}, total_time: {:.6}, http_code: {}}}",
            self.url,
            self.method,
            self.http_version,
            self.max_redirects,
            self.total_time.as_secs_f64(),
            self.http_code
        )
    }
}

fn send_error(err: HttpSendError, diagnostics: ConnectionDiagnostics) -> TransportError {
    let kind = match &err {
        HttpSendError::Request(err) => return transport_error(err, diagnostics),
        HttpSendError::TooManyRedirects { .. } => TransportErrorKind::TooManyRedirects,
        HttpSendError::InvalidRedirect { .. } => TransportErrorKind::UrlMalformed,
    };
    TransportError::new(kind, err.to_string(), diagnostics.to_string())
}

fn transport_error(err: &reqwest::Error, diagnostics: ConnectionDiagnostics) -> TransportError {
    let description = describe(err);
    TransportError::new(classify(err, &description), description, diagnostics.to_string())
}

/// Map a failed exchange onto the libcurl-numbered kinds.
fn classify(err: &reqwest::Error, description: &str) -> TransportErrorKind {
    let lower = description.to_ascii_lowercase();

    if err.is_builder() {
        TransportErrorKind::UrlMalformed
    } else if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if lower.contains("dns error") || lower.contains("failed to lookup address") {
            TransportErrorKind::DnsResolution
        } else if lower.contains("tls") || lower.contains("certificate") {
            TransportErrorKind::Tls
        } else {
            TransportErrorKind::Connect
        }
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Receive
    } else if err.is_request() {
        TransportErrorKind::Send
    } else {
        TransportErrorKind::Other
    }
}

/// The error followed by its source chain, `: `-separated.
fn describe(err: &reqwest::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}
