use std::time::Duration;

use course_export_domain::constants::MAX_REDIRECTS;
use course_export_domain::CourseExportError;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::{redirect, Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use thiserror::Error;
use tracing::debug;

use crate::errors::InfraError;

/// Why [`HttpClient::send_following`] produced no final response.
#[derive(Debug, Error)]
pub enum HttpSendError {
    /// The request itself failed.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The redirect cap was reached.
    #[error("Maximum ({limit}) redirects followed")]
    TooManyRedirects { limit: usize },

    /// A `Location` header could not be resolved to a URL.
    #[error("Redirect location '{location}' is not a valid URL")]
    InvalidRedirect { location: String },
}

/// Single-attempt HTTP client.
///
/// Failed requests are reported as-is; retry policy belongs to whoever runs
/// the task queue. reqwest's own redirect handling is disabled: redirects are
/// followed by [`HttpClient::send_following`], which keeps the method and body
/// on every hop.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_redirects: usize,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, CourseExportError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Redirects followed before giving up.
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Execute the request once. A redirect response is returned as-is.
    ///
    /// The raw `reqwest::Error` is returned so callers can classify it.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        self.execute(builder.build()?).await
    }

    /// Execute the request, following up to `max_redirects` redirects.
    ///
    /// Every hop repeats the original method, headers and body, whatever the
    /// 3xx code. `Authorization` is dropped once the redirect leaves the
    /// original host. A request whose body cannot be replayed stops at the
    /// first redirect response.
    pub async fn send_following(&self, builder: RequestBuilder) -> Result<Response, HttpSendError> {
        let mut request = builder.build()?;
        let origin = request.url().clone();
        let mut redirects = 0;

        loop {
            let replay = request.try_clone();
            let response = self.execute(request).await?;

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(response);
            };
            let Some(mut next) = replay else {
                return Ok(response);
            };

            if redirects == self.max_redirects {
                return Err(HttpSendError::TooManyRedirects { limit: self.max_redirects });
            }

            let location = String::from_utf8_lossy(location.as_bytes()).into_owned();
            let target = response
                .url()
                .join(&location)
                .map_err(|_| HttpSendError::InvalidRedirect { location: location.clone() })?;

            let same_origin = target.host_str() == origin.host_str()
                && target.port_or_known_default() == origin.port_or_known_default();
            if !same_origin {
                next.headers_mut().remove(AUTHORIZATION);
            }

            redirects += 1;
            debug!(status = %response.status(), %target, redirects, "following redirect");
            *next.url_mut() = target;
            request = next;
        }
    }

    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(err)
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    max_redirects: usize,
    http1_only: bool,
    keep_idle_connections: bool,
    use_proxy: bool,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            max_redirects: MAX_REDIRECTS,
            http1_only: true,
            keep_idle_connections: false,
            use_proxy: true,
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Overall request timeout. Unset by default: requests may wait forever.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, redirects: usize) -> Self {
        self.max_redirects = redirects;
        self
    }

    pub fn http1_only(mut self, enabled: bool) -> Self {
        self.http1_only = enabled;
        self
    }

    /// Keep connections open for reuse after a response was read.
    pub fn keep_idle_connections(mut self, enabled: bool) -> Self {
        self.keep_idle_connections = enabled;
        self
    }

    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` from the environment.
    /// Enabled by default.
    pub fn use_proxy(mut self, enabled: bool) -> Self {
        self.use_proxy = enabled;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, CourseExportError> {
        let mut builder = ReqwestClient::builder().redirect(redirect::Policy::none());

        if !self.use_proxy {
            builder = builder.no_proxy();
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if self.http1_only {
            builder = builder.http1_only();
        }

        if !self.keep_idle_connections {
            builder = builder.pool_max_idle_per_host(0);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            CourseExportError::from(infra)
        })?;

        Ok(HttpClient { client, max_redirects: self.max_redirects })
    }
}
