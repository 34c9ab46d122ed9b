//! Request builder.

use crate::{HttpClient, HttpClientError, Response, Result};
use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::multipart::Form;
use std::time::Duration;

/// HTTP request builder.
///
/// Headers are applied with replace semantics: setting a header that is
/// already present overwrites it, so later calls win. Headers set here also
/// override those derived from the body (such as the multipart
/// `Content-Type`).
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    multipart: Option<Form>,
    timeout: Option<Duration>,
    error: Option<HttpClientError>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            multipart: None,
            timeout: None,
            error: None,
        }
    }

    /// Set a header, replacing any earlier value with the same name.
    ///
    /// An invalid name or value is reported when the request is sent.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                if self.error.is_none() {
                    self.error = Some(HttpClientError::RequestBuild(format!(
                        "invalid header: {}",
                        name
                    )));
                }
            }
        }
        self
    }

    /// Send a multipart/form-data body.
    pub fn multipart(mut self, form: Form) -> Self {
        self.multipart = Some(form);
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Set basic authentication from an already-joined credential string,
    /// which is base64-encoded as is.
    pub fn basic_credentials(self, credentials: impl AsRef<str>) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_ref());
        self.header("Authorization", format!("Basic {}", encoded))
    }

    /// Set an `X-API-Key` header.
    pub fn api_key(self, key: impl AsRef<str>) -> Self {
        self.header("X-API-Key", key)
    }

    fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.or(self.client.config().timeout)
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let url = url::Url::parse(&self.url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", self.url, e)))?;
        let timeout = self.effective_timeout();

        let mut request = self.client.inner().request(self.method.clone(), url);

        // Add default headers from config
        for (name, value) in &self.client.config().default_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(form) = self.multipart {
            request = request.multipart(form);
        }

        // Request-specific headers replace defaults and body-derived headers.
        request = request.headers(self.headers);

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let request = request
            .build()
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;

        self.client.execute(request, timeout).await
    }
}
