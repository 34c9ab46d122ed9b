//! Upload transports.

use async_trait::async_trait;
use attache_config::{AuthScheme, UploadConfig};
use attache_http_client::{HttpClient, Method, ProgressFn, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    ResponseParser, Result, UploadError, UploadResult, UploadedFile, build_form,
    parse_response,
};

/// Sends one file to a remote endpoint.
///
/// Implementations report every failure through the returned `Result`;
/// they never panic on bad input or network trouble.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload `file` as described by `config`.
    ///
    /// `on_progress` is only consulted when `config.enable_progress` is set.
    async fn send(
        &self,
        file: &UploadedFile,
        config: &UploadConfig,
        on_progress: Option<ProgressFn>,
    ) -> Result<UploadResult>;
}

/// Multipart HTTP upload transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
    parser: Option<ResponseParser>,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(HttpClient::with_defaults()?))
    }

    /// Create a transport on top of an existing client.
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            parser: None,
        }
    }

    /// Read `custom` format responses with `parser` instead of the dotted
    /// `url_response_field` path.
    pub fn with_response_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&Value, &UploadedFile) -> Option<UploadResult> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Get the underlying client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| UploadError::Configuration(format!("invalid HTTP method: {}", raw)))
}

fn apply_auth<'a>(request: RequestBuilder<'a>, config: &UploadConfig) -> RequestBuilder<'a> {
    let Some(key) = config.credential() else {
        return request;
    };
    match config.auth_scheme {
        AuthScheme::Bearer => request.bearer_auth(key),
        AuthScheme::ApiKey => request.api_key(key),
        AuthScheme::Basic => request.basic_credentials(key),
        AuthScheme::Custom => request,
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(
        &self,
        file: &UploadedFile,
        config: &UploadConfig,
        on_progress: Option<ProgressFn>,
    ) -> Result<UploadResult> {
        let endpoint = config.endpoint().ok_or(UploadError::MissingEndpoint)?;
        let method = parse_method(&config.http_method)?;

        let progress = if config.enable_progress {
            on_progress
        } else {
            None
        };
        let form = build_form(file, config, progress).await?;

        let mut request = apply_auth(self.client.request(method.clone(), endpoint), config);
        for (name, value) in config.extra_headers.iter() {
            request = request.header(name, value);
        }
        request = request.multipart(form);
        if let Some(timeout) = config.timeout() {
            request = request.timeout(timeout);
        }

        debug!(
            method = %method,
            endpoint = %endpoint,
            size = file.size(),
            auth = ?config.auth_scheme,
            "Dispatching upload"
        );

        let response = request.send().await?;
        if !response.is_success() {
            return Err(UploadError::HttpStatus {
                status: response.status().as_u16(),
                status_text: response.status_text().to_string(),
            });
        }

        let result = parse_response(&response, config, file, self.parser.as_ref())?;
        info!(
            endpoint = %endpoint,
            reference = %result.reference_url,
            "Upload completed"
        );
        Ok(result)
    }
}
