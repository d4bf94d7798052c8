//! ClickHouse HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Url;

use super::{InsertPayload, Transport};
use crate::error::TransportError;

/// Default ClickHouse HTTP endpoint
pub const DEFAULT_URL: &str = "http://localhost:8123";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the numeric server exception code
pub const EXCEPTION_CODE_HEADER: &str = "X-ClickHouse-Exception-Code";

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    pub url: String,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            database: None,
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpTransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// POSTs insert payloads to the ClickHouse HTTP interface
///
/// The statement travels in the body ahead of the rows, so the endpoint
/// carries no `query` parameter. No retries: a failed request is reported
/// to the caller as is.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let mut endpoint = Url::parse(&config.url).map_err(|e| TransportError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        if let Some(database) = &config.database {
            endpoint.query_pairs_mut().append_pair("database", database);
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Request URL including the database parameter
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: InsertPayload) -> Result<(), TransportError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/octet-stream");

        if let Some(encoding) = payload.compression.content_encoding() {
            request = request.header(CONTENT_ENCODING, encoding);
        }

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let bytes = payload.body.len();
        let response = request.body(payload.body).send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::debug!(
                sequence = payload.sequence,
                rows = payload.rows,
                bytes,
                "batch accepted"
            );
            return Ok(());
        }

        let header_code = response
            .headers()
            .get(EXCEPTION_CODE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());
        let body = response.text().await.unwrap_or_default();
        let code = header_code.or_else(|| parse_exception_code(&body));

        tracing::warn!(
            sequence = payload.sequence,
            status = status.as_u16(),
            code = ?code,
            "clickhouse rejected batch"
        );

        Err(TransportError::Server {
            status: status.as_u16(),
            code,
            body: body.trim().to_string(),
        })
    }
}

/// Extract `N` from a `Code: N. DB::Exception: ...` body
pub fn parse_exception_code(body: &str) -> Option<u32> {
    let rest = body.trim_start().strip_prefix("Code:")?.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
