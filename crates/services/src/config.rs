use std::env;
use std::time::Duration;

use url::Url;

use crate::error::GatewayError;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the submission backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `TESTSET_API_BASE_URL`, `TESTSET_API_TOKEN` and
    /// `TESTSET_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Endpoint` if the base url does not parse.
    pub fn from_env() -> Result<Self, GatewayError> {
        let raw = env::var("TESTSET_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());
        let api_token = env::var("TESTSET_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let timeout = env::var("TESTSET_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            base_url: parse_base_url(&raw)?,
            api_token,
            timeout: Duration::from_secs(timeout),
        })
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// Parses an API base url.
///
/// # Errors
///
/// Returns `GatewayError::Endpoint` for anything that is not an absolute
/// http(s) url.
pub fn parse_base_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw.trim()).map_err(|err| GatewayError::Endpoint(format!("{raw}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GatewayError::Endpoint(format!(
            "{raw}: unsupported scheme `{other}`"
        ))),
    }
}
