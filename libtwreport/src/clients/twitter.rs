//! Twitter REST v1.1 client
//!
//! Uses `account/verify_credentials` to check the tokens and
//! `users/report_spam` to report (and optionally block) an account.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::clients::oauth::OAuthSigner;
use crate::clients::RemoteActionClient;
use crate::config::{Credentials, DEFAULT_API_BASE};
use crate::error::{RemoteError, Result};
use crate::types::ActionOutcome;

const VERIFY_PATH: &str = "/1.1/account/verify_credentials.json";
const REPORT_SPAM_PATH: &str = "/1.1/users/report_spam.json";

/// "Rate limit exceeded" and "You are over the limit for spam reports"
const RATE_LIMIT_CODES: [i64; 2] = [88, 205];

pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    signer: OAuthSigner,
}

#[derive(Debug, Deserialize)]
struct User {
    screen_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    #[serde(default)]
    message: String,
}

impl TwitterClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_API_BASE)
    }

    /// Point the client at another API host (a proxy or a test server)
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("twreport/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: OAuthSigner::new(credentials),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteActionClient for TwitterClient {
    async fn verify_credentials(&mut self) -> Result<()> {
        let url = self.url(VERIFY_PATH);
        let header = self.signer.authorization_header("GET", &url, &[])?;

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| {
                RemoteError::Authentication(format!(
                    "Could not reach Twitter to verify credentials: {}",
                    e
                ))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Authentication(format!(
            "Bad Authorization Tokens (HTTP {}): {}. \
             Suggestion: Check your consumer key/secret and access token/secret at https://developer.twitter.com/.",
            status.as_u16(),
            error_messages(&body).unwrap_or_else(|| status.to_string())
        ))
        .into())
    }

    async fn act(&self, identifier: &str, block: bool) -> ActionOutcome {
        let url = self.url(REPORT_SPAM_PATH);
        let block_flag = if block { "true" } else { "false" };
        let params = [("screen_name", identifier), ("perform_block", block_flag)];

        let header = match self.signer.authorization_header("POST", &url, &params) {
            Ok(header) => header,
            Err(e) => {
                return ActionOutcome::Failed {
                    cause: e.to_string(),
                }
            }
        };

        let response = match self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, header)
            .form(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return ActionOutcome::Failed {
                    cause: format!("Request failed: {}", e),
                }
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return ActionOutcome::Failed {
                    cause: format!("Failed to read response (HTTP {}): {}", status.as_u16(), e),
                }
            }
        };

        let outcome = classify_response(status, &body, identifier, block);
        debug!(identifier, status = status.as_u16(), ?outcome, "report_spam response");
        outcome
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

/// Map a `report_spam` response onto an outcome.
///
/// - 2xx → `Success`, with the screen name as Twitter spells it
/// - 429, or error code 88/205 → `RateLimited`
/// - anything else → `Failed`
fn classify_response(
    status: StatusCode,
    body: &str,
    identifier: &str,
    block: bool,
) -> ActionOutcome {
    if status.is_success() {
        let screen_name = serde_json::from_str::<User>(body)
            .ok()
            .and_then(|u| u.screen_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| identifier.to_string());
        return ActionOutcome::Success {
            identifier: screen_name,
            blocked: block,
        };
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ActionOutcome::RateLimited;
    }

    let errors = serde_json::from_str::<ApiErrors>(body).unwrap_or_default();
    if errors
        .errors
        .iter()
        .any(|e| RATE_LIMIT_CODES.contains(&e.code))
    {
        return ActionOutcome::RateLimited;
    }

    ActionOutcome::Failed {
        cause: format!(
            "HTTP {}: {}",
            status.as_u16(),
            error_messages(body).unwrap_or_else(|| status.to_string())
        ),
    }
}

/// "code N: message" for each error in a Twitter error body
fn error_messages(body: &str) -> Option<String> {
    let errors = serde_json::from_str::<ApiErrors>(body).ok()?;
    if errors.errors.is_empty() {
        return None;
    }
    Some(
        errors
            .errors
            .iter()
            .map(|e| format!("code {}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
