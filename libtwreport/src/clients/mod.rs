//! Remote moderation clients
//!
//! A client makes exactly one request per call. Retrying on rate limits is
//! left to [`crate::engine::BatchEngine`] so the back-off policy lives in
//! one place.
//!
//! # Examples
//!
//! ```no_run
//! use libtwreport::clients::{RemoteActionClient, twitter::TwitterClient};
//! use libtwreport::config::Credentials;
//! use libtwreport::types::ActionOutcome;
//!
//! # async fn example() -> libtwreport::error::Result<()> {
//! let credentials = Credentials::new("key", "secret", "token", "token-secret");
//! let mut client = TwitterClient::new(credentials)?;
//!
//! client.verify_credentials().await?;
//!
//! match client.act("some_spammer", true).await {
//!     ActionOutcome::Success { identifier, blocked } => {
//!         println!("reported {} (blocked: {})", identifier, blocked)
//!     }
//!     ActionOutcome::RateLimited => println!("over the limit, wait and retry"),
//!     ActionOutcome::Failed { cause } => eprintln!("failed: {}", cause),
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ActionOutcome;

pub mod oauth;
pub mod twitter;

// Mock client is available for all builds (not just tests) to support integration tests
pub mod mock;

#[async_trait]
pub trait RemoteActionClient: Send + Sync {
    /// Check the credentials before any action is attempted.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Authentication` if the service rejects the
    /// credentials or cannot be reached.
    async fn verify_credentials(&mut self) -> Result<()>;

    /// Report `identifier`, blocking it as well when `block` is set.
    ///
    /// `identifier` must be non-empty. The outcome distinguishes a rate
    /// limit (worth waiting out) from every other failure.
    async fn act(&self, identifier: &str, block: bool) -> ActionOutcome;

    /// Lowercase client name for logs
    fn name(&self) -> &str;
}
