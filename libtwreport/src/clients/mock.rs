//! Mock client for testing
//!
//! Lets tests script what each call returns (per identifier, or a default
//! for everyone) and inspect the calls that were made, without network
//! access or credentials.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::clients::RemoteActionClient;
use crate::error::{RemoteError, Result};
use crate::types::ActionOutcome;

/// What the mock answers to one `act` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Success,
    RateLimited,
    Failed(String),
}

/// Configuration for mock client behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,

    /// Whether credential verification should succeed
    pub verify_succeeds: bool,

    /// Answer for identifiers without a script (or whose script ran out)
    pub default_response: MockResponse,

    /// Per-identifier answers, consumed one per call
    pub scripts: HashMap<String, VecDeque<MockResponse>>,

    pub verify_call_count: Arc<Mutex<usize>>,

    /// Every `act` call as (identifier, block)
    pub calls: Arc<Mutex<Vec<(String, bool)>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            verify_succeeds: true,
            default_response: MockResponse::Success,
            scripts: HashMap::new(),
            verify_call_count: Arc::new(Mutex::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub struct MockClient {
    config: MockConfig,
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    verified: bool,
}

impl MockClient {
    pub fn new(config: MockConfig) -> Self {
        let scripts = Mutex::new(config.scripts.clone());
        Self {
            config,
            scripts,
            verified: false,
        }
    }

    /// Every action succeeds
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    /// Credential verification fails
    pub fn auth_failure() -> Self {
        Self::new(MockConfig {
            verify_succeeds: false,
            ..Default::default()
        })
    }

    /// Every action gets the same answer
    pub fn always(response: MockResponse) -> Self {
        Self::new(MockConfig {
            default_response: response,
            ..Default::default()
        })
    }

    /// Answer calls for `identifier` from `responses` in order
    pub fn with_script(self, identifier: &str, responses: Vec<MockResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(identifier.to_string(), responses.into());
        self
    }

    pub fn verify_call_count(&self) -> usize {
        *self.config.verify_call_count.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.config.calls.lock().unwrap().clone()
    }

    /// Number of `act` calls made for `identifier`
    pub fn calls_for(&self, identifier: &str) -> usize {
        self.calls().iter().filter(|(id, _)| id == identifier).count()
    }

    fn next_response(&self, identifier: &str) -> MockResponse {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(identifier)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(|| self.config.default_response.clone())
    }
}

#[async_trait]
impl RemoteActionClient for MockClient {
    async fn verify_credentials(&mut self) -> Result<()> {
        *self.config.verify_call_count.lock().unwrap() += 1;

        if self.config.verify_succeeds {
            self.verified = true;
            Ok(())
        } else {
            Err(RemoteError::Authentication("Mock verification failed".to_string()).into())
        }
    }

    async fn act(&self, identifier: &str, block: bool) -> ActionOutcome {
        self.config
            .calls
            .lock()
            .unwrap()
            .push((identifier.to_string(), block));

        if !self.verified {
            return ActionOutcome::Failed {
                cause: "Not verified".to_string(),
            };
        }

        match self.next_response(identifier) {
            MockResponse::Success => ActionOutcome::Success {
                identifier: identifier.to_string(),
                blocked: block,
            },
            MockResponse::RateLimited => ActionOutcome::RateLimited,
            MockResponse::Failed(cause) => ActionOutcome::Failed { cause },
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
