pub mod paper;
pub mod rate_limit;

use crate::error::Result;
use crate::types::{ExecutionMode, PlaceOrderAck, PlaceOrderRequest};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

pub use paper::{PaperExecutionClient, PositionState};
pub use rate_limit::RateLimitedClient;

/// User identifier + private credential for signed execution.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Execution policy and credentials for one order attempt. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    pub arm_live: bool,
    pub arm_value: Option<String>,
    pub user_address: Option<String>,
    pub credentials: Option<Credentials>,
    pub paper_state_dir: Option<PathBuf>,
}

#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn place(&self, request: &PlaceOrderRequest) -> Result<PlaceOrderAck>;
}
