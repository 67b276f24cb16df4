use std::path::PathBuf;
use std::time::Duration;
use xws::{Credentials, EnvSource, ExchangeId, ExecutionConfig, ExecutionMode};

/// Value `XWS_EXEC_ARM` must hold before anything leaves paper mode.
pub const ARM_SENTINEL: &str = "1";

/// Execution policy as read from the environment for one order attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub mode: ExecutionMode,
    pub arm_value: Option<String>,
    pub hl_user: Option<String>,
    pub hl_private_key: Option<String>,
    pub paper_state_dir: Option<PathBuf>,
}

impl ExecutionPolicy {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self {
            mode: env
                .get_optional("XWS_EXEC_MODE")
                .map(|v| ExecutionMode::from_selector(&v))
                .unwrap_or_default(),
            arm_value: env.get_optional("XWS_EXEC_ARM"),
            hl_user: env.get_optional("XWS_HL_USER"),
            hl_private_key: env.get_optional("XWS_HL_PRIVATE_KEY"),
            paper_state_dir: env.get_optional("XWS_PAPER_STATE_DIR").map(PathBuf::from),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.arm_value.as_deref() == Some(ARM_SENTINEL)
    }

    /// Credential pair for `exchange`, only when both halves are present.
    pub fn credentials(&self, exchange: ExchangeId) -> Option<Credentials> {
        if !exchange.requires_credentials() {
            return None;
        }
        match (&self.hl_user, &self.hl_private_key) {
            (Some(user), Some(secret)) => Some(Credentials {
                user: user.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        }
    }

    pub fn execution_config(&self, exchange: ExchangeId) -> ExecutionConfig {
        let credentials = self.credentials(exchange);
        ExecutionConfig {
            mode: self.mode,
            arm_live: self.is_armed(),
            arm_value: self.arm_value.clone(),
            user_address: credentials.as_ref().map(|c| c.user.clone()),
            credentials,
            paper_state_dir: self.paper_state_dir.clone(),
        }
    }
}

/// Knobs for the polling side of the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewaySettings {
    pub poll_interval: Duration,
    pub drain_batch: usize,
    pub default_max_messages: u32,
    pub default_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            drain_batch: 10,
            default_max_messages: 10,
            default_timeout_secs: 15,
        }
    }
}

impl GatewaySettings {
    /// Defaults, with `XWS_DEMO_MAX_MESSAGES` / `XWS_DEMO_TIMEOUT` overrides.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let base = Self::default();
        Self {
            default_max_messages: env.get_positive_u32("XWS_DEMO_MAX_MESSAGES", base.default_max_messages),
            default_timeout_secs: u64::from(
                env.get_positive_u32("XWS_DEMO_TIMEOUT", base.default_timeout_secs as u32),
            ),
            ..base
        }
    }
}
