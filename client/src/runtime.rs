// client/src/runtime.rs
//
// The contract the execguard demo programs against, plus the default
// implementation backed by public websocket feeds and paper execution.

use crate::config::ExchangeConfig;
use crate::discovery;
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{Result, RuntimeError};
use crate::exec::rate_limit::limiter_for;
use crate::exec::{ExecutionClient, ExecutionConfig, PaperExecutionClient, RateLimitedClient};
use crate::mux::envelope::EnvelopeSource;
use crate::mux::sources::{keepalive, subscribe_payloads, websocket_frames};
use crate::mux::{MuxOptions, StreamTask};
use crate::types::{ChannelKind, ExchangeId, MuxSubscription};
use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Bumped whenever a method of [`ExchangeRuntime`] changes meaning.
pub const CONTRACT_VERSION: u32 = 1;

#[async_trait]
pub trait ExchangeRuntime: Send + Sync {
    fn contract_version(&self) -> u32 {
        CONTRACT_VERSION
    }

    fn resolve_exchange_config(&self, exchange: ExchangeId) -> Result<ExchangeConfig>;

    fn supports_symbol_discovery(&self, exchange: ExchangeId) -> bool;

    async fn list_symbols(&self, exchange: ExchangeId, config: &ExchangeConfig) -> Result<Vec<String>>;

    fn create_execution_client(
        &self,
        config: &ExecutionConfig,
        exchange: ExchangeId,
    ) -> Result<Arc<dyn ExecutionClient>>;

    /// Prepares a stream without starting it; the caller decides where the
    /// returned worker runs.
    fn start_multiplexed_stream(
        &self,
        subscription: MuxSubscription,
        channel: ChannelKind,
        options: MuxOptions,
    ) -> StreamTask;
}

pub struct XwsRuntime {
    env: Arc<dyn EnvSource>,
    http: Client,
    limiters: Mutex<HashMap<ExchangeId, Arc<DefaultDirectRateLimiter>>>,
    paper: Mutex<HashMap<ExchangeId, Arc<PaperExecutionClient>>>,
}

impl XwsRuntime {
    pub fn new(env: Arc<dyn EnvSource>) -> Result<Self> {
        install_rustls_provider();
        Ok(Self {
            env,
            http: discovery::http_client()?,
            limiters: Mutex::new(HashMap::new()),
            paper: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_process_env() -> Result<Self> {
        Self::new(Arc::new(ProcessEnv))
    }

    fn limiter(&self, exchange: ExchangeId) -> Arc<DefaultDirectRateLimiter> {
        let mut limiters = match self.limiters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        limiters
            .entry(exchange)
            .or_insert_with(|| limiter_for(exchange, self.env.as_ref()))
            .clone()
    }

    fn paper_client(&self, exchange: ExchangeId, config: &ExecutionConfig) -> Arc<PaperExecutionClient> {
        let mut paper = match self.paper.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        paper
            .entry(exchange)
            .or_insert_with(|| {
                let client = match &config.paper_state_dir {
                    Some(dir) => PaperExecutionClient::with_state_file(
                        config.mode,
                        dir.join(format!("paper_{exchange}.json")),
                    ),
                    None => PaperExecutionClient::new(config.mode),
                };
                log::info!("paper execution client ready for {exchange}");
                Arc::new(client)
            })
            .clone()
    }
}

#[async_trait]
impl ExchangeRuntime for XwsRuntime {
    fn resolve_exchange_config(&self, exchange: ExchangeId) -> Result<ExchangeConfig> {
        ExchangeConfig::resolve(exchange, self.env.as_ref())
    }

    fn supports_symbol_discovery(&self, exchange: ExchangeId) -> bool {
        matches!(exchange, ExchangeId::Hl)
    }

    async fn list_symbols(&self, exchange: ExchangeId, config: &ExchangeConfig) -> Result<Vec<String>> {
        if !self.supports_symbol_discovery(exchange) {
            return Ok(Vec::new());
        }
        let base = config
            .http_url
            .as_ref()
            .ok_or_else(|| RuntimeError::Config(format!("{exchange} has no http endpoint")))?;
        self.limiter(exchange).until_ready().await;
        discovery::hl_meta_symbols(&self.http, base).await
    }

    fn create_execution_client(
        &self,
        config: &ExecutionConfig,
        exchange: ExchangeId,
    ) -> Result<Arc<dyn ExecutionClient>> {
        if !config.mode.is_paper() {
            return Err(RuntimeError::Unsupported(format!(
                "no signing backend linked for {exchange} {}",
                config.mode
            )));
        }
        let inner: Arc<dyn ExecutionClient> = self.paper_client(exchange, config);
        Ok(Arc::new(RateLimitedClient::new(inner, self.limiter(exchange))))
    }

    fn start_multiplexed_stream(
        &self,
        subscription: MuxSubscription,
        channel: ChannelKind,
        options: MuxOptions,
    ) -> StreamTask {
        let label = format!(
            "{}:{}:{}",
            subscription.exchange,
            channel,
            subscription.symbols.join(",")
        );

        let hl_user = self.env.get_optional("XWS_HL_USER");
        let payloads = match subscribe_payloads(&subscription, channel, hl_user.as_deref()) {
            Ok(p) => p,
            Err(err) => return StreamTask::failed(label, err),
        };
        let config = match self.resolve_exchange_config(subscription.exchange) {
            Ok(c) => c,
            Err(err) => return StreamTask::failed(label, err),
        };

        let url = config.ws_url(subscription.market).clone();
        let source = EnvelopeSource {
            exchange: subscription.exchange,
            market: subscription.market,
            stream: channel,
            symbols: subscription.symbols,
        };
        let opening = websocket_frames(url, payloads, keepalive(subscription.exchange), source);
        StreamTask::from_opening(label, opening, options)
    }
}

fn install_rustls_provider() {
    // A provider may already be installed by another part of the process.
    let _ = rustls::crypto::ring::default_provider().install_default();
}
