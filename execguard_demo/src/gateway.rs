// execguard_demo/src/gateway.rs
//
// Synchronous surface the presentation layer talks to. Wires the connection
// manager, execution guard and subscription manager over one runtime object.

use crate::catalog;
use crate::connection::{ConnectionManager, Session, SymbolDiscovery};
use crate::debug_hooks;
use crate::error::GuardResult;
use crate::exec_guard::{ExecutionGuard, OrderResult};
use crate::poll_loop::PollLoop;
use crate::settings::{ExecutionPolicy, GatewaySettings};
use crate::subscription::{SubscriptionHandle, SubscriptionManager};
use anyhow::{ensure, Context, Result};
use std::sync::Arc;
use tokio::runtime::Runtime;
use xws::{EnvSource, ExchangeRuntime, CONTRACT_VERSION};

pub struct Gateway {
    connections: Arc<ConnectionManager>,
    guard: ExecutionGuard,
    subscriptions: SubscriptionManager,
    settings: GatewaySettings,
    // Dropped last: the managers hold handles into it.
    _rt: Runtime,
}

impl Gateway {
    pub fn new(runtime: Arc<dyn ExchangeRuntime>, env: Arc<dyn EnvSource>) -> Result<Self> {
        let settings = GatewaySettings::from_env(env.as_ref());
        Self::with_settings(runtime, env, settings)
    }

    pub fn with_settings(
        runtime: Arc<dyn ExchangeRuntime>,
        env: Arc<dyn EnvSource>,
        settings: GatewaySettings,
    ) -> Result<Self> {
        let version = runtime.contract_version();
        ensure!(
            version == CONTRACT_VERSION,
            "exchange runtime speaks contract v{version}, expected v{CONTRACT_VERSION}"
        );

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("execguard-gateway")
            .enable_all()
            .build()
            .context("init gateway runtime")?;
        let handle = rt.handle().clone();
        let mode = ExecutionPolicy::from_env(env.as_ref()).mode;

        let connections = Arc::new(ConnectionManager::new(runtime.clone(), handle.clone()));
        let guard = ExecutionGuard::new(runtime.clone(), env, connections.clone(), handle);
        let subscriptions = SubscriptionManager::new(runtime);

        debug_hooks::log_gateway_start(version, mode);
        Ok(Self {
            connections,
            guard,
            subscriptions,
            settings,
            _rt: rt,
        })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn connect(&self, exchange: &str) -> bool {
        self.connections.connect(exchange)
    }

    pub fn try_connect(&self, exchange: &str) -> GuardResult<Arc<Session>> {
        self.connections.try_connect(exchange)
    }

    pub fn list_exchanges(&self) -> Vec<String> {
        catalog::exchanges()
    }

    pub fn list_datastreams(&self) -> Vec<String> {
        catalog::datastreams()
    }

    pub fn list_symbols(&self, exchange: &str) -> Vec<String> {
        self.connections.list_symbols(exchange)
    }

    pub fn discover_symbols(&self, exchange: &str) -> GuardResult<SymbolDiscovery> {
        self.connections.discover_symbols(exchange)
    }

    pub fn submit_order(
        &self,
        exchange: &str,
        symbol: &str,
        datastream: &str,
        side: &str,
        order_type: &str,
        quantity: f64,
    ) -> OrderResult {
        self.guard
            .submit_order(exchange, symbol, datastream, side, order_type, quantity)
    }

    pub fn start_subscription(
        &self,
        exchange: &str,
        symbol: &str,
        datastream: &str,
        max_messages: u32,
        timeout_seconds: u64,
    ) -> GuardResult<SubscriptionHandle> {
        self.subscriptions
            .start_subscription(exchange, symbol, datastream, max_messages, timeout_seconds)
    }

    pub fn drain(&self, handle: &mut SubscriptionHandle, max_lines: usize) -> GuardResult<Vec<String>> {
        handle.drain(max_lines)
    }

    pub fn poll_loop(&self) -> PollLoop {
        PollLoop::from_settings(&self.settings)
    }
}
