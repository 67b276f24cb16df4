// execguard_demo/src/connection.rs
//
// Per-exchange sessions and symbol discovery.

use crate::catalog;
use crate::error::{ExecGuardError, GuardResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use xws::{ExchangeConfig, ExchangeId, ExchangeRuntime, RuntimeError};

/// Resolved configuration for one exchange. Immutable once created; a
/// reconnect replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub exchange: ExchangeId,
    pub config: Arc<ExchangeConfig>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolDiscovery {
    Listed(Vec<String>),
    NotSupported,
    Failed(String),
}

impl SymbolDiscovery {
    pub fn into_symbols(self) -> Vec<String> {
        match self {
            SymbolDiscovery::Listed(symbols) => symbols,
            SymbolDiscovery::NotSupported | SymbolDiscovery::Failed(_) => Vec::new(),
        }
    }
}

pub struct ConnectionManager {
    runtime: Arc<dyn ExchangeRuntime>,
    handle: Handle,
    sessions: Mutex<HashMap<ExchangeId, Arc<Session>>>,
}

impl ConnectionManager {
    pub fn new(runtime: Arc<dyn ExchangeRuntime>, handle: Handle) -> Self {
        Self {
            runtime,
            handle,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<ExchangeId, Arc<Session>>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn try_connect(&self, exchange: &str) -> GuardResult<Arc<Session>> {
        let id = catalog::exchange(exchange)
            .ok_or_else(|| ExecGuardError::UnsupportedExchange(exchange.trim().to_string()))?;

        let config = self.runtime.resolve_exchange_config(id).map_err(|err| {
            tracing::warn!(exchange = %id, "connect failed: {err}");
            ExecGuardError::ConnectionFailed(format!("{id}: {err}"))
        })?;

        let session = Arc::new(Session {
            exchange: id,
            config: Arc::new(config),
            connected_at: Utc::now(),
        });
        self.sessions().insert(id, session.clone());
        tracing::info!(exchange = %id, network = session.config.network.as_str(), "session established");
        Ok(session)
    }

    pub fn connect(&self, exchange: &str) -> bool {
        match self.try_connect(exchange) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("connect({exchange:?}): {err}");
                false
            }
        }
    }

    pub fn session(&self, exchange: ExchangeId) -> Option<Arc<Session>> {
        self.sessions().get(&exchange).cloned()
    }

    /// Config from the live session, or resolved afresh without storing it.
    pub fn exchange_config(&self, exchange: ExchangeId) -> Result<Arc<ExchangeConfig>, RuntimeError> {
        if let Some(session) = self.session(exchange) {
            return Ok(session.config.clone());
        }
        self.runtime.resolve_exchange_config(exchange).map(Arc::new)
    }

    pub fn discover_symbols(&self, exchange: &str) -> GuardResult<SymbolDiscovery> {
        let id = catalog::exchange(exchange)
            .ok_or_else(|| ExecGuardError::UnsupportedExchange(exchange.trim().to_string()))?;

        if !self.runtime.supports_symbol_discovery(id) {
            return Ok(SymbolDiscovery::NotSupported);
        }

        let config = match self.exchange_config(id) {
            Ok(config) => config,
            Err(err) => return Ok(SymbolDiscovery::Failed(err.to_string())),
        };

        let listed = self
            .handle
            .block_on(self.runtime.list_symbols(id, config.as_ref()));
        Ok(match listed {
            Ok(symbols) => {
                tracing::debug!(exchange = %id, count = symbols.len(), "symbols discovered");
                SymbolDiscovery::Listed(symbols)
            }
            Err(err) => SymbolDiscovery::Failed(err.to_string()),
        })
    }

    /// Flat view of [`discover_symbols`](Self::discover_symbols): anything
    /// but a listing is empty.
    pub fn list_symbols(&self, exchange: &str) -> Vec<String> {
        match self.discover_symbols(exchange) {
            Ok(SymbolDiscovery::Failed(reason)) => {
                tracing::warn!("symbol discovery for {exchange:?} failed: {reason}");
                Vec::new()
            }
            Ok(found) => found.into_symbols(),
            Err(err) => {
                tracing::debug!("list_symbols({exchange:?}): {err}");
                Vec::new()
            }
        }
    }
}
