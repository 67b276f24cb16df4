// execguard_demo/src/subscription.rs
//
// Starts one multiplexed stream per handle on its own worker thread and
// exposes a non-blocking drain over the stream's reader.

use crate::catalog::{self, DatastreamKind};
use crate::debug_hooks;
use crate::error::{one_line, ExecGuardError, GuardResult};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use xws::{ExchangeId, ExchangeRuntime, MuxOptions, MuxOutcome, MuxSubscription, ReadOutcome, StreamReader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalReason {
    /// Bound reached, timeout elapsed, or the producer stopped.
    EndOfStream,
    ReadFailed,
    Abandoned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Starting,
    Active,
    Draining,
    Terminal(TerminalReason),
}

/// A running subscription. Owned by exactly one consumer; not `Clone`.
pub struct SubscriptionHandle {
    label: String,
    exchange: ExchangeId,
    symbol: String,
    datastream: DatastreamKind,
    options: MuxOptions,
    state: HandleState,
    reader: Option<StreamReader>,
    pending_error: Option<ExecGuardError>,
    worker: Option<JoinHandle<()>>,
    lines_read: u64,
}

impl SubscriptionHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn datastream(&self) -> DatastreamKind {
        self.datastream
    }

    pub fn options(&self) -> MuxOptions {
        self.options
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, HandleState::Terminal(_))
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Whether the background worker thread has exited.
    pub fn worker_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Returns up to `max_lines` buffered lines without blocking.
    ///
    /// A read failure is reported once as `StreamReadFailed`; if lines were
    /// already collected in the same call they are returned first and the
    /// failure comes on the next call. Terminal handles always drain empty.
    pub fn drain(&mut self, max_lines: usize) -> GuardResult<Vec<String>> {
        if let Some(err) = self.pending_error.take() {
            self.finish(TerminalReason::ReadFailed);
            return Err(err);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Vec::new());
        };

        self.state = HandleState::Draining;
        let mut lines = Vec::new();
        let mut ended = None;

        while lines.len() < max_lines {
            match reader.try_read() {
                Ok(ReadOutcome::Line(line)) => lines.push(line),
                Ok(ReadOutcome::Pending) => break,
                Ok(ReadOutcome::Closed) => {
                    ended = Some(TerminalReason::EndOfStream);
                    break;
                }
                Err(err) => {
                    let err = ExecGuardError::StreamReadFailed(one_line(&err));
                    if lines.is_empty() {
                        self.finish(TerminalReason::ReadFailed);
                        return Err(err);
                    }
                    self.pending_error = Some(err);
                    break;
                }
            }
        }

        self.lines_read += lines.len() as u64;
        match ended {
            Some(reason) => self.finish(reason),
            None => self.state = HandleState::Active,
        }
        Ok(lines)
    }

    /// Stops consuming. The worker notices the dropped reader and exits on
    /// its own; this never waits for it.
    pub fn close(&mut self) {
        if !self.is_terminal() {
            self.finish(TerminalReason::Abandoned);
        }
    }

    fn finish(&mut self, reason: TerminalReason) {
        self.reader = None;
        self.pending_error = None;
        self.state = HandleState::Terminal(reason);
        debug_hooks::log_subscription_end(&self.label, reason, self.lines_read);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct SubscriptionManager {
    runtime: Arc<dyn ExchangeRuntime>,
}

impl SubscriptionManager {
    pub fn new(runtime: Arc<dyn ExchangeRuntime>) -> Self {
        Self { runtime }
    }

    pub fn start_subscription(
        &self,
        exchange: &str,
        symbol: &str,
        datastream: &str,
        max_messages: u32,
        timeout_seconds: u64,
    ) -> GuardResult<SubscriptionHandle> {
        let exchange_id = catalog::exchange(exchange)
            .ok_or_else(|| ExecGuardError::UnsupportedExchange(exchange.trim().to_string()))?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ExecGuardError::InvalidParameters("symbol is required".to_string()));
        }
        let kind = catalog::datastream(datastream)
            .ok_or_else(|| ExecGuardError::UnsupportedDatastream(datastream.trim().to_string()))?;

        let subscription = MuxSubscription {
            exchange: exchange_id,
            market: catalog::market_segment(exchange_id),
            symbols: vec![symbol.to_string()],
        };
        let options = MuxOptions::bounded(max_messages, timeout_seconds);
        let task = self.runtime.start_multiplexed_stream(subscription, kind, options);
        let label = task.label.clone();
        let (reader, worker) = task.into_parts();

        let mut handle = SubscriptionHandle {
            label,
            exchange: exchange_id,
            symbol: symbol.to_string(),
            datastream: kind,
            options,
            state: HandleState::Starting,
            reader: Some(reader),
            pending_error: None,
            worker: None,
            lines_read: 0,
        };

        handle.worker = launch(&handle.label, worker);
        handle.state = HandleState::Active;
        tracing::info!(
            stream = %handle.label,
            max_messages,
            timeout_seconds,
            "subscription started"
        );
        Ok(handle)
    }
}

/// Runs `worker` on a dedicated thread with its own single-threaded tokio
/// runtime. On failure the worker is dropped, which closes the stream.
fn launch(label: &str, worker: BoxFuture<'static, MuxOutcome>) -> Option<JoinHandle<()>> {
    let thread_label = label.to_string();
    let spawned = thread::Builder::new()
        .name(format!("xws-sub:{label}"))
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    tracing::warn!(stream = %thread_label, "stream runtime failed to start: {err}");
                    return;
                }
            };
            let outcome = rt.block_on(worker);
            tracing::debug!(stream = %thread_label, ?outcome, "stream worker exited");
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(stream = %label, "stream worker failed to launch: {err}");
            None
        }
    }
}
