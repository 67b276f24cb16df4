//! Execution-guard demo: a safety-gated order path and polled market-data
//! subscriptions on top of an [`xws::ExchangeRuntime`].

pub mod catalog;
pub mod connection;
pub mod debug_hooks;
pub mod error;
pub mod exec_guard;
pub mod gateway;
pub mod poll_loop;
pub mod settings;
pub mod subscription;

pub use connection::{Session, SymbolDiscovery};
pub use error::{ErrorKind, ExecGuardError, GuardResult};
pub use exec_guard::{OrderReceipt, OrderResult};
pub use gateway::Gateway;
pub use poll_loop::{CollectSink, LineSink, PollLoop, PollStep, PollSummary, PrintSink, StopReason};
pub use subscription::{HandleState, SubscriptionHandle, TerminalReason};
