//! Exchange runtime used by the execguard demo.
//!
//! Resolves per-exchange endpoints, hands out execution clients (paper only
//! unless a signing backend is linked) and starts multiplexed market-data
//! streams whose workers the caller runs on its own threads.

pub mod config;
pub mod discovery;
pub mod env;
pub mod error;
pub mod exec;
pub mod mux;
pub mod runtime;
pub mod types;

pub use config::{ExchangeConfig, Network};
pub use env::{EnvSource, ProcessEnv};
pub use error::{Result, RuntimeError};
pub use exec::{Credentials, ExecutionClient, ExecutionConfig};
pub use mux::{FrameStream, MuxOptions, MuxOutcome, ReadOutcome, StreamReader, StreamTask};
pub use runtime::{ExchangeRuntime, XwsRuntime, CONTRACT_VERSION};
pub use types::{
    ChannelKind, ExchangeId, ExecutionMode, MarketSegment, MuxSubscription, OrderSide, OrderStatus,
    OrderType, PlaceOrderAck, PlaceOrderRequest,
};
