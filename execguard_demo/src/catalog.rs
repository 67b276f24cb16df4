// execguard_demo/src/catalog.rs
//
// Static registry of exchanges and datastream kinds the demo exposes.

use std::str::FromStr;
use strum::IntoEnumIterator;
use xws::{ExchangeId, MarketSegment};

pub use xws::ChannelKind as DatastreamKind;

/// Looks up an exchange code (`hl`, `okx`, `bybit`, `mexc`), ignoring case
/// and surrounding whitespace.
pub fn exchange(code: &str) -> Option<ExchangeId> {
    ExchangeId::from_str(code.trim()).ok()
}

pub fn datastream(code: &str) -> Option<DatastreamKind> {
    DatastreamKind::from_str(code.trim()).ok()
}

pub fn exchanges() -> Vec<String> {
    ExchangeId::iter().map(|e| e.to_string()).collect()
}

pub fn datastreams() -> Vec<String> {
    DatastreamKind::iter().map(|d| d.to_string()).collect()
}

/// Segment subscriptions are pinned to. HL has a single market.
pub fn market_segment(exchange: ExchangeId) -> Option<MarketSegment> {
    exchange.default_segment()
}
