use crate::error::Result;
use crate::types::{ChannelKind, ExchangeId, MarketSegment};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

pub const ENVELOPE_TYPE: &str = "xws.envelope.v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RawEncoding {
    Json,
    Text,
    Base64,
}

/// One exchange frame wrapped with where and when it was received.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeV1 {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub exchange: ExchangeId,
    pub market: Option<MarketSegment>,
    pub stream: ChannelKind,
    pub symbols: Vec<String>,
    pub received_at: String,
    pub raw: Value,
    pub raw_encoding: RawEncoding,
}

/// Static part of every envelope produced by one subscription.
#[derive(Clone, Debug)]
pub struct EnvelopeSource {
    pub exchange: ExchangeId,
    pub market: Option<MarketSegment>,
    pub stream: ChannelKind,
    pub symbols: Vec<String>,
}

impl EnvelopeSource {
    /// Text frames that parse as JSON are embedded as-is, anything else as a string.
    pub fn wrap_text(&self, text: &str, at: DateTime<Utc>) -> EnvelopeV1 {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.wrap(value, RawEncoding::Json, at),
            Err(_) => self.wrap(Value::String(text.to_string()), RawEncoding::Text, at),
        }
    }

    pub fn wrap_binary(&self, bytes: &[u8], at: DateTime<Utc>) -> EnvelopeV1 {
        self.wrap(Value::String(STANDARD.encode(bytes)), RawEncoding::Base64, at)
    }

    fn wrap(&self, raw: Value, raw_encoding: RawEncoding, at: DateTime<Utc>) -> EnvelopeV1 {
        EnvelopeV1 {
            kind: ENVELOPE_TYPE,
            exchange: self.exchange,
            market: self.market,
            stream: self.stream,
            symbols: self.symbols.clone(),
            received_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            raw,
            raw_encoding,
        }
    }
}

impl EnvelopeV1 {
    /// Single JSON line with no embedded line breaks.
    pub fn to_line(&self) -> Result<String> {
        Ok(strip_line_breaks(&serde_json::to_string(self)?))
    }
}

pub fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
