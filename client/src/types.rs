use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Exchanges the runtime knows how to reach.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExchangeId {
    Hl,
    Okx,
    Bybit,
    Mexc,
}

impl ExchangeId {
    /// Non-paper execution on this exchange needs a user + private key pair.
    pub fn requires_credentials(&self) -> bool {
        matches!(self, ExchangeId::Hl)
    }

    /// Market segment used for multiplexed subscriptions.
    pub fn default_segment(&self) -> Option<MarketSegment> {
        match self {
            ExchangeId::Hl => None,
            ExchangeId::Okx | ExchangeId::Bybit | ExchangeId::Mexc => Some(MarketSegment::Futures),
        }
    }

    pub(crate) fn rate_limit_env(&self) -> (&'static str, u32) {
        match self {
            ExchangeId::Hl => ("XWS_HL_RATE_LIMIT", 20),
            ExchangeId::Okx => ("XWS_OKX_RATE_LIMIT", 10),
            ExchangeId::Bybit => ("XWS_BYBIT_RATE_LIMIT", 10),
            ExchangeId::Mexc => ("XWS_MEXC_RATE_LIMIT", 10),
        }
    }
}

/// Market-data channel categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChannelKind {
    Trades,
    L2,
    Funding,
    Liquidations,
    MarkPrice,
    Fills,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
pub enum MarketSegment {
    #[serde(rename = "spot")]
    #[strum(to_string = "spot")]
    Spot,
    #[serde(rename = "fut")]
    #[strum(to_string = "fut")]
    Futures,
}

/// Trading safety tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ExecutionMode {
    #[default]
    Paper,
    Testnet,
    Mainnet,
}

impl ExecutionMode {
    /// Loose selector parsing: anything that is not testnet/mainnet is paper.
    pub fn from_selector(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => ExecutionMode::Testnet,
            "mainnet" => ExecutionMode::Mainnet,
            _ => ExecutionMode::Paper,
        }
    }

    pub fn is_paper(&self) -> bool {
        matches!(self, ExecutionMode::Paper)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OrderStatus {
    Open,
    Filled,
}

/// Normalized order instruction handed to an execution client.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub size: BigDecimal,
    pub price: Option<BigDecimal>,
    pub client_order_id: Option<String>,
    pub reduce_only: bool,
}

/// What an execution client reports back for an accepted order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceOrderAck {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub mode: ExecutionMode,
}

/// One stream covering one exchange, one market segment and a symbol set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxSubscription {
    pub exchange: ExchangeId,
    pub market: Option<MarketSegment>,
    pub symbols: Vec<String>,
}
