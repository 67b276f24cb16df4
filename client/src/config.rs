use crate::env::EnvSource;
use crate::error::{Result, RuntimeError};
use crate::types::{ExchangeId, MarketSegment};
use reqwest::Url;

pub const HL_MAINNET_WS: &str = "wss://api.hyperliquid.xyz/ws";
pub const HL_TESTNET_WS: &str = "wss://api.hyperliquid-testnet.xyz/ws";
pub const HL_MAINNET_HTTP: &str = "https://api.hyperliquid.xyz";
pub const HL_TESTNET_HTTP: &str = "https://api.hyperliquid-testnet.xyz";
pub const OKX_PUBLIC_WS: &str = "wss://ws.okx.com:8443/ws/v5/public";
pub const BYBIT_SPOT_WS: &str = "wss://stream.bybit.com/v5/public/spot";
pub const BYBIT_FUT_WS: &str = "wss://stream.bybit.com/v5/public/linear";
pub const MEXC_SPOT_WS: &str = "wss://wbs-api.mexc.com/ws";
pub const MEXC_FUT_WS: &str = "wss://contract.mexc.com/edge";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

/// Resolved, read-only configuration for one exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub exchange: ExchangeId,
    pub network: Network,
    pub http_url: Option<Url>,
    pub spot_ws_url: Url,
    pub futures_ws_url: Url,
}

impl ExchangeConfig {
    /// Resolves the config from env overrides, falling back to public endpoints.
    pub fn resolve(exchange: ExchangeId, env: &dyn EnvSource) -> Result<Self> {
        match exchange {
            ExchangeId::Hl => {
                let network = match env
                    .get_optional("XWS_HL_NETWORK")
                    .map(|v| v.to_ascii_lowercase())
                    .as_deref()
                {
                    None | Some("mainnet") => Network::Mainnet,
                    Some("testnet") => Network::Testnet,
                    Some(other) => {
                        return Err(RuntimeError::Config(format!(
                            "XWS_HL_NETWORK must be mainnet or testnet, got {other}"
                        )))
                    }
                };
                let (ws_default, http_default) = match network {
                    Network::Mainnet => (HL_MAINNET_WS, HL_MAINNET_HTTP),
                    Network::Testnet => (HL_TESTNET_WS, HL_TESTNET_HTTP),
                };
                let ws = url_or(env, "XWS_HL_WS_URL", ws_default)?;
                Ok(Self {
                    exchange,
                    network,
                    http_url: Some(url_or(env, "XWS_HL_HTTP_URL", http_default)?),
                    spot_ws_url: ws.clone(),
                    futures_ws_url: ws,
                })
            }
            ExchangeId::Okx => {
                let ws = url_or(env, "XWS_OKX_WS_URL", OKX_PUBLIC_WS)?;
                Ok(Self {
                    exchange,
                    network: Network::Mainnet,
                    http_url: None,
                    spot_ws_url: ws.clone(),
                    futures_ws_url: ws,
                })
            }
            ExchangeId::Bybit => Ok(Self {
                exchange,
                network: Network::Mainnet,
                http_url: None,
                spot_ws_url: url_or(env, "XWS_BYBIT_SPOT_WS_URL", BYBIT_SPOT_WS)?,
                futures_ws_url: url_or(env, "XWS_BYBIT_FUT_WS_URL", BYBIT_FUT_WS)?,
            }),
            ExchangeId::Mexc => Ok(Self {
                exchange,
                network: Network::Mainnet,
                http_url: None,
                spot_ws_url: url_or(env, "XWS_MEXC_SPOT_WS_URL", MEXC_SPOT_WS)?,
                futures_ws_url: url_or(env, "XWS_MEXC_FUT_WS_URL", MEXC_FUT_WS)?,
            }),
        }
    }

    pub fn ws_url(&self, market: Option<MarketSegment>) -> &Url {
        match market {
            Some(MarketSegment::Spot) => &self.spot_ws_url,
            Some(MarketSegment::Futures) | None => &self.futures_ws_url,
        }
    }
}

fn url_or(env: &dyn EnvSource, name: &str, fallback: &str) -> Result<Url> {
    let raw = env.get_optional(name).unwrap_or_else(|| fallback.to_string());
    Url::parse(&raw).map_err(|e| RuntimeError::Config(format!("{name}: invalid url {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::env_map;

    #[test]
    fn hl_defaults_to_mainnet() {
        let cfg = ExchangeConfig::resolve(ExchangeId::Hl, &env_map([])).unwrap();
        assert_eq!(cfg.network, Network::Mainnet);
        assert_eq!(cfg.ws_url(None).as_str(), HL_MAINNET_WS);
        assert_eq!(cfg.http_url.unwrap().as_str(), "https://api.hyperliquid.xyz/");
    }

    #[test]
    fn hl_testnet_and_overrides() {
        let env = env_map([
            ("XWS_HL_NETWORK", "TestNet"),
            ("XWS_HL_HTTP_URL", "http://127.0.0.1:9000"),
        ]);
        let cfg = ExchangeConfig::resolve(ExchangeId::Hl, &env).unwrap();
        assert_eq!(cfg.network, Network::Testnet);
        assert_eq!(cfg.ws_url(None).as_str(), HL_TESTNET_WS);
        assert_eq!(cfg.http_url.unwrap().as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn hl_rejects_unknown_network() {
        let env = env_map([("XWS_HL_NETWORK", "devnet")]);
        let err = ExchangeConfig::resolve(ExchangeId::Hl, &env).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn bybit_picks_segment_url() {
        let cfg = ExchangeConfig::resolve(ExchangeId::Bybit, &env_map([])).unwrap();
        assert_eq!(cfg.ws_url(Some(MarketSegment::Spot)).as_str(), BYBIT_SPOT_WS);
        assert_eq!(cfg.ws_url(Some(MarketSegment::Futures)).as_str(), BYBIT_FUT_WS);
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let env = env_map([("XWS_OKX_WS_URL", "not a url")]);
        assert!(ExchangeConfig::resolve(ExchangeId::Okx, &env).is_err());
    }
}
