// client/src/mux/sources.rs
//
// Websocket transport plus the per-exchange subscribe payloads.

use super::envelope::EnvelopeSource;
use super::FrameStream;
use crate::error::{Result, RuntimeError};
use crate::types::{ChannelKind, ExchangeId, MarketSegment, MuxSubscription};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Subscribe messages for one channel on one exchange, one per symbol
/// (or one per user for HL account channels).
pub fn subscribe_payloads(
    sub: &MuxSubscription,
    channel: ChannelKind,
    hl_user: Option<&str>,
) -> Result<Vec<String>> {
    let unsupported = || {
        RuntimeError::Unsupported(format!(
            "{channel} is not available on {}{}",
            sub.exchange,
            sub.market.map(|m| format!(" {m}")).unwrap_or_default()
        ))
    };

    if sub.symbols.iter().all(|s| s.trim().is_empty()) {
        return Err(RuntimeError::Config("at least one symbol is required".to_string()));
    }

    let payloads = match sub.exchange {
        ExchangeId::Hl => {
            let per_coin = |kind: &str| {
                sub.symbols
                    .iter()
                    .map(|coin| {
                        json!({"method": "subscribe", "subscription": {"type": kind, "coin": coin}})
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            };
            let per_user = |kind: &str| -> Result<Vec<String>> {
                let user = hl_user.ok_or_else(|| {
                    RuntimeError::Config(format!("XWS_HL_USER is required for hl {channel}"))
                })?;
                Ok(vec![
                    json!({"method": "subscribe", "subscription": {"type": kind, "user": user}}).to_string(),
                ])
            };
            match channel {
                ChannelKind::Trades => per_coin("trades"),
                ChannelKind::L2 => per_coin("l2Book"),
                ChannelKind::Funding | ChannelKind::MarkPrice => per_coin("activeAssetCtx"),
                ChannelKind::Liquidations => per_user("userEvents")?,
                ChannelKind::Fills => per_user("userFills")?,
            }
        }
        ExchangeId::Okx => {
            let name = match channel {
                ChannelKind::Trades => "trades",
                ChannelKind::L2 => "books5",
                ChannelKind::Funding => "funding-rate",
                ChannelKind::Liquidations => "liquidation-orders",
                ChannelKind::MarkPrice => "mark-price",
                ChannelKind::Fills => return Err(unsupported()),
            };
            let args: Vec<_> = sub
                .symbols
                .iter()
                .map(|s| json!({"channel": name, "instId": s}))
                .collect();
            vec![json!({"op": "subscribe", "args": args}).to_string()]
        }
        ExchangeId::Bybit => {
            let prefix = match (channel, sub.market) {
                (ChannelKind::Trades, _) => "publicTrade",
                (ChannelKind::L2, _) => "orderbook.50",
                (ChannelKind::Funding, Some(MarketSegment::Futures)) => "fundingRate",
                (ChannelKind::Liquidations, Some(MarketSegment::Futures)) => "liquidation",
                (ChannelKind::MarkPrice, Some(MarketSegment::Futures)) => "markPrice",
                _ => return Err(unsupported()),
            };
            let args: Vec<_> = sub.symbols.iter().map(|s| format!("{prefix}.{s}")).collect();
            vec![json!({"op": "subscribe", "args": args}).to_string()]
        }
        ExchangeId::Mexc => {
            if sub.market != Some(MarketSegment::Futures) {
                return Err(unsupported());
            }
            let method = match channel {
                ChannelKind::Trades => "sub.deal",
                ChannelKind::L2 => "sub.depth",
                ChannelKind::Funding => "sub.fundingRate",
                ChannelKind::MarkPrice => "sub.markPrice",
                ChannelKind::Liquidations | ChannelKind::Fills => return Err(unsupported()),
            };
            sub.symbols
                .iter()
                .map(|s| json!({"method": method, "param": {"symbol": s}}).to_string())
                .collect()
        }
    };

    Ok(payloads)
}

/// Application-level ping some venues expect on an idle connection.
pub fn keepalive(exchange: ExchangeId) -> Option<(Duration, String)> {
    match exchange {
        ExchangeId::Hl => Some((Duration::from_secs(50), json!({"method": "ping"}).to_string())),
        ExchangeId::Okx => Some((Duration::from_secs(25), "ping".to_string())),
        ExchangeId::Bybit => Some((Duration::from_secs(20), json!({"op": "ping"}).to_string())),
        ExchangeId::Mexc => Some((Duration::from_secs(20), json!({"method": "ping"}).to_string())),
    }
}

struct WsState {
    ws: Ws,
    keepalive: Option<(Interval, String)>,
    source: EnvelopeSource,
}

/// Connects, sends `payloads` and yields every data frame as an envelope line.
pub async fn websocket_frames(
    url: Url,
    payloads: Vec<String>,
    keepalive: Option<(Duration, String)>,
    source: EnvelopeSource,
) -> Result<FrameStream> {
    let (mut ws, _) = connect_async(url.as_str()).await?;
    log::info!("connected to {url}");

    for payload in payloads {
        ws.send(Message::Text(payload)).await?;
    }

    let keepalive = keepalive.map(|(period, payload)| (interval_at(Instant::now() + period, period), payload));
    let state = WsState { ws, keepalive, source };

    let frames = futures_util::stream::unfold(state, |mut state| async move {
        next_line(&mut state).await.map(|item| (item, state))
    });
    Ok(frames.boxed())
}

async fn next_line(state: &mut WsState) -> Option<Result<String>> {
    loop {
        let msg = match &mut state.keepalive {
            Some((tick, payload)) => tokio::select! {
                _ = tick.tick() => {
                    if let Err(err) = state.ws.send(Message::Text(payload.clone())).await {
                        return Some(Err(err.into()));
                    }
                    continue;
                }
                msg = state.ws.next() => msg,
            },
            None => state.ws.next().await,
        };

        match msg {
            None => return None,
            Some(Ok(Message::Text(text))) if text == "pong" => {}
            Some(Ok(Message::Text(text))) => {
                return Some(encode(state.source.wrap_text(&text, Utc::now())));
            }
            Some(Ok(Message::Binary(bytes))) => {
                return Some(encode(state.source.wrap_binary(&bytes, Utc::now())));
            }
            Some(Ok(Message::Ping(payload))) => {
                state.ws.send(Message::Pong(payload)).await.ok();
            }
            Some(Ok(Message::Close(frame))) => {
                log::info!("close frame: {frame:?}");
                return None;
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => return Some(Err(err.into())),
        }
    }
}

fn encode(envelope: super::envelope::EnvelopeV1) -> Result<String> {
    envelope
        .to_line()
        .map_err(|err| RuntimeError::Decode(err.to_string()))
}
