use crate::error::{Result, RuntimeError};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(HTTP_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(60))
        .build()?)
}

/// Asks the HL info endpoint for the perp universe and returns the coin names.
pub async fn hl_meta_symbols(http: &Client, base: &Url) -> Result<Vec<String>> {
    let url = base
        .join("info")
        .map_err(|e| RuntimeError::Config(format!("bad info url from {base}: {e}")))?;

    let body = http
        .post(url)
        .json(&json!({"type": "meta"}))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| RuntimeError::Decode(format!("meta response is not json: {e}")))?;
    Ok(parse_universe(&value))
}

/// Accepts `universe`, `coins` or `symbols` lists holding either plain
/// strings or objects with a `name`, `coin` or `symbol` field.
pub fn parse_universe(meta: &Value) -> Vec<String> {
    let list = ["universe", "coins", "symbols"]
        .iter()
        .filter_map(|key| meta.get(key).and_then(Value::as_array))
        .find(|arr| !arr.is_empty());

    let Some(list) = list else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => ["name", "coin", "symbol"]
                .iter()
                .find_map(|k| item.get(k).and_then(Value::as_str).filter(|s| !s.is_empty())),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_objects() {
        let meta = json!({"universe": [
            {"name": "BTC", "szDecimals": 5},
            {"name": "ETH", "szDecimals": 4},
            {"maxLeverage": 3}
        ]});
        assert_eq!(parse_universe(&meta), vec!["BTC", "ETH"]);
    }

    #[test]
    fn alternate_shapes() {
        assert_eq!(parse_universe(&json!({"coins": ["SOL", "", "ARB"]})), vec!["SOL", "ARB"]);
        assert_eq!(
            parse_universe(&json!({"symbols": [{"symbol": "DOGE"}, {"coin": "WIF"}]})),
            vec!["DOGE", "WIF"]
        );
        assert_eq!(
            parse_universe(&json!({"universe": [], "coins": ["kPEPE"]})),
            vec!["kPEPE"]
        );
    }

    #[test]
    fn missing_list_is_empty() {
        assert!(parse_universe(&json!({"other": 1})).is_empty());
        assert!(parse_universe(&json!([1, 2])).is_empty());
    }
}
