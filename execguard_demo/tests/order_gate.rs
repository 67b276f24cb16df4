mod common;

use bigdecimal::BigDecimal;
use common::{gateway, FakeRuntime};
use execguard_demo::{ErrorKind, ExecGuardError, Gateway};
use std::str::FromStr;
use std::sync::Arc;
use xws::{ExchangeId, ExecutionMode, OrderSide, OrderStatus, OrderType, XwsRuntime};

const LIVE_CREDS: [(&str, &str); 2] = [("XWS_HL_USER", "0xabc"), ("XWS_HL_PRIVATE_KEY", "0xsecret")];

#[test]
fn paper_market_order_echoes_request() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(fake.clone(), &[]);

    let receipt = gw.submit_order("hl", "BTC", "trades", "buy", "market", 0.5).unwrap();
    assert_eq!(receipt.exchange, ExchangeId::Hl);
    assert_eq!(receipt.symbol, "BTC");
    assert_eq!(receipt.side, OrderSide::Buy);
    assert_eq!(receipt.order_type, OrderType::Market);
    assert_eq!(receipt.quantity, BigDecimal::from_str("0.5").unwrap());
    assert_eq!(receipt.mode, ExecutionMode::Paper);
    assert_eq!(receipt.status, OrderStatus::Filled);
    assert_eq!(receipt.order_id, "000001");
    assert!(receipt.client_order_id.unwrap().starts_with("xg-"));
    assert_eq!(fake.place_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn limit_orders_require_a_price() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(fake.clone(), &[]);

    let err = gw.submit_order("hl", "BTC", "trades", "sell", "limit", 1.0).unwrap_err();
    assert_eq!(err, ExecGuardError::PriceRequired);
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn unknown_exchange_never_reaches_runtime() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(fake.clone(), &[]);

    for ex in ["zzz", "", "binance"] {
        let err = gw.submit_order(ex, "BTC", "trades", "buy", "market", 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedExchange, "{ex:?}");
    }
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn non_positive_quantity_is_invalid_in_every_mode() {
    let fake = Arc::new(FakeRuntime::default());
    let envs: Vec<Vec<(&str, &str)>> = vec![
        vec![],
        vec![("XWS_EXEC_MODE", "testnet")],
        vec![("XWS_EXEC_MODE", "mainnet"), ("XWS_EXEC_ARM", "1"), LIVE_CREDS[0], LIVE_CREDS[1]],
    ];
    for env in envs {
        let gw = gateway(fake.clone(), &env);
        for qty in [0.0, -0.5, -100.0, f64::NAN, f64::NEG_INFINITY] {
            for order_type in ["market", "limit"] {
                let err = gw.submit_order("hl", "BTC", "trades", "buy", order_type, qty).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidParameters, "{qty} {order_type} {env:?}");
            }
        }
    }
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn parameter_validation() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(fake.clone(), &[]);

    let cases = [
        (("hl", "", "trades", "buy", "market"), ErrorKind::InvalidParameters),
        (("hl", "  ", "trades", "buy", "market"), ErrorKind::InvalidParameters),
        (("hl", "BTC", "trades", "hold", "market"), ErrorKind::InvalidParameters),
        (("hl", "BTC", "trades", "buy", "stop"), ErrorKind::InvalidParameters),
        (("hl", "BTC", "", "buy", "market"), ErrorKind::InvalidParameters),
        (("hl", "BTC", "candles", "buy", "market"), ErrorKind::UnsupportedDatastream),
    ];
    for ((ex, sym, ds, side, ty), kind) in cases {
        let err = gw.submit_order(ex, sym, ds, side, ty, 1.0).unwrap_err();
        assert_eq!(err.kind(), kind, "{sym:?} {ds:?} {side:?} {ty:?}");
    }
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn paper_never_needs_credentials() {
    let fake = Arc::new(FakeRuntime::default());
    for mode in [None, Some("paper"), Some("PAPER"), Some("live"), Some("")] {
        let env: Vec<(&str, &str)> = mode.map(|m| vec![("XWS_EXEC_MODE", m)]).unwrap_or_default();
        let gw = gateway(fake.clone(), &env);
        for ex in ["hl", "okx", "bybit", "mexc"] {
            let receipt = gw.submit_order(ex, "BTC", "trades", "buy", "market", 1.0).unwrap();
            assert_eq!(receipt.mode, ExecutionMode::Paper, "{ex} {mode:?}");
        }
    }
}

#[test]
fn unarmed_live_modes_fail_even_with_credentials() {
    let fake = Arc::new(FakeRuntime::default());
    for mode in ["testnet", "mainnet"] {
        for arm in [None, Some("0"), Some("yes"), Some("true"), Some("ARM")] {
            let mut env = vec![("XWS_EXEC_MODE", mode), LIVE_CREDS[0], LIVE_CREDS[1]];
            if let Some(arm) = arm {
                env.push(("XWS_EXEC_ARM", arm));
            }
            let gw = gateway(fake.clone(), &env);
            for ex in ["hl", "okx"] {
                let err = gw.submit_order(ex, "BTC", "trades", "buy", "market", 1.0).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::NotArmed, "{mode} {arm:?} {ex}");
            }
        }
    }
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn armed_hl_needs_both_credentials() {
    let fake = Arc::new(FakeRuntime::default());
    let partial: [&[(&str, &str)]; 3] = [&[], &[LIVE_CREDS[0]], &[LIVE_CREDS[1]]];
    for creds in partial {
        let mut env = vec![("XWS_EXEC_MODE", "testnet"), ("XWS_EXEC_ARM", "1")];
        env.extend_from_slice(creds);
        let gw = gateway(fake.clone(), &env);
        let err = gw.submit_order("hl", "BTC", "trades", "buy", "market", 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredentials, "{creds:?}");
    }
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn armed_live_order_reaches_runtime_and_surfaces_its_failure() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(
        fake.clone(),
        &[("XWS_EXEC_MODE", "mainnet"), ("XWS_EXEC_ARM", "1"), LIVE_CREDS[0], LIVE_CREDS[1]],
    );
    let err = gw.submit_order("hl", "BTC", "trades", "buy", "market", 1.0).unwrap_err();
    match err {
        ExecGuardError::RuntimeCallFailed(msg) => assert!(msg.contains("no signing backend"), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }

    // okx carries no credential requirement
    let gw = gateway(fake.clone(), &[("XWS_EXEC_MODE", "testnet"), ("XWS_EXEC_ARM", "1")]);
    let err = gw.submit_order("okx", "BTC-USDT-SWAP", "l2", "sell", "market", 2.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeCallFailed);
}

#[test]
fn placement_failure_is_wrapped() {
    let fake = Arc::new(FakeRuntime {
        fail_place: Some("insufficient margin".to_string()),
        ..Default::default()
    });
    let gw = gateway(fake, &[]);
    let err = gw.submit_order("bybit", "BTCUSDT", "trades", "buy", "market", 1.0).unwrap_err();
    assert_eq!(
        err,
        ExecGuardError::RuntimeCallFailed("rejected: insufficient margin".to_string())
    );
}

#[test]
fn unresolvable_exchange_config_fails_the_order() {
    let fake = Arc::new(FakeRuntime {
        fail_resolve: true,
        ..Default::default()
    });
    let gw = gateway(fake.clone(), &[]);
    let err = gw.submit_order("hl", "BTC", "trades", "buy", "market", 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeCallFailed);
    assert_eq!(fake.place_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn connected_session_config_is_reused() {
    let fake = Arc::new(FakeRuntime::default());
    let gw = gateway(fake.clone(), &[]);
    assert!(gw.connect("okx"));
    let resolves = fake.resolve_calls.load(std::sync::atomic::Ordering::SeqCst);
    gw.submit_order("okx", "BTC-USDT-SWAP", "trades", "buy", "market", 1.0).unwrap();
    gw.submit_order("okx", "BTC-USDT-SWAP", "trades", "sell", "market", 1.0).unwrap();
    assert_eq!(fake.resolve_calls.load(std::sync::atomic::Ordering::SeqCst), resolves);
}

#[test]
fn xws_paper_runtime_end_to_end() {
    let env = Arc::new(xws::env::env_map([]));
    let runtime = Arc::new(XwsRuntime::new(env.clone()).unwrap());
    let gw = Gateway::new(runtime, env).unwrap();

    let first = gw.submit_order("okx", "BTC-USDT-SWAP", "trades", "buy", "market", 0.25).unwrap();
    let second = gw.submit_order("okx", "BTC-USDT-SWAP", "trades", "buy", "market", 0.25).unwrap();
    assert_eq!(first.order_id, "000001");
    assert_eq!(second.order_id, "000002");
    assert_eq!(second.status, OrderStatus::Filled);
    assert_ne!(first.client_order_id, second.client_order_id);
}

#[test]
fn xws_paper_state_persists_between_gateways() {
    let dir = std::env::temp_dir().join(format!("execguard-paper-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let dir_str = dir.to_string_lossy().to_string();

    for expected in ["000001", "000002"] {
        let env = Arc::new(xws::env::env_map([("XWS_PAPER_STATE_DIR", dir_str.as_str())]));
        let runtime = Arc::new(XwsRuntime::new(env.clone()).unwrap());
        let gw = Gateway::new(runtime, env).unwrap();
        let receipt = gw.submit_order("mexc", "BTC_USDT", "trades", "sell", "market", 1.0).unwrap();
        assert_eq!(receipt.order_id, expected);
    }
    assert!(dir.join("paper_mexc.json").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn receipt_echoes_quantity_exactly() {
    let gw = gateway(Arc::new(FakeRuntime::default()), &[]);
    for (qty, expected) in [(0.123456789, "0.123456789"), (0.000000004, "0.000000004")] {
        let receipt = gw.submit_order("hl", "BTC", "trades", "buy", "market", qty).unwrap();
        assert_eq!(receipt.quantity, BigDecimal::from_str(expected).unwrap());
    }
}
