// execguard_demo/src/exec_guard.rs
//
// Safety gate and order builder. Everything up to `PriceRequired` is decided
// locally; the runtime is only touched once the gate has passed.

use crate::catalog::{self, DatastreamKind};
use crate::connection::ConnectionManager;
use crate::debug_hooks;
use crate::error::{one_line, ExecGuardError, GuardResult};
use crate::settings::ExecutionPolicy;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tokio::runtime::Handle;
use xws::{
    EnvSource, ExchangeId, ExchangeRuntime, ExecutionConfig, ExecutionMode, OrderSide, OrderStatus,
    OrderType, PlaceOrderRequest,
};

/// Accepted order, echoing what was asked for.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub mode: ExecutionMode,
    pub exchange: ExchangeId,
    pub symbol: String,
    pub datastream: DatastreamKind,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: BigDecimal,
}

pub type OrderResult = GuardResult<OrderReceipt>;

/// An order that passed every local check and may be sent.
#[derive(Clone, Debug, PartialEq)]
pub struct GatedOrder {
    pub exchange: ExchangeId,
    pub symbol: String,
    pub datastream: DatastreamKind,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: BigDecimal,
    pub execution: ExecutionConfig,
}

pub struct ExecutionGuard {
    runtime: Arc<dyn ExchangeRuntime>,
    env: Arc<dyn EnvSource>,
    connections: Arc<ConnectionManager>,
    handle: Handle,
}

impl ExecutionGuard {
    pub fn new(
        runtime: Arc<dyn ExchangeRuntime>,
        env: Arc<dyn EnvSource>,
        connections: Arc<ConnectionManager>,
        handle: Handle,
    ) -> Self {
        Self {
            runtime,
            env,
            connections,
            handle,
        }
    }

    /// Runs the local gate: catalog, parameters, mode, arming, credentials
    /// and the price requirement. No runtime call is made here.
    pub fn gate(
        &self,
        exchange: &str,
        symbol: &str,
        datastream: &str,
        side: &str,
        order_type: &str,
        quantity: f64,
    ) -> GuardResult<GatedOrder> {
        let exchange_id = catalog::exchange(exchange)
            .ok_or_else(|| ExecGuardError::UnsupportedExchange(exchange.trim().to_string()))?;

        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ExecGuardError::InvalidParameters("symbol is required".to_string()));
        }
        let quantity = parse_quantity(quantity)?;
        let side = parse_side(side)?;
        let order_type = parse_order_type(order_type)?;
        if datastream.trim().is_empty() {
            return Err(ExecGuardError::InvalidParameters("datastream is required".to_string()));
        }
        let datastream = catalog::datastream(datastream)
            .ok_or_else(|| ExecGuardError::UnsupportedDatastream(datastream.trim().to_string()))?;

        let policy = ExecutionPolicy::from_env(self.env.as_ref());
        if !policy.mode.is_paper() {
            let mode = policy.mode.to_string().to_ascii_lowercase();
            if !policy.is_armed() {
                return Err(ExecGuardError::NotArmed(mode));
            }
            if exchange_id.requires_credentials() && policy.credentials(exchange_id).is_none() {
                return Err(ExecGuardError::MissingCredentials(format!(
                    "XWS_HL_USER and XWS_HL_PRIVATE_KEY are required for {exchange_id} {mode}"
                )));
            }
        }

        if order_type == OrderType::Limit {
            return Err(ExecGuardError::PriceRequired);
        }

        Ok(GatedOrder {
            exchange: exchange_id,
            symbol: symbol.to_string(),
            datastream,
            side,
            order_type,
            quantity,
            execution: policy.execution_config(exchange_id),
        })
    }

    pub fn submit_order(
        &self,
        exchange: &str,
        symbol: &str,
        datastream: &str,
        side: &str,
        order_type: &str,
        quantity: f64,
    ) -> OrderResult {
        let gated = self.gate(exchange, symbol, datastream, side, order_type, quantity)?;
        let result = self.place(gated);
        debug_hooks::log_order_result(exchange, symbol, &result);
        result
    }

    fn place(&self, order: GatedOrder) -> OrderResult {
        let request = PlaceOrderRequest {
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            size: order.quantity.clone(),
            price: None,
            client_order_id: Some(client_order_id()),
            reduce_only: false,
        };

        let config = self
            .connections
            .exchange_config(order.exchange)
            .map_err(|err| ExecGuardError::RuntimeCallFailed(one_line(&err)))?;
        tracing::info!(
            exchange = %order.exchange,
            network = config.network.as_str(),
            mode = %order.execution.mode,
            symbol = %order.symbol,
            side = %order.side,
            size = %order.quantity,
            "submitting order"
        );

        let client = self
            .runtime
            .create_execution_client(&order.execution, order.exchange)
            .map_err(|err| ExecGuardError::RuntimeCallFailed(one_line(&err)))?;
        let ack = self
            .handle
            .block_on(client.place(&request))
            .map_err(|err| ExecGuardError::RuntimeCallFailed(one_line(&err)))?;

        Ok(OrderReceipt {
            order_id: ack.order_id,
            client_order_id: ack.client_order_id,
            status: ack.status,
            mode: ack.mode,
            exchange: order.exchange,
            symbol: order.symbol,
            datastream: order.datastream,
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
        })
    }
}

fn parse_side(side: &str) -> GuardResult<OrderSide> {
    let side = side.trim();
    if side.eq_ignore_ascii_case("buy") {
        Ok(OrderSide::Buy)
    } else if side.eq_ignore_ascii_case("sell") {
        Ok(OrderSide::Sell)
    } else {
        Err(ExecGuardError::InvalidParameters(format!("unsupported side: {side:?}")))
    }
}

fn parse_order_type(order_type: &str) -> GuardResult<OrderType> {
    OrderType::from_str(order_type.trim())
        .map_err(|_| ExecGuardError::InvalidParameters(format!("unsupported order type: {order_type:?}")))
}

fn parse_quantity(size: f64) -> GuardResult<BigDecimal> {
    if !size.is_finite() || size <= 0.0 {
        return Err(ExecGuardError::InvalidParameters("quantity must be > 0".to_string()));
    }
    // Display gives the shortest round-trip form, never an exponent.
    let raw = size.to_string();
    BigDecimal::from_str(&raw)
        .map(|q| q.normalized())
        .map_err(|err| ExecGuardError::InvalidParameters(format!("quantity {raw}: {err}")))
}

/// `xg-<unix millis>-<random hex>`.
fn client_order_id() -> String {
    format!(
        "xg-{}-{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
