// client/src/exec/paper.rs
//
// In-memory paper execution. Market orders fill immediately, limit orders rest.
// Optionally mirrors its book to a JSON snapshot so ids and positions survive
// a restart.

use super::ExecutionClient;
use crate::error::{Result, RuntimeError};
use crate::types::{ExecutionMode, OrderSide, OrderStatus, OrderType, PlaceOrderAck, PlaceOrderRequest};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const PAPER_STATE_VERSION: u32 = 1;
const DEFAULT_FILL_PRICE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaperOrder {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub size: BigDecimal,
    pub price: Option<BigDecimal>,
    pub filled_size: BigDecimal,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub symbol: String,
    pub size: BigDecimal,
    pub avg_entry_price: BigDecimal,
    pub mark_price: BigDecimal,
    pub unrealized_pnl: BigDecimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PaperSnapshot {
    version: u32,
    order_sequence: u64,
    client_order_sequence: u64,
    orders: Vec<PaperOrder>,
    positions: Vec<PositionState>,
}

#[derive(Debug, Default)]
struct PaperBook {
    order_sequence: u64,
    client_order_sequence: u64,
    orders: BTreeMap<String, PaperOrder>,
    positions: BTreeMap<String, PositionState>,
}

impl PaperBook {
    fn from_snapshot(snap: PaperSnapshot) -> Self {
        Self {
            order_sequence: snap.order_sequence,
            client_order_sequence: snap.client_order_sequence,
            orders: snap
                .orders
                .into_iter()
                .map(|o| (o.order_id.clone(), o))
                .collect(),
            positions: snap
                .positions
                .into_iter()
                .map(|p| (p.symbol.clone(), p))
                .collect(),
        }
    }

    fn to_snapshot(&self) -> PaperSnapshot {
        PaperSnapshot {
            version: PAPER_STATE_VERSION,
            order_sequence: self.order_sequence,
            client_order_sequence: self.client_order_sequence,
            orders: self.orders.values().cloned().collect(),
            positions: self.positions.values().cloned().collect(),
        }
    }

    fn next_order_id(&mut self) -> String {
        self.order_sequence += 1;
        format!("{:06}", self.order_sequence)
    }

    fn next_client_order_id(&mut self) -> String {
        self.client_order_sequence += 1;
        format!("paper-{:06}", self.client_order_sequence)
    }

    fn apply_fill(&mut self, request: &PlaceOrderRequest, fill_price: &BigDecimal) {
        let signed = match request.side {
            OrderSide::Buy => request.size.clone(),
            OrderSide::Sell => -request.size.clone(),
        };

        let next = match self.positions.get(&request.symbol) {
            None => PositionState {
                symbol: request.symbol.clone(),
                size: signed,
                avg_entry_price: fill_price.clone(),
                mark_price: fill_price.clone(),
                unrealized_pnl: BigDecimal::zero(),
            },
            Some(existing) => {
                let new_size = &existing.size + &signed;
                let same_direction = existing.size.is_zero() || existing.size.sign() == signed.sign();
                let avg_entry = if new_size.is_zero() {
                    BigDecimal::zero()
                } else if same_direction {
                    (&existing.avg_entry_price * &existing.size + fill_price * &signed) / &new_size
                } else {
                    fill_price.clone()
                };
                let pnl = (fill_price - &avg_entry) * &new_size;
                PositionState {
                    symbol: request.symbol.clone(),
                    size: new_size,
                    avg_entry_price: avg_entry,
                    mark_price: fill_price.clone(),
                    unrealized_pnl: pnl,
                }
            }
        };
        self.positions.insert(request.symbol.clone(), next);
    }
}

pub struct PaperExecutionClient {
    mode: ExecutionMode,
    state_path: Option<PathBuf>,
    book: Mutex<PaperBook>,
}

impl PaperExecutionClient {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            state_path: None,
            book: Mutex::new(PaperBook::default()),
        }
    }

    /// Paper client backed by a JSON snapshot at `path`.
    pub fn with_state_file(mode: ExecutionMode, path: PathBuf) -> Self {
        let book = PaperBook::from_snapshot(load_or_empty(&path));
        Self {
            mode,
            state_path: Some(path),
            book: Mutex::new(book),
        }
    }

    pub fn positions(&self) -> Vec<PositionState> {
        match self.book.lock() {
            Ok(book) => book.positions.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn orders(&self) -> Vec<PaperOrder> {
        match self.book.lock() {
            Ok(book) => book.orders.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn place_now(&self, request: &PlaceOrderRequest) -> Result<PlaceOrderAck> {
        if request.size <= BigDecimal::zero() {
            return Err(RuntimeError::Rejected("size must be greater than 0".to_string()));
        }

        let mut book = self
            .book
            .lock()
            .map_err(|_| RuntimeError::Rejected("paper book poisoned".to_string()))?;

        let order_id = book.next_order_id();
        let client_order_id = match &request.client_order_id {
            Some(id) => id.clone(),
            None => book.next_client_order_id(),
        };

        let (status, filled) = match request.order_type {
            OrderType::Market => {
                let fill_price = request
                    .price
                    .clone()
                    .unwrap_or_else(|| BigDecimal::from(DEFAULT_FILL_PRICE));
                book.apply_fill(request, &fill_price);
                (OrderStatus::Filled, request.size.clone())
            }
            OrderType::Limit => (OrderStatus::Open, BigDecimal::zero()),
        };

        book.orders.insert(
            order_id.clone(),
            PaperOrder {
                order_id: order_id.clone(),
                client_order_id: client_order_id.clone(),
                symbol: request.symbol.clone(),
                side: request.side,
                order_type: request.order_type,
                size: request.size.clone(),
                price: request.price.clone(),
                filled_size: filled,
                status,
                updated_at: Utc::now(),
            },
        );

        if let Some(path) = &self.state_path {
            if let Err(err) = save(path, &book.to_snapshot()) {
                log::warn!("paper state save failed for {}: {err}", path.display());
            }
        }

        Ok(PlaceOrderAck {
            order_id,
            client_order_id: Some(client_order_id),
            status,
            mode: self.mode,
        })
    }
}

#[async_trait]
impl ExecutionClient for PaperExecutionClient {
    async fn place(&self, request: &PlaceOrderRequest) -> Result<PlaceOrderAck> {
        self.place_now(request)
    }
}

fn load_or_empty(path: &Path) -> PaperSnapshot {
    if !path.exists() {
        return PaperSnapshot::default();
    }

    let parsed = fs::read_to_string(path)
        .map_err(RuntimeError::from)
        .and_then(|raw| serde_json::from_str::<PaperSnapshot>(&raw).map_err(RuntimeError::from));

    match parsed {
        Ok(mut snap) => {
            if snap.version == 0 {
                log::warn!("paper state missing version; assuming version {PAPER_STATE_VERSION}");
                snap.version = PAPER_STATE_VERSION;
            }
            snap
        }
        Err(err) => {
            log::warn!("paper state file corrupt, resetting: {err}");
            preserve_corrupt(path);
            PaperSnapshot::default()
        }
    }
}

fn preserve_corrupt(path: &Path) {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt.{stamp}"));
    if let Err(err) = fs::copy(path, PathBuf::from(target)) {
        log::warn!("failed to preserve corrupt paper state: {err}");
    }
}

fn save(path: &Path, snap: &PaperSnapshot) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, serde_json::to_vec_pretty(snap)?)?;
    fs::rename(tmp, path)?;
    Ok(())
}
