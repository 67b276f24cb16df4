#![allow(dead_code)]

use async_trait::async_trait;
use execguard_demo::Gateway;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use xws::env::env_map;
use xws::exec::PaperExecutionClient;
use xws::{
    ChannelKind, ExchangeConfig, ExchangeId, ExchangeRuntime, ExecutionClient, ExecutionConfig,
    MuxOptions, MuxSubscription, PlaceOrderAck, PlaceOrderRequest, RuntimeError, StreamTask,
    CONTRACT_VERSION,
};

/// What the fake stream produces once started.
#[derive(Clone, Debug)]
pub enum StreamScript {
    Lines(Vec<String>),
    LinesThenDecodeError(Vec<String>),
    Trickle(Duration),
    Idle,
}

pub struct FakeRuntime {
    pub version: u32,
    pub fail_resolve: bool,
    pub symbols: Result<Vec<String>, String>,
    pub fail_place: Option<String>,
    pub script: StreamScript,

    pub resolve_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub place_calls: Arc<AtomicUsize>,
    pub stream_calls: AtomicUsize,
    pub started: Mutex<Vec<(MuxSubscription, ChannelKind, MuxOptions)>>,
    pub paper: Mutex<HashMap<ExchangeId, Arc<PaperExecutionClient>>>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self {
            version: CONTRACT_VERSION,
            fail_resolve: false,
            symbols: Ok(vec!["BTC".to_string(), "ETH".to_string()]),
            fail_place: None,
            script: StreamScript::Idle,
            resolve_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            place_calls: Arc::new(AtomicUsize::new(0)),
            stream_calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            paper: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeRuntime {
    pub fn with_script(script: StreamScript) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
            + self.place_calls.load(Ordering::SeqCst)
            + self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_started(&self) -> Option<(MuxSubscription, ChannelKind, MuxOptions)> {
        self.started.lock().unwrap().last().cloned()
    }
}

struct CountingClient {
    inner: Arc<PaperExecutionClient>,
    calls: Arc<AtomicUsize>,
    fail: Option<String>,
}

#[async_trait]
impl ExecutionClient for CountingClient {
    async fn place(&self, request: &PlaceOrderRequest) -> xws::Result<PlaceOrderAck> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail {
            return Err(RuntimeError::Rejected(msg.clone()));
        }
        self.inner.place(request).await
    }
}

#[async_trait]
impl ExchangeRuntime for FakeRuntime {
    fn contract_version(&self) -> u32 {
        self.version
    }

    fn resolve_exchange_config(&self, exchange: ExchangeId) -> xws::Result<ExchangeConfig> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_resolve {
            return Err(RuntimeError::Config(format!("{exchange} is misconfigured")));
        }
        ExchangeConfig::resolve(exchange, &env_map([]))
    }

    fn supports_symbol_discovery(&self, exchange: ExchangeId) -> bool {
        exchange == ExchangeId::Hl
    }

    async fn list_symbols(&self, _exchange: ExchangeId, _config: &ExchangeConfig) -> xws::Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.symbols.clone().map_err(RuntimeError::Transport)
    }

    fn create_execution_client(
        &self,
        config: &ExecutionConfig,
        exchange: ExchangeId,
    ) -> xws::Result<Arc<dyn ExecutionClient>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !config.mode.is_paper() {
            return Err(RuntimeError::Unsupported(format!(
                "no signing backend linked for {exchange} {}",
                config.mode
            )));
        }
        let inner = self
            .paper
            .lock()
            .unwrap()
            .entry(exchange)
            .or_insert_with(|| Arc::new(PaperExecutionClient::new(config.mode)))
            .clone();
        Ok(Arc::new(CountingClient {
            inner,
            calls: self.place_calls.clone(),
            fail: self.fail_place.clone(),
        }))
    }

    fn start_multiplexed_stream(
        &self,
        subscription: MuxSubscription,
        channel: ChannelKind,
        options: MuxOptions,
    ) -> StreamTask {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.started
            .lock()
            .unwrap()
            .push((subscription.clone(), channel, options));

        let label = format!("fake:{}:{}", subscription.exchange, channel);
        let script = self.script.clone();
        let opening = async move {
            let frames: xws::FrameStream = match script {
                StreamScript::Lines(lines) => stream::iter(lines.into_iter().map(Ok)).boxed(),
                StreamScript::LinesThenDecodeError(lines) => stream::iter(
                    lines
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(RuntimeError::Decode("garbled frame".into())))),
                )
                .boxed(),
                StreamScript::Trickle(every) => stream::unfold(0u64, move |i| async move {
                    tokio::time::sleep(every).await;
                    Some((Ok(format!("tick-{i}")), i + 1))
                })
                .boxed(),
                StreamScript::Idle => stream::pending().boxed(),
            };
            Ok(frames)
        };
        StreamTask::from_opening(label, opening, options)
    }
}

pub fn gateway(fake: Arc<FakeRuntime>, env: &[(&str, &str)]) -> Gateway {
    let env: HashMap<String, String> = env_map(env.iter().copied());
    Gateway::new(fake, Arc::new(env)).expect("gateway")
}

pub fn lines(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("line-{i}")).collect()
}

pub fn wait_until(mut cond: impl FnMut() -> bool, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}
