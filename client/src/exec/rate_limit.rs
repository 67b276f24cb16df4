use super::ExecutionClient;
use crate::env::EnvSource;
use crate::error::Result;
use crate::types::{ExchangeId, PlaceOrderAck, PlaceOrderRequest};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Requests-per-second limiter for one exchange, sized from
/// `XWS_<EXCHANGE>_RATE_LIMIT`.
pub fn limiter_for(exchange: ExchangeId, env: &dyn EnvSource) -> Arc<DefaultDirectRateLimiter> {
    let (name, fallback) = exchange.rate_limit_env();
    let per_second = env.get_positive_u32(name, fallback);
    let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
}

/// Waits on the exchange limiter before every `place`.
pub struct RateLimitedClient {
    inner: Arc<dyn ExecutionClient>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl RateLimitedClient {
    pub fn new(inner: Arc<dyn ExecutionClient>, limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl ExecutionClient for RateLimitedClient {
    async fn place(&self, request: &PlaceOrderRequest) -> Result<PlaceOrderAck> {
        self.limiter.until_ready().await;
        self.inner.place(request).await
    }
}
