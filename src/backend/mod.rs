//! Trading backend client
//!
//! The engine talks to the dashboard backend's REST API, which proxies Kalshi
//! and owns authentication/signing. `TradingBackend` is the seam the rest of
//! the crate depends on; `HttpBackend` is the production implementation and
//! tests substitute mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::BackendError;
use crate::feed::{OrderBookPayload, OrdersPayload, PositionsPayload, RawOrder, RawOrderBook, RawPosition};
use crate::types::{Cents, MarketSide, PairKey, Qty, Ticker};

/// Order placement command: always a limit buy on one side, priced in cents.
/// Kalshi expects the price under `yes_price` or `no_price` depending on the
/// side being bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrderRequest {
    pub ticker: String,
    pub side: MarketSide,
    pub action: &'static str,
    pub count: Qty,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<Cents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<Cents>,
}

impl PlaceOrderRequest {
    pub fn limit_buy(key: &PairKey, price: Cents, count: Qty) -> Self {
        let (yes_price, no_price) = match key.side {
            MarketSide::Yes => (Some(price), None),
            MarketSide::No => (None, Some(price)),
        };
        Self {
            ticker: key.ticker.as_str().to_string(),
            side: key.side,
            action: "buy",
            count,
            order_type: "limit",
            yes_price,
            no_price,
        }
    }
}

/// The backend surface the engine consumes and commands
#[async_trait]
pub trait TradingBackend: Send + Sync {
    /// Both bid ladders for one instrument
    async fn orderbook(&self, ticker: &Ticker) -> Result<RawOrderBook, BackendError>;

    /// All currently resting orders for the account
    async fn resting_orders(&self) -> Result<Vec<RawOrder>, BackendError>;

    /// Signed net position per instrument
    async fn positions(&self) -> Result<Vec<RawPosition>, BackendError>;

    /// Place a limit buy; returns the backend-assigned order id
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<String, BackendError>;

    async fn cancel_order(&self, order_id: &str) -> Result<(), BackendError>;
}

/// REST client for the dashboard backend
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct PlacedOrderEnvelope {
    order: PlacedOrderBody,
}

#[derive(Debug, Deserialize)]
struct PlacedOrderBody {
    order_id: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::malformed(format!("invalid backend url: {}", e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::malformed(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "no error details".to_string());
        Err(BackendError::Api {
            status: status.as_u16(),
            detail: detail.chars().take(500).collect(),
        })
    }
}

#[async_trait]
impl TradingBackend for HttpBackend {
    async fn orderbook(&self, ticker: &Ticker) -> Result<RawOrderBook, BackendError> {
        let url = self.endpoint(&format!("/api/markets/{}/orderbook", ticker))?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        let payload: OrderBookPayload = response.json().await?;
        Ok(payload.orderbook)
    }

    async fn resting_orders(&self) -> Result<Vec<RawOrder>, BackendError> {
        let url = self.endpoint("/api/orders")?;
        let response = Self::check(
            self.client
                .get(url)
                .query(&[("status", "resting")])
                .send()
                .await?,
        )
        .await?;
        let payload: OrdersPayload = response.json().await?;
        Ok(payload.orders)
    }

    async fn positions(&self) -> Result<Vec<RawPosition>, BackendError> {
        let url = self.endpoint("/api/positions")?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        let payload: PositionsPayload = response.json().await?;
        Ok(payload.market_positions)
    }

    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<String, BackendError> {
        let url = self.endpoint("/api/orders")?;
        let response = Self::check(self.client.post(url).json(request).send().await?).await?;
        let envelope: PlacedOrderEnvelope = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(format!("order response: {}", e)))?;
        Ok(envelope.order.order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/orders/{}", order_id))?;
        Self::check(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}
