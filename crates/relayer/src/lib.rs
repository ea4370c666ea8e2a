//! Standard Relayer API v2 client.
//!
//! For more information on the HTTP API, consult:
//! <https://github.com/0xProject/standard-relayer-api/blob/master/http/v2.md>

mod arguments;
mod error;

pub use {
    arguments::Arguments,
    error::{Error, ErrorCode, Rejection, ValidationError},
};
use {
    anyhow::{Context, Result},
    model::{
        asset_data::AssetData,
        order::{OrderConfig, OrderConfigRequest, SignedOrder},
        orderbook::OrderBook,
    },
    reqwest::{IntoUrl, Method, StatusCode},
    serde::de::DeserializeOwned,
    std::time::Duration,
    url::Url,
};

const USER_AGENT: &str = "0x-maker/0.1.0";

/// Abstract relayer API. Provides a mockable implementation.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait RelayerApi: Send + Sync {
    /// Asks the relayer which fees and fee recipient it wants for an order.
    ///
    /// Sent once. Every failure, including a non-success status, is
    /// [`Error::Unavailable`].
    ///
    /// See [`/v2/order_config`](https://github.com/0xProject/standard-relayer-api/blob/master/http/v2.md).
    async fn order_config(&self, request: &OrderConfigRequest) -> Result<OrderConfig, Error>;

    /// Hands a signed order to the relayer. Success means the relayer accepted
    /// it into its book, not that it will be filled.
    async fn submit_order(&self, order: &SignedOrder) -> Result<(), Error>;

    /// Fetches a snapshot of the orderbook of one asset pair with asks sorted
    /// ascending and bids descending by price.
    async fn order_book(&self, base: &AssetData, quote: &AssetData) -> Result<OrderBook, Error>;
}

/// Retries of requests that failed because the relayer was unavailable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after the given (0 based) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Relayer HTTP client for a single network.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: Url,
    network_id: u64,
    retry: RetryPolicy,
}

impl Client {
    /// Default relayer of the local development setup.
    pub const DEFAULT_URL: &'static str = "http://localhost:3300/v2/";

    pub fn new(base_url: impl IntoUrl, network_id: u64, client: reqwest::Client) -> Result<Self> {
        let mut base_url = base_url.into_url().context("relayer url")?;
        // Endpoints are joined relative to the base path.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            network_id,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_arguments(args: &Arguments, network_id: u64) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(args.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("relayer http client")?;
        Ok(Self::new(args.relayer_url.clone(), network_id, client)?
            .with_retry(args.retry_policy()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str, query: &[(&str, String)]) -> Url {
        let mut url = self
            .base_url
            .join(endpoint)
            .expect("unexpectedly invalid URL segment");
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("networkId", &self.network_id.to_string());
        url
    }

    /// Sends a request, retrying according to the retry policy while the
    /// relayer is unavailable. Returns the body of a successful response.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String, Error> {
        let mut attempt = 0;
        loop {
            match self.execute_once(method.clone(), url.clone(), body).await {
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.attempts => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(%url, ?err, ?delay, attempt, "relayer unavailable, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn execute_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String, Error> {
        let (status, text) = self.send(method, url, body).await?;
        if status.is_success() {
            Ok(text)
        } else if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            Err(Error::Rejected(Rejection::parse(status.as_u16(), &text)))
        } else {
            Err(Error::Unavailable {
                status: Some(status.as_u16()),
                body: text,
            })
        }
    }

    /// Sends a single request. Only transport failures are errors here, the
    /// caller decides what a non-success status means.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<(StatusCode, String), Error> {
        tracing::debug!(%method, %url, "querying relayer");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let unavailable = |err: reqwest::Error| Error::Unavailable {
            status: err.status().map(|status| status.as_u16()),
            body: err.to_string(),
        };
        let response = request.send().await.map_err(unavailable)?;
        let status = response.status();
        let text = response.text().await.map_err(unavailable)?;
        tracing::debug!(%status, body = %text, "relayer response");
        Ok((status, text))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<T, Error> {
        parse(self.execute(method, url, body).await?)
    }
}

fn parse<T: DeserializeOwned>(text: String) -> Result<T, Error> {
    serde_json::from_str(&text).map_err(|source| Error::InvalidResponse { source, body: text })
}

fn to_json(value: &impl serde::Serialize) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|source| Error::InvalidResponse {
        source,
        body: String::new(),
    })
}

#[async_trait::async_trait]
impl RelayerApi for Client {
    async fn order_config(&self, request: &OrderConfigRequest) -> Result<OrderConfig, Error> {
        let url = self.url(
            "order_config",
            &[
                ("exchangeAddress", request.exchange_address.to_string()),
                ("makerAddress", request.maker_address.to_string()),
                ("takerAddress", request.taker_address.to_string()),
                ("makerAssetAmount", request.maker_asset_amount.to_string()),
                ("takerAssetAmount", request.taker_asset_amount.to_string()),
                ("makerAssetData", request.maker_asset_data.to_string()),
                ("takerAssetData", request.taker_asset_data.to_string()),
                (
                    "expirationTimeSeconds",
                    request.expiration_time_seconds.to_string(),
                ),
            ],
        );
        // Single attempt. Any non-success status counts as unavailable.
        let (status, text) = self.send(Method::GET, url, None).await?;
        if !status.is_success() {
            return Err(Error::Unavailable {
                status: Some(status.as_u16()),
                body: text,
            });
        }
        parse(text)
    }

    async fn submit_order(&self, order: &SignedOrder) -> Result<(), Error> {
        let body = to_json(order)?;
        self.execute(Method::POST, self.url("order", &[]), Some(&body))
            .await?;
        tracing::info!(hash = %order.hash(), "relayer accepted order");
        Ok(())
    }

    async fn order_book(&self, base: &AssetData, quote: &AssetData) -> Result<OrderBook, Error> {
        let url = self.url(
            "orderbook",
            &[
                ("baseAssetData", base.to_string()),
                ("quoteAssetData", quote.to_string()),
            ],
        );
        let book: OrderBook = self.request(Method::GET, url, None).await?;
        Ok(book.sorted())
    }
}
