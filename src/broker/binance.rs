use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use super::client::{ExchangeClient, OrderConfirmation};
use super::error::ExchangeError;
use super::order::{OrderRequest, Venue};

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Live,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => f.write_str("Testnet"),
            Network::Live => f.write_str("Live"),
        }
    }
}

/// Base URLs for the two markets an order can go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub futures: String,
    pub spot: String,
}

impl Endpoints {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Testnet => Endpoints {
                futures: "https://testnet.binancefuture.com".to_string(),
                spot: "https://testnet.binance.vision".to_string(),
            },
            Network::Live => Endpoints {
                futures: "https://fapi.binance.com".to_string(),
                spot: "https://api.binance.com".to_string(),
            },
        }
    }

    fn order_url(&self, venue: Venue) -> String {
        match venue {
            Venue::UsdmFutures => format!("{}/fapi/v1/order", self.futures.trim_end_matches('/')),
            Venue::Spot => format!("{}/api/v3/order", self.spot.trim_end_matches('/')),
        }
    }

    fn ping_url(&self) -> String {
        format!("{}/fapi/v1/ping", self.futures.trim_end_matches('/'))
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

// Keep secrets out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

pub struct BinanceClient {
    http: Client,
    credentials: Credentials,
    endpoints: Endpoints,
    recv_window: u64,
}

impl BinanceClient {
    pub fn new(
        credentials: Credentials,
        endpoints: Endpoints,
        recv_window: u64,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Connection(e.to_string()))?;

        Ok(BinanceClient {
            http,
            credentials,
            endpoints,
            recv_window,
        })
    }

    /// Builds the client and checks the futures endpoint answers.
    pub async fn connect(
        credentials: Credentials,
        endpoints: Endpoints,
        recv_window: u64,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = Self::new(credentials, endpoints, recv_window, timeout)?;
        client.ping().await?;
        Ok(client)
    }

    async fn ping(&self) -> Result<(), ExchangeError> {
        let url = self.endpoints.ping_url();
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExchangeError::Connection(format!(
                "{} answered HTTP {}",
                url,
                response.status()
            )));
        }
        info!("Reached {}", url);
        Ok(())
    }

    fn signed_query(&self, order: &OrderRequest, timestamp: i64) -> Result<String, ExchangeError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(order.params())
            .append_pair("recvWindow", &self.recv_window.to_string())
            .append_pair("timestamp", &timestamp.to_string())
            .finish();
        let signature = sign(&self.credentials.api_secret, &query)?;

        Ok(format!("{}&signature={}", query, signature))
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn create_order(
        &self,
        order: &OrderRequest,
    ) -> Result<OrderConfirmation, ExchangeError> {
        let url = self.endpoints.order_url(order.venue);
        let query = self.signed_query(order, Utc::now().timestamp_millis())?;
        debug!("POST {} {:?}", url, order.params());

        let response = self
            .http
            .post(format!("{}?{}", url, query))
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ExchangeError::Unknown(format!("Unexpected order response ({}): {}", e, body))
        })
    }
}

/// Hex-encoded HMAC-SHA256 of `payload` keyed with the API secret.
pub fn sign(secret: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Unknown(format!("Cannot sign request: {}", e)))?;
    mac.update(payload.as_bytes());

    Ok(mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect())
}

fn api_error(status: u16, body: &str) -> ExchangeError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(error) => ExchangeError::Api {
            status,
            code: error.code,
            message: error.msg,
        },
        Err(_) => ExchangeError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
