use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ExchangeError;
use super::order::OrderRequest;

/// Anything that can place an order on an exchange.
///
/// `BinanceClient` talks to the real REST API; tests substitute a scripted
/// client. Implementations own authentication and the wire format.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ExchangeError>;
}

/// The exchange's acknowledgement of a new order. Fields this crate does not
/// interpret are kept verbatim in `echoed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: u64,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    #[serde(flatten)]
    pub echoed: Map<String, Value>,
}

impl fmt::Display for OrderConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderResult {
    Single(OrderConfirmation),
    /// Two unlinked orders; see `OrderSubmitter::submit_oco`.
    Oco {
        limit_order: OrderConfirmation,
        stop_limit_order: OrderConfirmation,
    },
}

impl OrderResult {
    pub fn confirmations(&self) -> Vec<&OrderConfirmation> {
        match self {
            OrderResult::Single(confirmation) => vec![confirmation],
            OrderResult::Oco {
                limit_order,
                stop_limit_order,
            } => vec![limit_order, stop_limit_order],
        }
    }
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUTURES_ACK: &str = r#"{
        "orderId": 4056384739,
        "symbol": "BTCUSDT",
        "status": "NEW",
        "clientOrderId": "x-abc123",
        "price": "50000",
        "origQty": "0.010",
        "type": "LIMIT",
        "timeInForce": "GTC",
        "side": "BUY"
    }"#;

    #[test]
    fn keeps_unknown_fields_verbatim() {
        let confirmation: OrderConfirmation = serde_json::from_str(FUTURES_ACK).unwrap();

        assert_eq!(confirmation.order_id, 4056384739);
        assert_eq!(confirmation.symbol, "BTCUSDT");
        assert_eq!(confirmation.status.as_deref(), Some("NEW"));
        assert_eq!(confirmation.client_order_id.as_deref(), Some("x-abc123"));
        assert_eq!(confirmation.echoed["origQty"], "0.010");
        assert!(!confirmation.echoed.contains_key("orderId"));
    }

    #[test]
    fn status_is_optional() {
        let confirmation: OrderConfirmation =
            serde_json::from_str(r#"{"orderId": 7, "symbol": "BNBUSDT"}"#).unwrap();

        assert_eq!(confirmation.status, None);
        assert_eq!(confirmation.to_string(), r#"{"orderId":7,"symbol":"BNBUSDT"}"#);
    }

    #[test]
    fn oco_result_names_both_legs() {
        let leg = |id| OrderConfirmation {
            order_id: id,
            symbol: "BNBUSDT".to_string(),
            status: None,
            client_order_id: None,
            echoed: Map::new(),
        };
        let result = OrderResult::Oco {
            limit_order: leg(1),
            stop_limit_order: leg(2),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["limit_order"]["orderId"], 1);
        assert_eq!(json["stop_limit_order"]["orderId"], 2);
        assert_eq!(result.confirmations().len(), 2);
    }
}
