use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Buy => "BUY",
            OrderDirection::Sell => "SELL",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = InputError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderDirection::Buy),
            "SELL" => Ok(OrderDirection::Sell),
            _ => Err(InputError::InvalidSide(input.trim().to_string())),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order types as the exchange names them on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
    /// Futures stop-limit: triggers at `stopPrice`, rests at `price`.
    Stop,
    /// Spot stop-limit.
    StopLossLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::StopLossLimit => "STOP_LOSS_LIMIT",
        }
    }
}

/// The four order shapes an operator can pick from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    Market,
    Limit,
    StopLimit,
    Oco,
}

impl Archetype {
    pub const MENU: [Archetype; 4] = [
        Archetype::Market,
        Archetype::Limit,
        Archetype::StopLimit,
        Archetype::Oco,
    ];

    pub fn from_selector(selector: &str) -> Result<Self, InputError> {
        match selector.trim() {
            "1" => Ok(Archetype::Market),
            "2" => Ok(Archetype::Limit),
            "3" => Ok(Archetype::StopLimit),
            "4" => Ok(Archetype::Oco),
            other => Err(InputError::InvalidOrderType(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Archetype::Market => "Market",
            Archetype::Limit => "Limit",
            Archetype::StopLimit => "Stop-Limit",
            Archetype::Oco => "OCO (Spot, simulated)",
        }
    }
}

/// Which exchange market receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    UsdmFutures,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    GoodTillCancelled,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GoodTillCancelled => "GTC",
        }
    }
}

/// A single order-creation request, ready to be handed to an exchange client.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: OrderDirection,
    pub order_type: OrderType,
    pub venue: Venue,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    fn base(
        symbol: &str,
        direction: OrderDirection,
        order_type: OrderType,
        quantity: Decimal,
    ) -> Self {
        OrderRequest {
            symbol: symbol.to_string(),
            direction,
            order_type,
            venue: Venue::UsdmFutures,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
            client_order_id: None,
        }
    }

    pub fn market(symbol: &str, direction: OrderDirection, quantity: Decimal) -> Self {
        Self::base(symbol, direction, OrderType::Market, quantity)
    }

    pub fn limit(
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        OrderRequest {
            price: Some(price),
            time_in_force: Some(TimeInForce::GoodTillCancelled),
            ..Self::base(symbol, direction, OrderType::Limit, quantity)
        }
    }

    pub fn stop_limit(
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        OrderRequest {
            price: Some(limit_price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::GoodTillCancelled),
            ..Self::base(symbol, direction, OrderType::Stop, quantity)
        }
    }

    pub fn stop_loss_limit(
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        OrderRequest {
            price: Some(limit_price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::GoodTillCancelled),
            venue: Venue::Spot,
            ..Self::base(symbol, direction, OrderType::StopLossLimit, quantity)
        }
    }

    pub fn on(mut self, venue: Venue) -> Self {
        self.venue = venue;
        self
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Checks the quantity, every supplied price, and which price fields the
    /// order type requires or forbids.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.symbol.trim().is_empty() {
            return Err(InputError::EmptySymbol);
        }
        if self.quantity <= Decimal::ZERO {
            return Err(InputError::NonPositive { field: "quantity" });
        }
        for (field, value) in [("price", self.price), ("stopPrice", self.stop_price)] {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                return Err(InputError::NonPositive { field });
            }
        }

        let order_type = self.order_type.as_str();
        let (needs_price, needs_stop) = match self.order_type {
            OrderType::Market => (false, false),
            OrderType::Limit => (true, false),
            OrderType::Stop | OrderType::StopLossLimit => (true, true),
        };

        for (field, required, present) in [
            ("price", needs_price, self.price.is_some()),
            ("stopPrice", needs_stop, self.stop_price.is_some()),
            ("timeInForce", needs_price, self.time_in_force.is_some()),
        ] {
            match (required, present) {
                (true, false) => return Err(InputError::MissingField { order_type, field }),
                (false, true) => return Err(InputError::ForbiddenField { order_type, field }),
                _ => {}
            }
        }

        Ok(())
    }

    /// Order-creation parameters in the exchange's field names and order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.direction.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
        ];
        if let Some(tif) = self.time_in_force {
            params.push(("timeInForce", tif.as_str().to_string()));
        }
        params.push(("quantity", self.quantity.normalize().to_string()));
        if let Some(price) = self.price {
            params.push(("price", price.normalize().to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice", stop_price.normalize().to_string()));
        }
        if let Some(id) = &self.client_order_id {
            params.push(("newClientOrderId", id.clone()));
        }
        params
    }
}

/// Archetype-specific prices collected from the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Pricing {
    Market,
    Limit {
        price: Decimal,
    },
    StopLimit {
        stop_price: Decimal,
        limit_price: Decimal,
    },
    Oco {
        limit_price: Decimal,
        stop_price: Decimal,
        stop_limit_price: Decimal,
    },
}

/// Everything the operator typed in for one order session.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub symbol: String,
    pub direction: OrderDirection,
    pub quantity: Decimal,
    pub pricing: Pricing,
}

impl OrderTicket {
    pub fn archetype(&self) -> Archetype {
        match self.pricing {
            Pricing::Market => Archetype::Market,
            Pricing::Limit { .. } => Archetype::Limit,
            Pricing::StopLimit { .. } => Archetype::StopLimit,
            Pricing::Oco { .. } => Archetype::Oco,
        }
    }
}

/// Parses operator text as a decimal. Accepts plain and scientific notation.
pub fn parse_decimal(field: &'static str, input: &str) -> Result<Decimal, InputError> {
    let text = input.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| InputError::Malformed {
            field,
            input: text.to_string(),
        })
}

pub fn parse_positive(field: &'static str, input: &str) -> Result<Decimal, InputError> {
    let value = parse_decimal(field, input)?;
    if value <= Decimal::ZERO {
        return Err(InputError::NonPositive { field });
    }
    Ok(value)
}
