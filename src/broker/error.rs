use thiserror::Error;

/// Rejected operator input. Raised before anything reaches the exchange and
/// never written to the order journal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid order type: {0:?}")]
    InvalidOrderType(String),

    #[error("Invalid side: {0:?}")]
    InvalidSide(String),

    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Invalid {field}: {input:?}")]
    Malformed { field: &'static str, input: String },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("{order_type} order requires {field}")]
    MissingField {
        order_type: &'static str,
        field: &'static str,
    },

    #[error("{order_type} order does not accept {field}")]
    ForbiddenField {
        order_type: &'static str,
        field: &'static str,
    },

    #[error("{0} must not be empty")]
    MissingCredential(&'static str),

    #[error("No input given for {0}")]
    EndOfInput(&'static str),
}

/// Failures reported by an exchange client.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Session setup failed (bad credentials, unreachable endpoint).
    #[error("Error connecting to Binance: {0}")]
    Connection(String),

    /// The exchange answered and refused the request.
    #[error("API Error (HTTP {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("Error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(error: reqwest::Error) -> Self {
        ExchangeError::Unknown(error.to_string())
    }
}
