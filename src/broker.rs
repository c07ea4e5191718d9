pub mod binance;
pub mod client;
pub mod error;
pub mod order;
pub mod submitter;

pub use binance::BinanceClient;
pub use client::OrderResult;
pub use error::InputError;
pub use submitter::OrderSubmitter;
