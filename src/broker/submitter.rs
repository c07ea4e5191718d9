use std::io::Write;

use rand::Rng;
use rust_decimal::Decimal;

use super::client::{ExchangeClient, OrderConfirmation, OrderResult};
use super::error::{ExchangeError, InputError};
use super::order::{OrderDirection, OrderRequest, OrderTicket, Pricing, Venue};
use crate::journal::OrderJournal;

/// Turns validated operator parameters into exchange requests.
///
/// Each `submit_*` returns `Err` when the parameters are rejected (nothing is
/// sent), `Ok(None)` when the exchange call failed (already journaled), and
/// `Ok(Some(_))` on success.
pub struct OrderSubmitter<C: ExchangeClient, W: Write> {
    client: C,
    journal: OrderJournal<W>,
    last_failure: Option<String>,
}

impl<C: ExchangeClient, W: Write> OrderSubmitter<C, W> {
    pub fn new(client: C, journal: OrderJournal<W>) -> Self {
        OrderSubmitter {
            client,
            journal,
            last_failure: None,
        }
    }

    /// Reason the most recent exchange call was refused, if it was.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub async fn submit_ticket(
        &mut self,
        ticket: &OrderTicket,
    ) -> Result<Option<OrderResult>, InputError> {
        let OrderTicket {
            symbol,
            direction,
            quantity,
            pricing,
        } = ticket;

        match *pricing {
            Pricing::Market => self.submit_market(symbol, *direction, *quantity).await,
            Pricing::Limit { price } => {
                self.submit_limit(symbol, *direction, *quantity, price).await
            }
            Pricing::StopLimit {
                stop_price,
                limit_price,
            } => {
                self.submit_stop_limit(symbol, *direction, *quantity, stop_price, limit_price)
                    .await
            }
            Pricing::Oco {
                limit_price,
                stop_price,
                stop_limit_price,
            } => {
                self.submit_oco(
                    symbol,
                    *direction,
                    *quantity,
                    limit_price,
                    stop_price,
                    stop_limit_price,
                )
                .await
            }
        }
    }

    pub async fn submit_market(
        &mut self,
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
    ) -> Result<Option<OrderResult>, InputError> {
        let order = OrderRequest::market(symbol, direction, quantity);
        order.validate()?;

        Ok(self.dispatch("Market", &order).await.ok().map(OrderResult::Single))
    }

    pub async fn submit_limit(
        &mut self,
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Option<OrderResult>, InputError> {
        let order = OrderRequest::limit(symbol, direction, quantity, price);
        order.validate()?;

        Ok(self.dispatch("Limit", &order).await.ok().map(OrderResult::Single))
    }

    pub async fn submit_stop_limit(
        &mut self,
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Result<Option<OrderResult>, InputError> {
        let order = OrderRequest::stop_limit(symbol, direction, quantity, stop_price, limit_price);
        order.validate()?;

        Ok(self
            .dispatch("Stop-Limit", &order)
            .await
            .ok()
            .map(OrderResult::Single))
    }

    /// Places a spot LIMIT order, then a spot STOP_LOSS_LIMIT order.
    ///
    /// This is not an exchange OCO: the two orders are unlinked and nothing
    /// is unwound on failure. If the stop-limit leg fails, the limit leg
    /// stays open and the caller gets `Ok(None)`.
    pub async fn submit_oco(
        &mut self,
        symbol: &str,
        direction: OrderDirection,
        quantity: Decimal,
        limit_price: Decimal,
        stop_price: Decimal,
        stop_limit_price: Decimal,
    ) -> Result<Option<OrderResult>, InputError> {
        for (field, value) in [
            ("price", limit_price),
            ("stopPrice", stop_price),
            ("stopLimitPrice", stop_limit_price),
        ] {
            if value <= Decimal::ZERO {
                return Err(InputError::NonPositive { field });
            }
        }

        let tag = format!("oco-{:08x}", rand::rng().random::<u32>());
        let limit = OrderRequest::limit(symbol, direction, quantity, limit_price)
            .on(Venue::Spot)
            .with_client_order_id(format!("{}-L", tag));
        let stop_limit =
            OrderRequest::stop_loss_limit(symbol, direction, quantity, stop_price, stop_limit_price)
                .with_client_order_id(format!("{}-S", tag));
        limit.validate()?;
        stop_limit.validate()?;

        let Ok(limit_order) = self.dispatch("OCO limit leg", &limit).await else {
            return Ok(None);
        };

        match self.dispatch("OCO stop-limit leg", &stop_limit).await {
            Ok(stop_limit_order) => {
                self.journal.info(&format!(
                    "OCO order placed: limit={}, stop_limit={}",
                    limit_order, stop_limit_order
                ));
                Ok(Some(OrderResult::Oco {
                    limit_order,
                    stop_limit_order,
                }))
            }
            Err(_) => {
                self.journal.warn(&format!(
                    "OCO limit leg {} on {} is still open; it was not cancelled",
                    limit_order.order_id, limit_order.symbol
                ));
                Ok(None)
            }
        }
    }

    async fn dispatch(
        &mut self,
        label: &str,
        order: &OrderRequest,
    ) -> Result<OrderConfirmation, ExchangeError> {
        self.last_failure = None;
        match self.client.create_order(order).await {
            Ok(confirmation) => {
                self.journal
                    .info(&format!("{} order placed: {}", label, confirmation));
                Ok(confirmation)
            }
            Err(e) => {
                self.journal.error(&format!("{} order failed: {}", label, e));
                self.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (C, OrderJournal<W>) {
        (self.client, self.journal)
    }
}
