use std::io::{self, BufRead, Write};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::broker::binance::{Credentials, Network};
use crate::broker::error::InputError;
use crate::broker::order::{parse_positive, Archetype, OrderDirection, OrderTicket, Pricing};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Terminal IO failed: {0}")]
    Io(#[from] io::Error),
}

/// Line-oriented operator prompts. Any bad answer ends the session; there is
/// no re-prompting.
pub struct Prompter<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    fn ask(&mut self, field: &'static str, label: &str) -> Result<String, PromptError> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputError::EndOfInput(field).into());
        }
        Ok(line.trim().to_string())
    }

    /// Uses the given values and only prompts for what is missing.
    pub fn credentials(
        &mut self,
        api_key: Option<String>,
        api_secret: Option<String>,
        network: Network,
    ) -> Result<Credentials, PromptError> {
        let api_key = match api_key {
            Some(key) => key,
            None => self.ask("API key", &format!("Enter your Binance {} API Key: ", network))?,
        };
        let api_secret = match api_secret {
            Some(secret) => secret,
            None => self.ask(
                "API secret",
                &format!("Enter your Binance {} API Secret: ", network),
            )?,
        };

        if api_key.trim().is_empty() {
            return Err(InputError::MissingCredential("API key").into());
        }
        if api_secret.trim().is_empty() {
            return Err(InputError::MissingCredential("API secret").into());
        }

        Ok(Credentials {
            api_key: api_key.trim().to_string(),
            api_secret: api_secret.trim().to_string(),
        })
    }

    pub fn ticket(&mut self) -> Result<OrderTicket, PromptError> {
        writeln!(self.output, "--- Binance Futures Trading Bot ---")?;
        writeln!(self.output, "Select order type:")?;
        for (i, archetype) in Archetype::MENU.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, archetype.label())?;
        }

        let archetype = Archetype::from_selector(&self.ask("order type", "Enter choice (1-4): ")?)?;
        let direction: OrderDirection = self.ask("side", "Side (buy/sell): ")?.parse()?;

        let symbol = self.ask("symbol", "Symbol (e.g., BTCUSDT): ")?.to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(InputError::EmptySymbol.into());
        }

        let quantity = parse_positive("quantity", &self.ask("quantity", "Quantity: ")?)?;

        let pricing = match archetype {
            Archetype::Market => Pricing::Market,
            Archetype::Limit => Pricing::Limit {
                price: self.price("price", "Limit Price: ")?,
            },
            Archetype::StopLimit => {
                let stop_price = self.price("stopPrice", "Stop Price: ")?;
                let limit_price = self.price("price", "Limit Price: ")?;
                Pricing::StopLimit {
                    stop_price,
                    limit_price,
                }
            }
            Archetype::Oco => {
                let limit_price = self.price("price", "OCO Limit Price: ")?;
                let stop_price = self.price("stopPrice", "OCO Stop Price: ")?;
                let stop_limit_price = self.price("stopLimitPrice", "OCO Stop-Limit Price: ")?;
                Pricing::Oco {
                    limit_price,
                    stop_price,
                    stop_limit_price,
                }
            }
        };

        Ok(OrderTicket {
            symbol,
            direction,
            quantity,
            pricing,
        })
    }

    fn price(&mut self, field: &'static str, label: &str) -> Result<Decimal, PromptError> {
        let answer = self.ask(field, label)?;
        Ok(parse_positive(field, &answer)?)
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::str::FromStr;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn input_error(result: Result<OrderTicket, PromptError>) -> InputError {
        match result {
            Err(PromptError::Input(e)) => e,
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn collects_a_limit_ticket() {
        let mut prompter = prompter("2\nbuy\nbtcusdt\n0.01\n50000\n");

        let ticket = prompter.ticket().unwrap();

        assert_eq!(
            ticket,
            OrderTicket {
                symbol: "BTCUSDT".to_string(),
                direction: OrderDirection::Buy,
                quantity: dec("0.01"),
                pricing: Pricing::Limit { price: dec("50000") },
            }
        );
    }

    #[test]
    fn stop_limit_asks_stop_then_limit() {
        let mut prompter = prompter("3\nsell\nethusdt\n1\n2900\n2890\n");

        let ticket = prompter.ticket().unwrap();
        let output = String::from_utf8(prompter.into_output()).unwrap();

        assert_eq!(
            ticket.pricing,
            Pricing::StopLimit {
                stop_price: dec("2900"),
                limit_price: dec("2890"),
            }
        );
        let stop_at = output.find("Stop Price:").unwrap();
        let limit_at = output.find("Limit Price:").unwrap();
        assert!(stop_at < limit_at);
    }

    #[test]
    fn oco_collects_three_prices_in_order() {
        let mut prompter = prompter("4\nSELL\nbnbusdt\n1.5\n320\n290\n289\n");

        let ticket = prompter.ticket().unwrap();

        assert_eq!(ticket.archetype(), Archetype::Oco);
        assert_eq!(
            ticket.pricing,
            Pricing::Oco {
                limit_price: dec("320"),
                stop_price: dec("290"),
                stop_limit_price: dec("289"),
            }
        );
    }

    #[test]
    fn market_ticket_has_no_price_prompts() {
        let mut prompter = prompter("1\nbuy\nbtcusdt\n0.5\n");

        let ticket = prompter.ticket().unwrap();
        let output = String::from_utf8(prompter.into_output()).unwrap();

        assert_eq!(ticket.pricing, Pricing::Market);
        assert!(!output.contains("Price"));
    }

    #[test]
    fn unknown_selector_stops_before_side() {
        let mut prompter = prompter("9\nbuy\n");

        let error = input_error(prompter.ticket());
        let output = String::from_utf8(prompter.into_output()).unwrap();

        assert_eq!(error, InputError::InvalidOrderType("9".to_string()));
        assert!(!output.contains("Side"));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let error = input_error(prompter("1\nbuy\nbtcusdt\n-1\n").ticket());
        assert_eq!(error, InputError::NonPositive { field: "quantity" });
    }

    #[test]
    fn malformed_price_is_rejected() {
        let error = input_error(prompter("2\nbuy\nbtcusdt\n1\nfifty\n").ticket());
        assert_eq!(
            error,
            InputError::Malformed {
                field: "price",
                input: "fifty".to_string()
            }
        );
    }

    #[test]
    fn invalid_side_is_rejected() {
        let error = input_error(prompter("1\nhold\n").ticket());
        assert_eq!(error, InputError::InvalidSide("hold".to_string()));
    }

    #[test]
    fn closed_input_is_invalid() {
        let error = input_error(prompter("2\nbuy\n").ticket());
        assert_eq!(error, InputError::EndOfInput("symbol"));
    }

    #[test]
    fn credentials_skip_prompts_when_given() {
        let mut prompter = prompter("");

        let credentials = prompter
            .credentials(Some("key".to_string()), Some("secret".to_string()), Network::Testnet)
            .unwrap();

        assert_eq!(credentials.api_key, "key");
        assert!(prompter.into_output().is_empty());
    }

    #[test]
    fn credentials_are_prompted_for_the_network() {
        let mut prompter = prompter("my-key\nmy-secret\n");

        let credentials = prompter.credentials(None, None, Network::Testnet).unwrap();
        let output = String::from_utf8(prompter.into_output()).unwrap();

        assert_eq!(credentials.api_key, "my-key");
        assert_eq!(credentials.api_secret, "my-secret");
        assert!(output.contains("Enter your Binance Testnet API Key: "));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let mut prompter = prompter("\nsecret\n");

        match prompter.credentials(None, None, Network::Live) {
            Err(PromptError::Input(InputError::MissingCredential(field))) => {
                assert_eq!(field, "API key")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
