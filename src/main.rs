use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::debug;

use crate::args::Args;
use crate::broker::binance::Credentials;
use crate::broker::{BinanceClient, InputError, OrderResult, OrderSubmitter};
use crate::journal::OrderJournal;
use crate::prompt::{PromptError, Prompter};

mod args;
mod broker;
mod journal;
mod prompt;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut journal = OrderJournal::open(&args.log_file)?;
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let network = args.network();

    let credentials =
        match prompter.credentials(args.api_key.clone(), args.api_secret.clone(), network) {
            Ok(credentials) => credentials,
            Err(e) => return abort(&mut prompter, e),
        };

    let client = match connect(&mut prompter, &mut journal, credentials, &args).await? {
        ControlFlow::Continue(client) => client,
        ControlFlow::Break(code) => return Ok(code),
    };

    let ticket = match prompter.ticket() {
        Ok(ticket) => ticket,
        Err(e) => return abort(&mut prompter, e),
    };
    debug!("Submitting {} order: {:?}", ticket.archetype().label(), ticket);

    let mut submitter = OrderSubmitter::new(client, journal);
    match submitter.submit_ticket(&ticket).await {
        Ok(result) => report(&mut prompter, result, submitter.last_failure())?,
        Err(e) => return abort(&mut prompter, e.into()),
    }

    Ok(ExitCode::SUCCESS)
}

/// A failed connection is journaled and shown, and ends the session with status 1.
async fn connect<R: BufRead, W: Write, L: Write>(
    prompter: &mut Prompter<R, W>,
    journal: &mut OrderJournal<L>,
    credentials: Credentials,
    args: &Args,
) -> io::Result<ControlFlow<ExitCode, BinanceClient>> {
    let connected =
        BinanceClient::connect(credentials, args.endpoints(), args.recv_window, args.timeout())
            .await;

    match connected {
        Ok(client) => {
            journal.info(&format!("Connected to Binance {}", args.network()));
            Ok(ControlFlow::Continue(client))
        }
        Err(e) => {
            journal.error(&e.to_string());
            prompter.say(&e.to_string())?;
            Ok(ControlFlow::Break(ExitCode::FAILURE))
        }
    }
}

fn report<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    result: Option<OrderResult>,
    failure: Option<&str>,
) -> io::Result<()> {
    match result {
        Some(result) => {
            let ids: Vec<String> = result
                .confirmations()
                .iter()
                .map(|c| c.order_id.to_string())
                .collect();
            prompter.say("Order placed successfully!")?;
            prompter.say(&result.to_string())?;
            prompter.say(&format!("Exchange order id(s): {}", ids.join(", ")))
        }
        None => {
            if let Some(reason) = failure {
                prompter.say(reason)?;
            }
            prompter.say("Order failed. Check logs for details.")
        }
    }
}

/// Bad operator input ends the session normally; terminal failures do not.
fn abort<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    error: PromptError,
) -> Result<ExitCode> {
    match error {
        PromptError::Input(e) => {
            prompter.say(&input_message(&e))?;
            prompter.say("Invalid input. Exiting.")?;
            Ok(ExitCode::SUCCESS)
        }
        PromptError::Io(e) => Err(e.into()),
    }
}

fn input_message(error: &InputError) -> String {
    match error {
        InputError::InvalidOrderType(_) => "Invalid order type.".to_string(),
        InputError::InvalidSide(_) => "Invalid side.".to_string(),
        other => format!("{}.", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::client::OrderConfirmation;
    use serde_json::Map;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_output()).unwrap()
    }

    // Compared through the debug form, which carries the raw status.
    fn assert_exit(code: ExitCode, expected: ExitCode) {
        assert_eq!(format!("{:?}", code), format!("{:?}", expected));
    }

    #[tokio::test]
    async fn connection_failure_is_journaled_and_exits_with_failure() {
        let args = Args::try_parse_from([
            "ordertool",
            "--futures-url",
            "http://127.0.0.1:1",
            "--timeout-secs",
            "2",
        ])
        .unwrap();
        let credentials = Credentials {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        };
        let mut prompter = prompter("");
        let mut journal = OrderJournal::new(Vec::new());

        let flow = connect(&mut prompter, &mut journal, credentials, &args)
            .await
            .unwrap();

        match flow {
            ControlFlow::Break(code) => assert_exit(code, ExitCode::FAILURE),
            ControlFlow::Continue(_) => panic!("connected to a closed port"),
        }
        let journal = String::from_utf8(journal.into_inner()).unwrap();
        assert!(journal.contains(" - ERROR - Error connecting to Binance: "));
        assert!(output(prompter).starts_with("Error connecting to Binance: "));
    }

    #[test]
    fn invalid_input_exits_normally() {
        let mut prompter = prompter("");

        let code = abort(
            &mut prompter,
            InputError::InvalidOrderType("9".to_string()).into(),
        )
        .unwrap();

        assert_exit(code, ExitCode::SUCCESS);
        assert_eq!(output(prompter), "Invalid order type.\nInvalid input. Exiting.\n");
    }

    #[test]
    fn closed_terminal_is_an_error() {
        let mut prompter = prompter("");
        let error = io::Error::new(io::ErrorKind::BrokenPipe, "closed");

        assert!(abort(&mut prompter, error.into()).is_err());
    }

    #[test]
    fn failed_order_shows_the_exchange_reason() {
        let mut prompter = prompter("");

        report(
            &mut prompter,
            None,
            Some("API Error (HTTP 400, code -2010): Account has insufficient balance."),
        )
        .unwrap();

        assert_eq!(
            output(prompter),
            "API Error (HTTP 400, code -2010): Account has insufficient balance.\n\
             Order failed. Check logs for details.\n"
        );
    }

    #[test]
    fn placed_order_lists_exchange_ids() {
        let mut prompter = prompter("");
        let confirmation = |order_id| OrderConfirmation {
            order_id,
            symbol: "BNBUSDT".to_string(),
            status: Some("NEW".to_string()),
            client_order_id: None,
            echoed: Map::new(),
        };
        let result = OrderResult::Oco {
            limit_order: confirmation(11),
            stop_limit_order: confirmation(12),
        };

        report(&mut prompter, Some(result), None).unwrap();

        let output = output(prompter);
        assert!(output.starts_with("Order placed successfully!\n"));
        assert!(output.contains("\"orderId\": 11"));
        assert!(output.ends_with("Exchange order id(s): 11, 12\n"));
    }
}
