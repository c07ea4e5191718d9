use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::broker::binance::{Endpoints, Network};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Place Binance orders from the terminal", long_about = None)]
pub struct Args {
    /// API key. Prompted for when absent.
    #[arg(long, env = "BINANCE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API secret. Prompted for when absent.
    #[arg(long, env = "BINANCE_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Trade on the live exchange instead of the testnet
    #[arg(long)]
    pub live: bool,

    /// File every order attempt is appended to
    #[arg(long, default_value = "bot.log")]
    pub log_file: PathBuf,

    /// Milliseconds a signed request stays valid
    #[arg(long, default_value_t = 5000)]
    pub recv_window: u64,

    /// HTTP timeout per request, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Override the USD-M futures base URL
    #[arg(long)]
    pub futures_url: Option<String>,

    /// Override the spot base URL
    #[arg(long)]
    pub spot_url: Option<String>,
}

impl Args {
    pub fn network(&self) -> Network {
        if self.live {
            Network::Live
        } else {
            Network::Testnet
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::for_network(self.network());
        if let Some(url) = &self.futures_url {
            endpoints.futures = url.clone();
        }
        if let Some(url) = &self.spot_url {
            endpoints.spot = url.clone();
        }
        endpoints
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
