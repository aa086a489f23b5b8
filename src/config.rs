use std::{net::SocketAddr, time::Duration};

use clap::Args;
use tracing::warn;

use crate::lookup::MIN_LATENCY;

/// Settings shared by every subcommand. Each can also come from the environment or `.env`.
#[derive(Clone, Debug, Args)]
pub struct Config {
    /// Address the lookup endpoint listens on
    #[arg(long, env = "ADDRESSBOOK_BIND", default_value = "127.0.0.1:3000", global = true)]
    pub bind: SocketAddr,

    /// Host clients use to reach the lookup endpoint
    #[arg(
        long,
        env = "ADDRESSBOOK_BASE_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub base_url: String,

    /// Artificial lookup delay in milliseconds, never less than 500
    #[arg(long, env = "ADDRESSBOOK_LATENCY_MS", default_value_t = 500, global = true)]
    pub latency_ms: u64,
}

impl Config {
    pub fn latency(&self) -> Duration {
        let latency = Duration::from_millis(self.latency_ms);
        if latency < MIN_LATENCY {
            warn!(
                "latency of {}ms is below the minimum, using {}ms",
                self.latency_ms,
                MIN_LATENCY.as_millis()
            );
            return MIN_LATENCY;
        }
        latency
    }
}
