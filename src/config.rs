use clap::Parser;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;
use crate::engine::{DEFAULT_MAX_RETRIES, DEFAULT_NAMESPACE};

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Server settings, taken from the command line with environment variable fallbacks.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "txdis", version, about)]
pub struct Config {
    /// The port to listen on
    #[arg(short, long, env = "TXDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The address to bind to
    #[arg(short, long, env = "TXDIS_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Keyspace all keys of this server live in
    #[arg(short, long, env = "TXDIS_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Extra attempts after a transaction commit conflict
    #[arg(long, env = "TXDIS_TXN_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub txn_retries: u32,

    /// Largest request frame accepted, in bytes
    #[arg(long, env = "TXDIS_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            txn_retries: DEFAULT_MAX_RETRIES,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl Config {
    pub fn with_port(mut self, port: u16) -> Config {
        self.port = port;
        self
    }
}
