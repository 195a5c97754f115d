//! Command-line / environment configuration of the server binary.

use clap::Parser;

/// Default capacity of each connection's outbound queue
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "tabichat-server")]
#[command(about = "Real-time delivery and presence server for Tabichat", long_about = None)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TABICHAT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TABICHAT_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HS256 secret used to verify session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Capacity of each connection's outbound queue; a connection whose queue fills up is dropped
    #[arg(
        long,
        env = "TABICHAT_OUTBOUND_QUEUE",
        default_value_t = DEFAULT_OUTBOUND_QUEUE_CAPACITY
    )]
    pub outbound_queue_capacity: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "TABICHAT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Settings consumed by the composition root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub outbound_queue_capacity: usize,
    pub log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            outbound_queue_capacity: args.outbound_queue_capacity.max(1),
            log_level: args.log_level,
        }
    }
}

impl ServerConfig {
    /// Parse from the process arguments and environment
    pub fn from_env() -> Self {
        Args::parse().into()
    }
}
