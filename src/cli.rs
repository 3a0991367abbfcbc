use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "coinpulse",
    about = "realtime websocket channels for the coinpulse crypto dashboard",
    version
)]
pub struct Args {
    /// Base WebSocket URL; each feed connects to <url>/<feed>
    #[arg(short, long, env = "COINPULSE_WS_URL", default_value = "ws://localhost:8080/ws")]
    pub url: String,

    /// Access token sent in AUTH_REQUEST
    #[arg(short, long, env = "COINPULSE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Feeds to mount (homepage, crypto, alerts)
    #[arg(long, value_enum, value_delimiter = ',', default_value = "homepage,alerts")]
    pub feeds: Vec<FeedKind>,

    /// Listing page requested by the homepage feed
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Listings per page
    #[arg(long, default_value = "10")]
    pub page_size: u32,

    /// Asset followed by the crypto feed
    #[arg(long, default_value = "bitcoin")]
    pub crypto_id: String,

    /// Subscribe to the homepage without authenticating
    #[arg(long)]
    pub anonymous_homepage: bool,

    /// Connection timeout in seconds (TCP, TLS and upgrade)
    #[arg(long, default_value = "10")]
    pub connect_timeout: u64,

    /// Maximum number of reconnection attempts after an abnormal close
    #[arg(long, default_value = "3")]
    pub max_reconnects: u32,

    /// Base reconnection delay in milliseconds
    #[arg(long, default_value = "5000")]
    pub reconnect_delay_ms: u64,

    /// Upper bound on the reconnection delay in milliseconds
    #[arg(long, default_value = "10000")]
    pub max_reconnect_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Enable metrics server
    #[arg(long)]
    pub metrics: bool,

    /// Metrics server port
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Disable colored output (useful for piping to files)
    #[arg(long)]
    pub no_color: bool,

    /// Quiet mode - only offline notices, alerts and feed data
    #[arg(long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Homepage,
    Crypto,
    Alerts,
}
