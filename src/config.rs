/// file: src/config.rs
/// description: typed runtime configuration built from the command line
use crate::{
    backoff::RetryPolicy,
    cli::{Args, FeedKind},
    client::AuthMode,
    error::{ChannelError, Result},
};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub retry: RetryPolicy,
    pub feeds: FeedConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub homepage: bool,
    pub detail: bool,
    pub alerts: bool,
    pub page: u32,
    pub page_size: u32,
    pub crypto_id: String,
    pub homepage_auth: AuthMode,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub colored: bool,
    pub quiet: bool,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let base_url = Url::parse(&args.url)?;
        if !matches!(base_url.scheme(), "ws" | "wss") {
            return Err(ChannelError::InvalidConfig(format!(
                "expected a ws:// or wss:// url, got {}",
                base_url
            )));
        }

        if args.feeds.is_empty() {
            return Err(ChannelError::InvalidConfig("no feeds selected".into()));
        }
        if args.page == 0 || args.page_size == 0 {
            return Err(ChannelError::InvalidConfig(
                "page and page size must be at least 1".into(),
            ));
        }
        let detail = args.feeds.contains(&FeedKind::Crypto);
        if detail && args.crypto_id.trim().is_empty() {
            return Err(ChannelError::InvalidConfig(
                "the crypto feed needs a --crypto-id".into(),
            ));
        }
        if args.connect_timeout == 0 {
            return Err(ChannelError::InvalidConfig(
                "connect timeout must be at least 1 second".into(),
            ));
        }
        if args.reconnect_delay_ms > args.max_reconnect_delay_ms {
            return Err(ChannelError::InvalidConfig(format!(
                "reconnect delay {}ms exceeds the {}ms cap",
                args.reconnect_delay_ms, args.max_reconnect_delay_ms
            )));
        }

        let token = args
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(Config {
            endpoint: EndpointConfig {
                base_url,
                token,
                connect_timeout: Duration::from_secs(args.connect_timeout),
            },
            retry: RetryPolicy {
                max_retries: args.max_reconnects,
                base_delay: Duration::from_millis(args.reconnect_delay_ms),
                max_delay: Duration::from_millis(args.max_reconnect_delay_ms),
            },
            feeds: FeedConfig {
                homepage: args.feeds.contains(&FeedKind::Homepage),
                detail,
                alerts: args.feeds.contains(&FeedKind::Alerts),
                page: args.page,
                page_size: args.page_size,
                crypto_id: args.crypto_id.trim().to_string(),
                homepage_auth: if args.anonymous_homepage {
                    AuthMode::Anonymous
                } else {
                    AuthMode::Bearer
                },
            },
            metrics: MetricsConfig {
                enabled: args.metrics,
                port: args.metrics_port,
            },
            logging: LoggingConfig {
                colored: !args.no_color,
                quiet: args.quiet,
            },
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.endpoint.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["coinpulse"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_dashboard_policy() {
        let config = Config::from_args(&parse(&["--url", "ws://localhost:8080/ws"])).unwrap();
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.feeds.homepage);
        assert!(config.feeds.alerts);
        assert!(!config.feeds.detail);
        assert_eq!(config.feeds.page, 1);
        assert_eq!(config.feeds.page_size, 10);
        assert_eq!(config.feeds.homepage_auth, AuthMode::Bearer);
        assert_eq!(config.endpoint.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let err = Config::from_args(&parse(&[
            "--url",
            "ws://localhost:8080/ws",
            "--connect-timeout",
            "0",
        ]))
        .unwrap_err();
        assert!(matches!(err, ChannelError::InvalidConfig(_)));
    }

    #[test]
    fn feed_list_is_comma_separated() {
        let config = Config::from_args(&parse(&[
            "--url",
            "wss://api.example.com/ws",
            "--feeds",
            "crypto",
            "--crypto-id",
            "ethereum",
            "--anonymous-homepage",
        ]))
        .unwrap();
        assert!(config.feeds.detail);
        assert!(!config.feeds.homepage);
        assert_eq!(config.feeds.crypto_id, "ethereum");
        assert_eq!(config.feeds.homepage_auth, AuthMode::Anonymous);
    }

    #[test]
    fn unknown_feed_is_rejected() {
        assert!(Args::try_parse_from(["coinpulse", "--feeds", "homepage,news"]).is_err());
    }

    #[test]
    fn non_websocket_url_is_rejected() {
        let err = Config::from_args(&parse(&["--url", "https://example.com"])).unwrap_err();
        assert!(matches!(err, ChannelError::InvalidConfig(_)));

        let err = Config::from_args(&parse(&["--url", "not a url"])).unwrap_err();
        assert!(matches!(err, ChannelError::UrlError(_)));
    }

    #[test]
    fn blank_token_means_signed_out() {
        let config =
            Config::from_args(&parse(&["--url", "ws://localhost/ws", "--token", "  "])).unwrap();
        assert!(!config.is_authenticated());
    }
}
