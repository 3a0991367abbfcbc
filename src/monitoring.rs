use crate::{error::ChannelError, sink::EventType};
use anyhow::Result;
use metrics::{Counter, counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, sync::LazyLock};
use tracing::{error, info};

// Global metrics
pub static FRAMES_RECEIVED_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coinpulse_frames_received_total"));
pub static RECONNECT_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coinpulse_reconnects_total"));
pub static TERMINAL_FAILURE_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coinpulse_terminal_failures_total"));

pub fn record_channel_error(channel: &str, event_type: EventType) {
    counter!(
        "coinpulse_channel_errors_total",
        "channel" => channel.to_string(),
        "event_type" => event_type.as_str()
    )
    .increment(1);
}

pub fn set_channel_subscribed(channel: &str, subscribed: bool) {
    gauge!("coinpulse_channels_subscribed", "channel" => channel.to_string())
        .set(if subscribed { 1.0 } else { 0.0 });
}

pub async fn setup_metrics(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", "coinpulse-realtime")
        .add_global_label("version", env!("CARGO_PKG_VERSION"));

    match builder.install() {
        Ok(_) => {
            info!(
                "Prometheus metrics server started on http://{}/metrics",
                addr
            );

            FRAMES_RECEIVED_COUNTER.absolute(0);
            RECONNECT_COUNTER.absolute(0);
            TERMINAL_FAILURE_COUNTER.absolute(0);

            Ok(())
        }
        Err(e) => {
            error!("Failed to start metrics server: {}", e);
            Err(ChannelError::MetricsError(e.to_string()).into())
        }
    }
}
