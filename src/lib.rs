//! Realtime WebSocket channels for the coinpulse crypto dashboard.
//!
//! Each feed (homepage listings, asset detail, alerts) runs as a [`client::Channel`]:
//! a single task that owns its socket, authenticates, re-declares its
//! subscriptions on every connect, retries abnormal closes on a bounded
//! schedule and releases the socket while the dashboard is hidden.

/// Reconnect budget and delay schedule.
pub mod backoff;
/// Command-line argument definitions.
pub mod cli;
/// Channel actor and its public handle.
pub mod client;
/// Connection state machine and channel status.
pub mod client_state;
/// Runtime configuration model.
pub mod config;
/// Access token providers.
pub mod credentials;
/// Error types used across the crate.
pub mod error;
/// Ordered per-channel event queue.
pub mod events;
/// Homepage, asset detail and alert feeds.
pub mod feeds;
/// Terminal output formatters.
pub mod formatter;
/// Subscription intents.
pub mod intent;
/// Metrics counters and the Prometheus exporter.
pub mod monitoring;
/// Alert toasts and sound cues.
pub mod notify;
/// Inbound frame parsing and dispatch.
pub mod router;
/// Error reporting sink.
pub mod sink;
/// Tracing/logging initialization.
pub mod tracing_setup;
/// WebSocket transport seam.
pub mod transport;
/// Wire frames and payload models.
pub mod types;
/// Terminal dashboard controller.
pub mod ui;
/// Foreground/background signal.
pub mod visibility;

/// Primary crate error type.
pub use error::ChannelError;
