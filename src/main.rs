use anyhow::Result;
use clap::Parser;
use coinpulse_realtime::{
    cli::Args,
    client::{ChannelDeps, ChannelHandle},
    config::Config,
    credentials::StaticTokenProvider,
    feeds::{alerts, detail, homepage},
    monitoring::setup_metrics,
    sink::TracingErrorSink,
    tracing_setup::setup_tracing,
    transport::TungsteniteConnector,
    ui::{TerminalBell, TerminalNotifier, UIController, UIOptions, UiCommand, parse_command},
    visibility::{Visibility, VisibilityController, visibility_signal},
};
use std::{io::BufRead, sync::Arc, thread};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(&args.log_level, args.json_logs)?;
    info!(
        "Starting coinpulse realtime client v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_args(&args)?;

    if config.metrics.enabled {
        setup_metrics(config.metrics.port).await?;
        info!("Metrics server started on port {}", config.metrics.port);
    }

    let deps = ChannelDeps {
        connector: Arc::new(TungsteniteConnector::new(config.endpoint.connect_timeout)),
        credentials: Arc::new(StaticTokenProvider::new(config.endpoint.token.clone())),
        sink: Arc::new(TracingErrorSink),
    };

    let (visibility_tx, visibility_rx) = visibility_signal();
    let (auth_tx, auth_rx) = watch::channel(config.is_authenticated());
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut ui = UIController::new(UIOptions {
        colored: config.logging.colored,
        quiet: config.logging.quiet,
    });

    let base = &config.endpoint.base_url;
    let mut channels: Vec<ChannelHandle> = Vec::new();
    let mut homepage_channel = None;

    if config.feeds.homepage {
        let settings = homepage::settings(
            base,
            config.feeds.page,
            config.feeds.page_size,
            config.feeds.homepage_auth,
            config.retry,
        )?;
        let (handle, view) = homepage::spawn(
            settings,
            deps.clone(),
            VisibilityController::new(visibility_rx.clone()),
        );
        ui.watch_status(handle.subscribe_status());
        ui.watch_homepage(view);
        homepage_channel = Some(channels.len());
        channels.push(handle);
    }

    if config.feeds.detail {
        let settings = detail::settings(base, &config.feeds.crypto_id, config.retry)?;
        let (handle, view) = detail::spawn(
            settings,
            deps.clone(),
            VisibilityController::new(visibility_rx.clone()),
        );
        ui.watch_status(handle.subscribe_status());
        ui.watch_detail(view);
        channels.push(handle);
    }

    let alert_gate = if config.feeds.alerts {
        let settings = alerts::settings(base, config.retry)?;
        Some(alerts::spawn_alert_gate(
            auth_rx,
            settings,
            deps.clone(),
            Arc::new(TerminalNotifier::new(config.logging.colored)),
            Arc::new(TerminalBell),
            visibility_rx.clone(),
        ))
    } else {
        None
    };

    let ui_task = tokio::spawn(ui.run(stop_rx));

    info!("Client started. Type a command or press Ctrl+C to shutdown...");
    let mut lines = spawn_stdin_reader();
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
        };
        let Some(line) = line else {
            info!("Stdin closed; press Ctrl+C to shutdown");
            tokio::signal::ctrl_c().await?;
            break;
        };

        match parse_command(&line) {
            Some(UiCommand::Hide) => {
                visibility_tx.send_replace(Visibility::Hidden);
            }
            Some(UiCommand::Show) => {
                visibility_tx.send_replace(Visibility::Visible);
            }
            Some(UiCommand::Page(page)) => match homepage_channel {
                Some(index) => {
                    channels[index]
                        .set_intent(homepage::page_intent(page, config.feeds.page_size))?;
                }
                None => warn!("The homepage feed is not mounted"),
            },
            Some(UiCommand::Login) => {
                if config.is_authenticated() {
                    auth_tx.send_replace(true);
                } else {
                    warn!("No access token configured; set --token or COINPULSE_TOKEN");
                }
            }
            Some(UiCommand::Logout) => {
                auth_tx.send_replace(false);
            }
            Some(UiCommand::Reconnect) => {
                for channel in &channels {
                    channel.open()?;
                }
            }
            Some(UiCommand::Quit) => break,
            None if line.trim().is_empty() => {}
            None => warn!("Unknown command: {}", line.trim()),
        }
    }

    for channel in channels {
        let name = channel.name().to_string();
        if let Err(e) = channel.shutdown().await {
            warn!(channel = %name, "Channel did not shut down cleanly: {}", e);
        }
    }

    drop(auth_tx);
    if let Some(gate) = alert_gate {
        gate.await?;
    }

    stop_tx.send_replace(true);
    ui_task.await?;

    info!("Client stopped successfully");
    Ok(())
}

/// Stdin is read on a detached thread so a pending read never holds up exit.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
