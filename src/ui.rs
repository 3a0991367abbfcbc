/// file: src/ui.rs
/// description: terminal dashboard that renders feed views and channel status
use crate::{
    client_state::ChannelStatus,
    error::Result,
    feeds::{detail::DetailView, homepage::HomepageView},
    formatter::{Colors, DashboardFormatter},
    notify::{AlertToast, AudioCue, Notifier},
};
use std::{io::Write, time::Duration};
use tokio::{sync::watch, time::interval};
use tracing::debug;

const RENDER_INTERVAL: Duration = Duration::from_millis(200);

pub struct UIOptions {
    pub colored: bool,
    pub quiet: bool,
}

/// Commands accepted on stdin while the dashboard runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Hide,
    Show,
    Page(u32),
    Login,
    Logout,
    Reconnect,
    Quit,
}

pub fn parse_command(line: &str) -> Option<UiCommand> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_ascii_lowercase();
    match command.as_str() {
        "hide" | "background" => Some(UiCommand::Hide),
        "show" | "foreground" => Some(UiCommand::Show),
        "page" => parts
            .next()
            .and_then(|n| n.parse().ok())
            .filter(|page| *page >= 1)
            .map(UiCommand::Page),
        "login" => Some(UiCommand::Login),
        "logout" => Some(UiCommand::Logout),
        "reconnect" => Some(UiCommand::Reconnect),
        "quit" | "exit" | "q" => Some(UiCommand::Quit),
        _ => None,
    }
}

pub struct UIController {
    formatter: DashboardFormatter,
    quiet_mode: bool,
    statuses: Vec<watch::Receiver<ChannelStatus>>,
    homepage: Option<watch::Receiver<HomepageView>>,
    detail: Option<watch::Receiver<DetailView>>,
}

impl UIController {
    pub fn new(options: UIOptions) -> Self {
        Self {
            formatter: DashboardFormatter::new(options.colored),
            quiet_mode: options.quiet,
            statuses: Vec::new(),
            homepage: None,
            detail: None,
        }
    }

    pub fn watch_status(&mut self, status: watch::Receiver<ChannelStatus>) {
        self.statuses.push(status);
    }

    pub fn watch_homepage(&mut self, view: watch::Receiver<HomepageView>) {
        self.homepage = Some(view);
    }

    pub fn watch_detail(&mut self, view: watch::Receiver<DetailView>) {
        self.detail = Some(view);
    }

    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        self.print_startup_banner();
        let mut ticker = interval(RENDER_INTERVAL);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.render_changes(),
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Dashboard stopped");
    }

    fn render_changes(&mut self) {
        for status in &mut self.statuses {
            if status.has_changed().unwrap_or(false) {
                let status = status.borrow_and_update().clone();
                if !self.quiet_mode || status.is_offline() {
                    println!("{}", self.formatter.format_status(&status));
                }
            }
        }

        if let Some(view) = self.homepage.as_mut()
            && view.has_changed().unwrap_or(false)
        {
            let view = view.borrow_and_update().clone();
            if let Some(market) = &view.market {
                println!("{}", self.formatter.format_market(market));
            }
            if !view.loading {
                println!(
                    "{}",
                    self.formatter
                        .format_listings(&view.listings, view.pagination.as_ref())
                );
            }
        }

        if let Some(view) = self.detail.as_mut()
            && view.has_changed().unwrap_or(false)
        {
            let view = view.borrow_and_update().clone();
            if let Some(asset) = &view.asset {
                println!("{}", self.formatter.format_detail(asset));
            }
        }
    }

    fn print_startup_banner(&self) {
        if self.quiet_mode {
            return;
        }
        println!(
            "{}{}coinpulse realtime v{}{}  {}commands: hide | show | page <n> | login | logout | reconnect | quit{}",
            Colors::BOLD,
            Colors::BRIGHT_CYAN,
            env!("CARGO_PKG_VERSION"),
            Colors::RESET,
            Colors::DIM,
            Colors::RESET
        );
        println!();
    }
}

/// Prints alert toasts to stdout.
pub struct TerminalNotifier {
    formatter: DashboardFormatter,
}

impl TerminalNotifier {
    pub fn new(colored: bool) -> Self {
        Self {
            formatter: DashboardFormatter::new(colored),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, toast: AlertToast) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", self.formatter.format_toast(&toast))?;
        Ok(())
    }
}

/// Rings the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
