// file: src/feeds/homepage.rs
// description: homepage feed with one page of listings plus the market summary

use crate::{
    backoff::RetryPolicy,
    client::{AuthMode, Channel, ChannelDeps, ChannelHandle, ChannelSettings},
    client_state::TerminalFailure,
    error::{ChannelError, Result},
    intent::SubscriptionIntent,
    router::{FrameHandler, FrameKind, InboundFrame},
    types::{CryptoListing, CryptoPage, MarketSummary, Pagination},
    visibility::VisibilityController,
};
use tokio::sync::watch;
use tracing::debug;
use url::Url;

pub const NAME: &str = "homepage";
pub const ENDPOINT_PATH: &str = "homepage";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct HomepageView {
    pub listings: Vec<CryptoListing>,
    pub pagination: Option<Pagination>,
    pub market: Option<MarketSummary>,
    pub loading: bool,
}

impl Default for HomepageView {
    fn default() -> Self {
        Self {
            listings: Vec::new(),
            pagination: None,
            market: None,
            loading: true,
        }
    }
}

pub struct HomepageFeed {
    view: watch::Sender<HomepageView>,
}

impl HomepageFeed {
    pub fn new() -> (Self, watch::Receiver<HomepageView>) {
        let (view, rx) = watch::channel(HomepageView::default());
        (Self { view }, rx)
    }
}

impl FrameHandler for HomepageFeed {
    fn handle(&mut self, frame: InboundFrame) -> Result<()> {
        match frame.kind {
            FrameKind::CryptoData => {
                let page: CryptoPage = frame.field("data")?;
                debug!(
                    listings = page.crypto_list.len(),
                    page = page.pagination.page,
                    "Listing page received"
                );
                self.view.send_modify(|view| {
                    view.listings = page.crypto_list;
                    view.pagination = Some(page.pagination);
                    view.loading = false;
                });
                Ok(())
            }
            FrameKind::MarketData => {
                let market: MarketSummary = frame.field("data")?;
                self.view.send_modify(|view| view.market = Some(market));
                Ok(())
            }
            other => Err(ChannelError::UnexpectedFrame {
                kind: other.to_string(),
                channel: NAME.to_string(),
            }),
        }
    }

    fn on_terminal(&mut self, _failure: TerminalFailure) {
        self.view.send_modify(|view| view.loading = false);
    }
}

pub fn page_intent(page: u32, size: u32) -> SubscriptionIntent {
    SubscriptionIntent::CryptoPage { page, size }
}

pub fn settings(
    base: &Url,
    page: u32,
    size: u32,
    auth: AuthMode,
    retry: RetryPolicy,
) -> Result<ChannelSettings> {
    Ok(ChannelSettings {
        name: NAME.to_string(),
        endpoint: super::endpoint(base, ENDPOINT_PATH)?,
        auth,
        intents: vec![page_intent(page, size), SubscriptionIntent::MarketData],
        retry,
    })
}

pub fn spawn(
    settings: ChannelSettings,
    deps: ChannelDeps,
    visibility: VisibilityController,
) -> (ChannelHandle, watch::Receiver<HomepageView>) {
    let (feed, view) = HomepageFeed::new();
    (Channel::spawn(settings, deps, feed, visibility), view)
}
