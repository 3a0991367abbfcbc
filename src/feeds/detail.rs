// file: src/feeds/detail.rs
// description: asset detail feed with live data for a single cryptocurrency

use crate::{
    backoff::RetryPolicy,
    client::{AuthMode, Channel, ChannelDeps, ChannelHandle, ChannelSettings},
    client_state::TerminalFailure,
    error::{ChannelError, Result},
    intent::SubscriptionIntent,
    router::{FrameHandler, FrameKind, InboundFrame},
    types::CryptoDetail,
    visibility::VisibilityController,
};
use tokio::sync::watch;
use url::Url;

pub const NAME: &str = "crypto";
pub const ENDPOINT_PATH: &str = "crypto";

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub asset: Option<CryptoDetail>,
    pub loading: bool,
}

impl Default for DetailView {
    fn default() -> Self {
        Self {
            asset: None,
            loading: true,
        }
    }
}

pub struct DetailFeed {
    view: watch::Sender<DetailView>,
}

impl DetailFeed {
    pub fn new() -> (Self, watch::Receiver<DetailView>) {
        let (view, rx) = watch::channel(DetailView::default());
        (Self { view }, rx)
    }
}

impl FrameHandler for DetailFeed {
    fn handle(&mut self, frame: InboundFrame) -> Result<()> {
        match frame.kind {
            FrameKind::CryptoData => {
                let asset: CryptoDetail = frame.field("cryptoData")?;
                self.view.send_modify(|view| {
                    view.asset = Some(asset);
                    view.loading = false;
                });
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

pub fn settings(base: &Url, crypto_id: &str, retry: RetryPolicy) -> Result<ChannelSettings> {
    Ok(ChannelSettings {
        name: NAME.to_string(),
        endpoint: super::endpoint(base, ENDPOINT_PATH)?,
        auth: AuthMode::Bearer,
        intents: vec![SubscriptionIntent::Crypto {
            crypto_id: crypto_id.to_string(),
        }],
        retry,
    })
}

pub fn spawn(
    settings: ChannelSettings,
    deps: ChannelDeps,
    visibility: VisibilityController,
) -> (ChannelHandle, watch::Receiver<DetailView>) {
    let (feed, view) = DetailFeed::new();
    (Channel::spawn(settings, deps, feed, visibility), view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::parse_frame;

    #[test]
    fn detail_frame_uses_crypto_data_field() {
        let (mut feed, view) = DetailFeed::new();
        let frame = parse_frame(
            r#"{"type":"CRYPTO_DATA","cryptoData":{"id":"ethereum","symbol":"eth","name":"Ethereum","current_price":3050.25,"high_24h":3100.0,"low_24h":2990.0}}"#,
        )
        .unwrap();
        feed.handle(frame).unwrap();

        let view = view.borrow();
        let asset = view.asset.as_ref().unwrap();
        assert_eq!(asset.id, "ethereum");
        assert_eq!(asset.high_24h, 3100.0);
        assert!(!view.loading);
    }

    #[test]
    fn homepage_shaped_payload_is_malformed() {
        let (mut feed, view) = DetailFeed::new();
        let frame =
            parse_frame(r#"{"type":"CRYPTO_DATA","data":{"cryptoList":[],"pagination":{}}}"#)
                .unwrap();
        assert!(matches!(
            feed.handle(frame),
            Err(ChannelError::MalformedFrame { .. })
        ));
        assert!(view.borrow().asset.is_none());
    }

    #[test]
    fn settings_target_the_crypto_endpoint() {
        let base = Url::parse("ws://localhost:8080/ws").unwrap();
        let settings = settings(&base, "bitcoin", RetryPolicy::default()).unwrap();
        assert_eq!(settings.endpoint.as_str(), "ws://localhost:8080/ws/crypto");
        assert_eq!(
            settings.intents,
            vec![SubscriptionIntent::Crypto {
                crypto_id: "bitcoin".into()
            }]
        );
    }
}
