// file: src/feeds/alerts.rs
// description: alert feed, a sound plus one toast per alert while the user is authenticated

use crate::{
    backoff::RetryPolicy,
    client::{AuthMode, Channel, ChannelDeps, ChannelHandle, ChannelSettings},
    error::{ChannelError, Result},
    notify::{AlertToast, AudioCue, Notifier},
    router::{FrameHandler, FrameKind, InboundFrame},
    types::AlertPayload,
    visibility::{Visibility, VisibilityController},
};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};
use url::Url;

pub const NAME: &str = "alerts";
pub const ENDPOINT_PATH: &str = "alerts";

pub struct AlertFeed {
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioCue>,
}

impl AlertFeed {
    pub fn new(notifier: Arc<dyn Notifier>, audio: Arc<dyn AudioCue>) -> Self {
        Self { notifier, audio }
    }
}

impl FrameHandler for AlertFeed {
    fn handle(&mut self, frame: InboundFrame) -> Result<()> {
        if frame.kind != FrameKind::Alerts {
            return Err(ChannelError::UnexpectedFrame {
                kind: frame.kind.to_string(),
                channel: NAME.to_string(),
            });
        }

        let alerts = frame.field::<AlertPayload>("alertData")?.into_vec();
        info!(count = alerts.len(), "Alerts received");

        if let Err(e) = self.audio.play() {
            debug!("Alert sound failed: {}", e);
        }

        let mut failures = Vec::new();
        for alert in alerts {
            if let Err(e) = self.notifier.notify(AlertToast::from(alert)) {
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ChannelError::Notification(failures.join("; ")))
        }
    }
}

pub fn settings(base: &Url, retry: RetryPolicy) -> Result<ChannelSettings> {
    Ok(ChannelSettings {
        name: NAME.to_string(),
        endpoint: super::endpoint(base, ENDPOINT_PATH)?,
        auth: AuthMode::Bearer,
        intents: Vec::new(),
        retry,
    })
}

pub fn spawn(
    settings: ChannelSettings,
    deps: ChannelDeps,
    feed: AlertFeed,
    visibility: VisibilityController,
) -> ChannelHandle {
    Channel::spawn(settings, deps, feed, visibility)
}

/// Keeps the alert channel mounted exactly while `authenticated` is true.
/// Aborting the returned task unmounts the channel as well.
pub fn spawn_alert_gate(
    mut authenticated: watch::Receiver<bool>,
    settings: ChannelSettings,
    deps: ChannelDeps,
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioCue>,
    visibility: watch::Receiver<Visibility>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut channel: Option<ChannelHandle> = None;

        loop {
            let is_authenticated = *authenticated.borrow_and_update();
            match (is_authenticated, channel.is_some()) {
                (true, false) => {
                    debug!("Authenticated; mounting alert channel");
                    let feed = AlertFeed::new(Arc::clone(&notifier), Arc::clone(&audio));
                    channel = Some(spawn(
                        settings.clone(),
                        deps.clone(),
                        feed,
                        VisibilityController::new(visibility.clone()),
                    ));
                }
                (false, true) => {
                    debug!("Signed out; unmounting alert channel");
                    if let Some(handle) = channel.take()
                        && let Err(e) = handle.shutdown().await
                    {
                        warn!("Alert channel did not shut down cleanly: {}", e);
                    }
                }
                _ => {}
            }

            if authenticated.changed().await.is_err() {
                break;
            }
        }

        if let Some(handle) = channel.take() {
            let _ = handle.shutdown().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::parse_frame;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: Mutex<Vec<AlertToast>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: AlertToast) -> Result<()> {
            self.toasts.lock().unwrap().push(toast);
            Ok(())
        }
    }

    struct BrokenSpeaker;

    impl AudioCue for BrokenSpeaker {
        fn play(&self) -> Result<()> {
            Err(ChannelError::Notification("no audio device".into()))
        }
    }

    const ALERT: &str = r#"{"alertId":1,"cryptoName":"Bitcoin","thresholdValue":60000,"alertCondition":"PRICE_ABOVE","currentPrice":60100}"#;

    #[test]
    fn audio_failure_does_not_block_toasts() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut feed = AlertFeed::new(notifier.clone(), Arc::new(BrokenSpeaker));

        let frame = parse_frame(&format!(r#"{{"type":"ALERTS","alertData":{}}}"#, ALERT)).unwrap();
        feed.handle(frame).unwrap();

        assert_eq!(notifier.toasts.lock().unwrap().len(), 1);
    }

    #[test]
    fn array_payload_yields_one_toast_per_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut feed = AlertFeed::new(notifier.clone(), Arc::new(crate::notify::Silent));

        let frame = parse_frame(&format!(
            r#"{{"type":"ALERTS","alertData":[{},{},{},{}]}}"#,
            ALERT, ALERT, ALERT, ALERT
        ))
        .unwrap();
        feed.handle(frame).unwrap();

        assert_eq!(notifier.toasts.lock().unwrap().len(), 4);
    }

    #[test]
    fn market_data_is_unexpected_on_alert_feed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut feed = AlertFeed::new(notifier, Arc::new(crate::notify::Silent));
        let frame = parse_frame(r#"{"type":"MARKET_DATA","data":{}}"#).unwrap();
        assert!(matches!(
            feed.handle(frame),
            Err(ChannelError::UnexpectedFrame { .. })
        ));
    }
}
