// file: src/visibility.rs
// description: foreground/background signal for the view that owns a channel

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_hidden(self) -> bool {
        self == Visibility::Hidden
    }
}

pub type VisibilitySender = watch::Sender<Visibility>;

pub fn visibility_signal() -> (VisibilitySender, watch::Receiver<Visibility>) {
    watch::channel(Visibility::Visible)
}

/// Turns a visibility watch into a stream of transitions.
#[derive(Debug)]
pub struct VisibilityController {
    signal: Option<watch::Receiver<Visibility>>,
    last: Visibility,
}

impl VisibilityController {
    pub fn new(mut signal: watch::Receiver<Visibility>) -> Self {
        let last = *signal.borrow_and_update();
        Self {
            signal: Some(signal),
            last,
        }
    }

    /// Controller for a host with no visibility concept; always visible.
    pub fn always_visible() -> Self {
        Self {
            signal: None,
            last: Visibility::Visible,
        }
    }

    pub fn current(&self) -> Visibility {
        self.last
    }

    /// Resolves on the next actual change. Never resolves once the sender is gone.
    pub async fn next_transition(&mut self) -> Visibility {
        loop {
            let Some(signal) = self.signal.as_mut() else {
                return std::future::pending().await;
            };
            if signal.changed().await.is_err() {
                self.signal = None;
                continue;
            }
            let next = *signal.borrow_and_update();
            if next != self.last {
                self.last = next;
                return next;
            }
        }
    }
}
