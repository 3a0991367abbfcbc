// file: src/client.rs
// description: realtime channel: connection supervision, auth handshake, topic declaration and routing
// reference: https://developer.mozilla.org/en-US/docs/Web/API/WebSocket/close_event

use crate::{
    backoff::{RetryDecision, RetryPolicy},
    client_state::{ChannelStatus, ConnectionState, TerminalFailure},
    credentials::TokenProvider,
    error::{ChannelError, Result},
    events::{
        ChannelCommand, ChannelEvent, EventReceiver, EventSender, HandleId, TimerId,
        TransportEvent, TransportEvents, create_event_channel,
    },
    intent::{IntentSet, SubscriptionIntent},
    monitoring,
    router::{self, Dispatch, FrameHandler},
    sink::{ErrorContext, ErrorSink, EventType},
    transport::{Connection, Connector},
    types::ClientFrame,
    visibility::{Visibility, VisibilityController},
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{Instrument, debug, error, info, info_span, trace, warn};
use url::Url;

/// Close reason the server uses to reject a credential. Never retried.
pub const UNAUTHORIZED_REASON: &str = "Unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Send `AUTH_REQUEST` on open and wait for `AUTH_SUCCESS`.
    #[default]
    Bearer,
    /// Public feed; usable as soon as the socket opens.
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub name: String,
    pub endpoint: Url,
    pub auth: AuthMode,
    pub intents: Vec<SubscriptionIntent>,
    pub retry: RetryPolicy,
}

/// External collaborators shared by every channel.
#[derive(Clone)]
pub struct ChannelDeps {
    pub connector: Arc<dyn Connector>,
    pub credentials: Arc<dyn TokenProvider>,
    pub sink: Arc<dyn ErrorSink>,
}

struct ActiveHandle {
    id: HandleId,
    connection: Box<dyn Connection>,
    credential_task: Option<JoinHandle<()>>,
}

impl Drop for ActiveHandle {
    fn drop(&mut self) {
        if let Some(task) = self.credential_task.take() {
            task.abort();
        }
        self.connection.close();
    }
}

struct PendingRetry {
    id: TimerId,
    task: JoinHandle<()>,
}

impl Drop for PendingRetry {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One independently supervised realtime connection. Runs as a single task
/// that drains an ordered event queue; see [`Channel::spawn`].
pub struct Channel<H: FrameHandler> {
    settings: ChannelSettings,
    deps: ChannelDeps,
    handler: H,
    intents: IntentSet,
    status: ChannelStatus,
    status_tx: watch::Sender<ChannelStatus>,
    events_tx: EventSender,
    events_rx: EventReceiver,
    visibility: VisibilityController,
    handle: Option<ActiveHandle>,
    retry_timer: Option<PendingRetry>,
    next_handle: u64,
    next_timer: u64,
}

impl<H: FrameHandler> Channel<H> {
    /// Mounts the channel: spawns its event loop and opens the connection
    /// unless the view starts in the background.
    pub fn spawn(
        settings: ChannelSettings,
        deps: ChannelDeps,
        handler: H,
        visibility: VisibilityController,
    ) -> ChannelHandle {
        let (events_tx, events_rx) = create_event_channel();
        let status = ChannelStatus::new(settings.name.clone());
        let (status_tx, status_rx) = watch::channel(status.clone());
        let name = settings.name.clone();

        let channel = Channel {
            intents: IntentSet::new(settings.intents.clone()),
            settings,
            deps,
            handler,
            status,
            status_tx,
            events_tx: events_tx.clone(),
            events_rx,
            visibility,
            handle: None,
            retry_timer: None,
            next_handle: 0,
            next_timer: 0,
        };

        let span = info_span!("channel", name = %name);
        let task = tokio::spawn(channel.run().instrument(span));

        ChannelHandle {
            name,
            commands: events_tx,
            status: status_rx,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        info!(endpoint = %self.settings.endpoint, "Channel mounted");

        if self.visibility.current().is_hidden() {
            debug!("Mounted in background; waiting for foreground");
        } else {
            self.open();
        }
        self.publish_status();

        loop {
            let keep_running = tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => false,
                },
                visibility = self.visibility.next_transition() => {
                    self.on_visibility(visibility);
                    true
                }
            };
            self.publish_status();
            if !keep_running {
                break;
            }
        }

        self.close();
        self.publish_status();
        info!("Channel unmounted");
    }

    fn handle_event(&mut self, event: ChannelEvent) -> bool {
        match event {
            ChannelEvent::Command(command) => match command {
                ChannelCommand::Open => self.reopen(),
                ChannelCommand::SetIntent(intent) => self.set_intent(intent),
                ChannelCommand::Shutdown => {
                    self.close();
                    return false;
                }
            },
            ChannelEvent::Transport { handle, event } => self.on_transport(handle, event),
            ChannelEvent::Credential { handle, result } => self.on_credential(handle, result),
            ChannelEvent::RetryDue(timer) => self.on_retry_due(timer),
        }
        true
    }

    // Connection supervision

    fn open(&mut self) {
        if self.status.state.is_open_equivalent() {
            debug!(state = %self.status.state, "Channel already open. Skipping reconnection.");
            return;
        }

        self.cancel_retry();
        self.handle = None;
        if !self.transition(ConnectionState::Connecting) {
            return;
        }

        self.next_handle += 1;
        let id = HandleId(self.next_handle);
        let events = TransportEvents::new(id, self.events_tx.clone());
        let connection = self.deps.connector.connect(&self.settings.endpoint, events);

        info!(handle = %id, "Connecting to {}", self.settings.endpoint);
        self.handle = Some(ActiveHandle {
            id,
            connection,
            credential_task: None,
        });
    }

    /// Explicit open requested by the host: clears any terminal failure and
    /// grants a fresh retry budget.
    fn reopen(&mut self) {
        if self.status.state.is_open_equivalent() {
            debug!("Open requested while already open");
            return;
        }
        self.status.terminal = None;
        self.status.retry_count = 0;
        self.open();
    }

    /// Releases the pending timer and the live handle. Safe on every path.
    fn close(&mut self) {
        self.cancel_retry();
        if let Some(handle) = self.handle.take() {
            self.transition(ConnectionState::Closing);
            debug!(handle = %handle.id, "Closing connection");
            drop(handle);
            self.transition(ConnectionState::Closed);
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.retry_timer.take() {
            debug!(timer = timer.id.0, "Cancelled pending reconnect");
        }
    }

    fn transition(&mut self, next: ConnectionState) -> bool {
        let current = self.status.state;
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Refusing illegal state transition");
            return false;
        }

        trace!(from = %current, to = %next, "State transition");
        self.status.state = next;
        if next == ConnectionState::Closed {
            self.status.disconnect();
        }
        monitoring::set_channel_subscribed(&self.settings.name, next == ConnectionState::Subscribed);
        true
    }

    fn current_handle(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|h| h.id)
    }

    fn on_transport(&mut self, handle: HandleId, event: TransportEvent) {
        if self.current_handle() != Some(handle) {
            // Closed deliberately or replaced; this handle no longer speaks for the channel.
            trace!(%handle, event = event.name(), "Ignoring event from released handle");
            return;
        }

        match event {
            TransportEvent::Opened => self.on_opened(),
            TransportEvent::Message(text) => self.on_message(text),
            TransportEvent::Closed { reason } => self.on_closed(reason),
            TransportEvent::Error(message) => {
                warn!(%handle, "Transport error: {}", message);
                self.report(ChannelError::Transport(message), self.context(EventType::WsError));
            }
        }
    }

    fn on_opened(&mut self) {
        if self.status.state != ConnectionState::Connecting {
            warn!(state = %self.status.state, "Unexpected open event");
            return;
        }

        self.status.reset_connection();
        info!(
            connection_id = self.status.connection_id.as_deref().unwrap_or_default(),
            "WebSocket connection established"
        );

        match self.settings.auth {
            AuthMode::Bearer => {
                if self.transition(ConnectionState::Authenticating) {
                    self.start_handshake();
                }
            }
            AuthMode::Anonymous => {
                if self.transition(ConnectionState::Subscribed) {
                    self.declare_intents();
                }
            }
        }
    }

    fn on_closed(&mut self, reason: String) {
        info!(
            reason = if reason.is_empty() { "No reason provided" } else { reason.as_str() },
            "WebSocket connection closed"
        );
        self.handle = None;
        self.transition(ConnectionState::Closed);

        if reason == UNAUTHORIZED_REASON {
            warn!("Authentication failed - will not retry");
            let context = self.context(EventType::WsClose).with_reason(reason);
            self.fail(TerminalFailure::Unauthorized, ChannelError::Unauthorized, context);
            return;
        }

        let retry_count = self.status.retry_count;
        match self.settings.retry.decide(retry_count) {
            RetryDecision::Retry { delay } => {
                self.schedule_retry(delay);
                self.status.retry_count += 1;
                monitoring::RECONNECT_COUNTER.increment(1);
                warn!(
                    attempt = self.status.retry_count,
                    "Reconnecting in {} ms",
                    delay.as_millis()
                );
            }
            RetryDecision::Exhausted => {
                error!(attempts = retry_count, "Max reconnect attempts reached");
                let context = self.context(EventType::WsReconnectFail);
                self.fail(
                    TerminalFailure::RetriesExhausted {
                        attempts: retry_count,
                    },
                    ChannelError::MaxReconnectsExceeded {
                        attempts: retry_count,
                    },
                    context,
                );
            }
        }
    }

    fn schedule_retry(&mut self, delay: Duration) {
        self.cancel_retry();
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        let events = self.events_tx.clone();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let _ = events.send(ChannelEvent::RetryDue(id));
        });
        self.retry_timer = Some(PendingRetry { id, task });
    }

    fn on_retry_due(&mut self, timer: TimerId) {
        match self.retry_timer.take() {
            Some(pending) if pending.id == timer => {
                debug!(attempt = self.status.retry_count, "Reconnect timer fired");
                self.open();
            }
            other => {
                trace!(timer = timer.0, "Ignoring stale reconnect timer");
                self.retry_timer = other;
            }
        }
    }

    fn fail(&mut self, failure: TerminalFailure, err: ChannelError, context: ErrorContext) {
        debug_assert!(err.is_terminal());
        self.status.terminal = Some(failure);
        monitoring::TERMINAL_FAILURE_COUNTER.increment(1);
        self.handler.on_terminal(failure);
        self.report(err, context);
    }

    // Auth handshake

    fn start_handshake(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let id = handle.id;
        let provider = Arc::clone(&self.deps.credentials);
        let events = self.events_tx.clone();
        debug!(handle = %id, "Fetching access token");

        handle.credential_task = Some(tokio::spawn(async move {
            let result = provider.access_token().await;
            let _ = events.send(ChannelEvent::Credential { handle: id, result });
        }));
    }

    fn on_credential(&mut self, handle: HandleId, result: Result<String>) {
        if self.current_handle() != Some(handle)
            || self.status.state != ConnectionState::Authenticating
        {
            trace!(%handle, "Discarding credential for a handle that moved on");
            return;
        }

        if let Some(active) = self.handle.as_mut() {
            active.credential_task = None;
        }

        match result {
            Ok(token) => {
                if let Err(e) = self.send_frame(&ClientFrame::AuthRequest { token }) {
                    self.report(e, self.context(EventType::AuthRequest));
                }
            }
            Err(e) => {
                error!("Failed to get access token for WebSocket auth: {}", e);
                self.report(e, self.context(EventType::AuthRequest));
            }
        }
    }

    fn on_auth_success(&mut self) {
        match self.status.state {
            ConnectionState::Authenticating => {
                info!("Authentication successful");
                if self.transition(ConnectionState::Subscribed) {
                    self.declare_intents();
                }
            }
            ConnectionState::Subscribed => debug!("Duplicate AUTH_SUCCESS ignored"),
            state => warn!(%state, "AUTH_SUCCESS outside of handshake ignored"),
        }
    }

    // Topic subscription

    fn declare_intents(&mut self) {
        let frames = self.intents.frames();
        for frame in &frames {
            if let Err(e) = self.send_frame(frame) {
                self.report(e, self.context(EventType::WsError));
            }
        }
        if !frames.is_empty() {
            info!(count = frames.len(), "Declared subscriptions");
        }
    }

    fn set_intent(&mut self, intent: SubscriptionIntent) {
        let frame = intent.to_frame();
        if !self.intents.upsert(intent) {
            debug!(kind = frame.kind(), "Subscription unchanged");
            return;
        }

        if self.status.is_usable() {
            if let Err(e) = self.send_frame(&frame) {
                self.report(e, self.context(EventType::WsError));
            }
        } else {
            debug!(kind = frame.kind(), "Subscription queued until handshake completes");
        }
    }

    fn send_frame(&mut self, frame: &ClientFrame) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(ChannelError::NotConnected)?;
        let text = frame.to_text()?;
        handle.connection.send(text)?;
        debug!(handle = %handle.id, kind = frame.kind(), "Sent frame");
        Ok(())
    }

    // Message routing

    fn on_message(&mut self, text: String) {
        self.status.record_message();
        monitoring::FRAMES_RECEIVED_COUNTER.increment(1);

        let frame = match router::parse_frame(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Invalid WebSocket message: {}", e);
                self.report_frame_error(e, &text);
                return;
            }
        };

        match router::route(frame) {
            Dispatch::Handshake => self.on_auth_success(),
            Dispatch::ServerError(message) => {
                warn!("Server error frame: {}", message);
                self.report_frame_error(ChannelError::ServerError(message), &text);
            }
            Dispatch::Feed(frame) => {
                if !self.status.is_usable() {
                    warn!(kind = %frame.kind, "Dropping data frame received before handshake");
                    return;
                }
                trace!(kind = %frame.kind, "Routing frame");
                if let Err(e) = self.handler.handle(frame) {
                    warn!("Failed to handle frame: {}", e);
                    self.report_frame_error(e, &text);
                }
            }
        }
    }

    fn report_frame_error(&self, err: ChannelError, raw: &str) {
        let context = self
            .context(router::event_type_for(&err))
            .with_message_data(raw);
        self.report(err, context);
    }

    // Visibility

    fn on_visibility(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => {
                if self.handle.is_some() || self.retry_timer.is_some() {
                    info!("View hidden; suspending connection");
                    self.close();
                }
            }
            Visibility::Visible => {
                if self.status.state.is_open_equivalent() {
                    return;
                }
                if self.status.terminal == Some(TerminalFailure::Unauthorized) {
                    debug!("View visible but credentials were rejected; staying closed");
                    return;
                }
                info!("View visible; resuming connection");
                self.open();
            }
        }
    }

    // Telemetry

    fn context(&self, event_type: EventType) -> ErrorContext {
        ErrorContext::new(
            self.settings.name.clone(),
            self.settings.endpoint.as_str(),
            self.status.state,
            event_type,
        )
        .with_retry_count(self.status.retry_count)
    }

    fn report(&self, err: ChannelError, context: ErrorContext) {
        self.deps.sink.capture(&err, context);
    }

    fn publish_status(&self) {
        self.status_tx.send_if_modified(|current| {
            if *current == self.status {
                false
            } else {
                *current = self.status.clone();
                true
            }
        });
    }
}

/// Owner-side handle of a mounted channel. Dropping it unmounts the channel.
pub struct ChannelHandle {
    name: String,
    commands: EventSender,
    status: watch::Receiver<ChannelStatus>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    /// Opens the channel if it is not already open, clearing a terminal failure.
    pub fn open(&self) -> Result<()> {
        self.command(ChannelCommand::Open)
    }

    /// Adds or replaces a subscription; sent immediately when usable.
    pub fn set_intent(&self, intent: SubscriptionIntent) -> Result<()> {
        self.command(ChannelCommand::SetIntent(intent))
    }

    /// Unmounts the channel and waits for its task to release everything.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.command(ChannelCommand::Shutdown);
        if let Some(task) = self.task.take() {
            task.await.map_err(|_| ChannelError::ChannelStopped)?;
        }
        Ok(())
    }

    fn command(&self, command: ChannelCommand) -> Result<()> {
        self.commands
            .send(ChannelEvent::Command(command))
            .map_err(|_| ChannelError::ChannelStopped)
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(ChannelEvent::Command(ChannelCommand::Shutdown));
    }
}
