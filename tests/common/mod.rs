// Shared fixtures for channel tests: a recording connector that lets tests
// play the server side, a recording error sink and a silent TCP server.

#![allow(dead_code)]

use coinpulse_realtime::{
    client::ChannelDeps,
    credentials::StaticTokenProvider,
    error::{ChannelError, Result},
    events::TransportEvents,
    notify::{AlertToast, Notifier},
    sink::{ErrorContext, ErrorSink, EventType},
    transport::{Connection, Connector},
    visibility::{Visibility, VisibilityController, VisibilitySender, visibility_signal},
};
use serde_json::Value;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle, time::Instant};
use url::Url;

pub const TOKEN: &str = "test-token";

/// One connection attempt as seen by the server side.
#[derive(Clone)]
pub struct Socket {
    pub endpoint: Url,
    pub events: TransportEvents,
    pub opened_at: Instant,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Socket {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn sent_types(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// True once the client released this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Opens the socket and completes the handshake.
    pub async fn accept(&self) {
        self.events.opened();
        settle().await;
        self.events.message(r#"{"type":"AUTH_SUCCESS"}"#);
        settle().await;
    }
}

struct MockConnection {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Connection for MockConnection {
    fn send(&mut self, text: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::NotConnected);
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    sockets: Arc<Mutex<Vec<Socket>>>,
}

impl MockConnector {
    pub fn count(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn socket(&self, index: usize) -> Socket {
        self.sockets.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> Socket {
        self.sockets
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection attempts recorded")
    }

    pub fn live_count(&self) -> usize {
        self.sockets
            .lock()
            .unwrap()
            .iter()
            .filter(|socket| !socket.is_closed())
            .count()
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &Url, events: TransportEvents) -> Box<dyn Connection> {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        self.sockets.lock().unwrap().push(Socket {
            endpoint: endpoint.clone(),
            events,
            opened_at: Instant::now(),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        });
        Box::new(MockConnection { sent, closed })
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub error: String,
    pub context: ErrorContext,
}

#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    pub fn of_type(&self, event_type: EventType) -> Vec<Report> {
        self.reports()
            .into_iter()
            .filter(|report| report.context.event_type == event_type)
            .collect()
    }
}

impl ErrorSink for RecordingSink {
    fn capture(&self, err: &ChannelError, context: ErrorContext) {
        self.reports.lock().unwrap().push(Report {
            error: err.to_string(),
            context,
        });
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<AlertToast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<AlertToast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: AlertToast) -> Result<()> {
        self.toasts.lock().unwrap().push(toast);
        Ok(())
    }
}

pub struct Harness {
    pub connector: MockConnector,
    pub sink: Arc<RecordingSink>,
    pub visibility: VisibilitySender,
    pub base: Url,
    token: Option<String>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_token(Some(TOKEN))
    }

    pub fn with_token(token: Option<&str>) -> Self {
        let (visibility, _) = visibility_signal();
        Self {
            connector: MockConnector::default(),
            sink: Arc::new(RecordingSink::default()),
            visibility,
            base: Url::parse("ws://localhost:8080/ws").unwrap(),
            token: token.map(str::to_string),
        }
    }

    pub fn deps(&self) -> ChannelDeps {
        ChannelDeps {
            connector: Arc::new(self.connector.clone()),
            credentials: Arc::new(StaticTokenProvider::new(self.token.clone())),
            sink: self.sink.clone(),
        }
    }

    pub fn controller(&self) -> VisibilityController {
        VisibilityController::new(self.visibility.subscribe())
    }

    pub async fn hide(&self) {
        self.visibility.send_replace(Visibility::Hidden);
        settle().await;
    }

    pub async fn show(&self) {
        self.visibility.send_replace(Visibility::Visible);
        settle().await;
    }
}

/// Lets every ready task run. With a paused clock the runtime only advances
/// time once all tasks are idle, so this drains the channel's queue.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn assert_delay(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(2),
        "expected a {:?} delay, observed {:?}",
        expected,
        actual
    );
}

/// Accepts TCP connections and holds them without ever answering the
/// WebSocket upgrade. Returns the base url to point feeds at.
pub async fn silent_server() -> (Url, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (Url::parse(&format!("ws://{}/ws", addr)).unwrap(), task)
}
