use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::machine::{Effect, Event, Machine, Phase, Report};
use super::state::{ConnectionState, StatusUpdate};
use super::transport::{EventSender, Socket, Transport};
use crate::types::TradeParameters;

/// The side of the client the manager reports to and reads parameters from.
pub trait Frontend {
    fn set_status(&mut self, status: &StatusUpdate);
    /// Current form contents, read fresh on every send.
    fn parameters(&self) -> TradeParameters;
    fn deliver(&mut self, text: &str);
}

/// Owns the one socket and the one reconnect timer, and executes what the
/// lifecycle machine decides.
///
/// Every event, whether it comes from the socket task, the timer or the user,
/// goes through `handle` on the dispatch loop, so no locking is needed.
pub struct ConnectionManager<T: Transport> {
    machine: Machine,
    transport: T,
    url: String,
    events: EventSender,
    socket: Option<Box<dyn Socket>>,
    reconnect: Option<(u64, JoinHandle<()>)>,
}

impl<T: Transport> ConnectionManager<T> {
    /// Returns the manager and the receiving end of its event queue. The
    /// caller's dispatch loop feeds everything from the queue back into
    /// `handle`.
    pub fn new(
        transport: T,
        url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let manager = Self {
            machine: Machine::new(reconnect_delay),
            transport,
            url: url.into(),
            events,
            socket: None,
            reconnect: None,
        };
        (manager, rx)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn generation(&self) -> u64 {
        self.machine.generation()
    }

    pub fn has_socket(&self) -> bool {
        self.socket.is_some()
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Runs one event to completion, including any follow-up events the
    /// effects raise synchronously (a failed socket construction).
    pub fn handle(&mut self, event: Event, frontend: &mut dyn Frontend) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let (next, effects) = self.machine.transition(&event);
            self.machine = next;
            for effect in effects {
                self.apply(effect, frontend, &mut queue);
            }
        }
    }

    fn apply(&mut self, effect: Effect, frontend: &mut dyn Frontend, queue: &mut VecDeque<Event>) {
        match effect {
            Effect::CancelReconnect { timer } => {
                if let Some((_, handle)) = self.reconnect.take() {
                    handle.abort();
                    debug!(timer, "Pending reconnect cancelled");
                }
            }
            Effect::OpenSocket { generation } => {
                match self.transport.open(&self.url, generation, self.events.clone()) {
                    Ok(socket) => self.socket = Some(socket),
                    Err(e) => {
                        error!(generation, "Error creating WebSocket: {}", e);
                        queue.push_back(Event::ConstructionFailed {
                            generation,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            Effect::CloseSocket { generation } => {
                if let Some(socket) = &self.socket {
                    info!(generation, "Closing connection to backend");
                    socket.close();
                }
            }
            Effect::ReleaseSocket { .. } => {
                self.socket = None;
            }
            Effect::ScheduleReconnect { timer, delay } => {
                let deadline = tokio::time::Instant::now() + delay;
                let events = self.events.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    let _ = events.send(Event::ReconnectTimerFired { timer });
                });
                if let Some((_, stale)) = self.reconnect.replace((timer, handle)) {
                    stale.abort();
                }
                info!(timer, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
            }
            Effect::SendParameters => self.send_parameters(frontend),
            Effect::DeliverMessage { text } => frontend.deliver(&text),
            Effect::SetStatus(status) => frontend.set_status(&status),
            Effect::Report(report) => log_report(&report),
        }
    }

    fn send_parameters(&self, frontend: &dyn Frontend) {
        let Some(socket) = &self.socket else {
            warn!("Not connected. Cannot send parameters.");
            return;
        };

        let params = frontend.parameters();
        let payload = match params.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode parameters: {}", e);
                return;
            }
        };

        match socket.send_text(payload.clone()) {
            Ok(()) => info!("Sent parameters to backend: {}", payload),
            Err(e) => error!("Error sending parameters: {}", e),
        }
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.reconnect.take() {
            handle.abort();
        }
    }
}

fn log_report(report: &Report) {
    match report {
        Report::AlreadyConnecting => info!("WebSocket already open or connecting"),
        Report::NotConnected => warn!("Not connected. Cannot send parameters."),
        Report::StaleEvent {
            generation,
            current,
        } => debug!(generation, current, "Ignoring event from a replaced socket"),
        Report::StaleTimer { timer } => debug!(timer, "Ignoring cancelled reconnect timer"),
        Report::ConstructionFailed { reason } => {
            error!("WebSocket could not be created, not retrying: {}", reason)
        }
        Report::TransportError { reason } => error!("WebSocket error: {}", reason),
        Report::Closed {
            code,
            reason,
            clean,
        } => warn!(code, clean, reason = %reason, "WebSocket connection closed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ClientError, ClientResult};
    use crate::types::FeeTier;
    use std::sync::{Arc, Mutex};

    const DELAY: Duration = Duration::from_millis(5000);

    #[derive(Clone, Default)]
    struct FakeTransport {
        opened: Arc<Mutex<Vec<u64>>>,
        sent: Arc<Mutex<Vec<String>>>,
        closes: Arc<Mutex<u32>>,
        fail: bool,
    }

    struct FakeSocket {
        sent: Arc<Mutex<Vec<String>>>,
        closes: Arc<Mutex<u32>>,
    }

    impl Transport for FakeTransport {
        fn open(
            &mut self,
            _url: &str,
            generation: u64,
            _events: EventSender,
        ) -> ClientResult<Box<dyn Socket>> {
            if self.fail {
                return Err(ClientError::UnsupportedScheme {
                    scheme: "http".to_string(),
                });
            }
            self.opened.lock().unwrap().push(generation);
            Ok(Box::new(FakeSocket {
                sent: Arc::clone(&self.sent),
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    impl Socket for FakeSocket {
        fn send_text(&self, text: String) -> ClientResult<()> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        fn close(&self) {
            *self.closes.lock().unwrap() += 1;
        }
    }

    struct FakeFrontend {
        statuses: Vec<StatusUpdate>,
        delivered: Vec<String>,
        params: TradeParameters,
    }

    impl FakeFrontend {
        fn new() -> Self {
            Self {
                statuses: Vec::new(),
                delivered: Vec::new(),
                params: TradeParameters {
                    quantity_usd: 1000.0,
                    volatility: 2.5,
                    fee_tier: FeeTier {
                        maker: 0.02,
                        taker: 0.04,
                    },
                },
            }
        }
    }

    impl Frontend for FakeFrontend {
        fn set_status(&mut self, status: &StatusUpdate) {
            self.statuses.push(status.clone());
        }

        fn parameters(&self) -> TradeParameters {
            self.params
        }

        fn deliver(&mut self, text: &str) {
            self.delivered.push(text.to_string());
        }
    }

    fn unclean_close(generation: u64) -> Event {
        Event::Closed {
            generation,
            code: 1006,
            reason: String::new(),
            clean: false,
        }
    }

    #[tokio::test]
    async fn test_open_sends_current_parameters() {
        let transport = FakeTransport::default();
        let sent = Arc::clone(&transport.sent);
        let (mut manager, _rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert!(sent.lock().unwrap().is_empty());

        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(
            *sent.lock().unwrap(),
            vec![r#"{"quantityUSD":1000,"volatility":2.5,"fee_tier_data":{"maker":0.02,"taker":0.04}}"#
                .to_string()]
        );
        assert_eq!(frontend.statuses.last(), Some(&StatusUpdate::connected()));
    }

    #[tokio::test]
    async fn test_parameters_are_read_at_send_time() {
        let transport = FakeTransport::default();
        let sent = Arc::clone(&transport.sent);
        let (mut manager, _rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        frontend.params.quantity_usd = 250.0;
        manager.handle(Event::SendRequested, &mut frontend);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].starts_with(r#"{"quantityUSD":250,"#));
    }

    #[tokio::test]
    async fn test_rapid_connects_keep_one_socket() {
        let transport = FakeTransport::default();
        let opened = Arc::clone(&transport.opened);
        let (mut manager, _rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        for _ in 0..5 {
            manager.handle(Event::ConnectRequested, &mut frontend);
        }
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        for _ in 0..5 {
            manager.handle(Event::ConnectRequested, &mut frontend);
        }

        assert_eq!(*opened.lock().unwrap(), vec![1]);
        assert!(manager.has_socket());
    }

    #[tokio::test]
    async fn test_construction_failure_is_not_retried() {
        let transport = FakeTransport {
            fail: true,
            ..FakeTransport::default()
        };
        let (mut manager, mut rx) = ConnectionManager::new(transport, "http://localhost", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);

        assert_eq!(manager.phase(), Phase::ConstructionFailed);
        assert!(!manager.has_socket());
        assert!(!manager.has_pending_reconnect());
        assert_eq!(
            frontend.statuses.last(),
            Some(&StatusUpdate::construction_failed())
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclean_close_reconnects_after_delay() {
        let transport = FakeTransport::default();
        let opened = Arc::clone(&transport.opened);
        let (mut manager, mut rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();
        let start = tokio::time::Instant::now();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        manager.handle(unclean_close(1), &mut frontend);

        assert!(!manager.has_socket());
        assert!(manager.has_pending_reconnect());
        assert_eq!(
            frontend.statuses.last(),
            Some(&StatusUpdate::closed("", false))
        );

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(rx.try_recv().is_err());

        let event = rx.recv().await.unwrap();
        assert_eq!(event, Event::ReconnectTimerFired { timer: 0 });
        assert!(start.elapsed() >= DELAY);

        manager.handle(event, &mut frontend);
        assert_eq!(*opened.lock().unwrap(), vec![1, 2]);
        assert!(!manager.has_pending_reconnect());
        assert_eq!(manager.state(), ConnectionState::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_connect_cancels_reconnect_timer() {
        let transport = FakeTransport::default();
        let opened = Arc::clone(&transport.opened);
        let (mut manager, mut rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(unclean_close(1), &mut frontend);
        manager.handle(Event::ConnectRequested, &mut frontend);
        assert!(!manager.has_pending_reconnect());

        tokio::time::advance(DELAY * 2).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(*opened.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_close_never_schedules_reconnect() {
        let transport = FakeTransport::default();
        let (mut manager, mut rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        manager.handle(
            Event::Closed {
                generation: 1,
                code: 1000,
                reason: "bye".to_string(),
                clean: true,
            },
            &mut frontend,
        );

        assert!(!manager.has_pending_reconnect());
        tokio::time::advance(DELAY * 3).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(
            frontend.statuses.last().map(|s| s.text.as_str()),
            Some("Disconnected: bye. Connection closed cleanly.")
        );
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_dropped() {
        let transport = FakeTransport::default();
        let sent = Arc::clone(&transport.sent);
        let (mut manager, _rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::SendRequested, &mut frontend);
        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::SendRequested, &mut frontend);

        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_reach_frontend() {
        let (mut manager, _rx) =
            ConnectionManager::new(FakeTransport::default(), "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        manager.handle(
            Event::MessageReceived {
                generation: 1,
                text: r#"{"bestBid": 1}"#.to_string(),
            },
            &mut frontend,
        );

        assert_eq!(frontend.delivered, vec![r#"{"bestBid": 1}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect_closes_socket() {
        let transport = FakeTransport::default();
        let closes = Arc::clone(&transport.closes);
        let (mut manager, _rx) = ConnectionManager::new(transport, "ws://localhost:8000", DELAY);
        let mut frontend = FakeFrontend::new();

        manager.handle(Event::ConnectRequested, &mut frontend);
        manager.handle(Event::Opened { generation: 1 }, &mut frontend);
        manager.handle(Event::DisconnectRequested, &mut frontend);

        assert_eq!(*closes.lock().unwrap(), 1);
        // The socket stays until the transport confirms the close.
        assert!(manager.has_socket());
    }
}
