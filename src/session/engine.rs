//! Session engine: handshake, heartbeat and reconnection.
//!
//! One engine keeps one logical event stream alive across any number of
//! transport connections.
//!
//! # Connection Lifecycle
//!
//! 1. Open a transport through the [`Connector`]
//! 2. Send `Identify` with the token and resume cursor
//! 3. Wait for `Ready` (bounded by `ready_timeout`)
//! 4. Read frames; ping every `heartbeat_interval`, expect `Pong` within
//!    `pong_timeout`
//! 5. On any failure, drop the transport, wait `reconnect_backoff`, go to 1
//!
//! `close()` ends the cycle from any state.
//!
//! # Tasks
//!
//! | Task | Lifetime | Role |
//! |------|----------|------|
//! | session | `connect()` → `close()` | Connect loop, frame reading, writes |
//! | dispatch | `connect()` → `close()` | Delivers events to the [`Dispatcher`] in order |
//!
//! The dispatch queue holds at most `dispatch_capacity` events. When slow
//! listeners let it fill up, newer events are dropped with a warning so the
//! session task keeps reading frames and answering heartbeats.
//! | heartbeat | one live connection | Ping timer and pong deadline |
//!
//! # Resume Cursor
//!
//! The id of the last event received is sent with every `Identify` after
//! the first. Resumption is best-effort: across a reconnect events may be
//! repeated or lost, and listeners must tolerate both.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::markup::{ElementRegistry, MarkupCodec};
use crate::protocol::{Event, Ready, Signal};
use crate::transport::{Connector, FrameSink, FrameStream, TransportSession};

use super::dispatcher::Dispatcher;
use super::options::SessionOptions;
use super::state::SessionState;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for flushing and closing a transport being dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Cursor value meaning no event has been seen.
const NO_CURSOR: u64 = u64::MAX;

// ============================================================================
// Types
// ============================================================================

type DispatchQueue = mpsc::Sender<Event>;

// ============================================================================
// SessionEngine
// ============================================================================

/// Keeps an event channel connected and feeds its events to a dispatcher.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use chatlink::{Dispatcher, SessionEngine, SessionOptions, WebSocketConnector};
/// use chatlink::markup::standard_registry;
///
/// let connector = WebSocketConnector::from_base(&"http://localhost:5140".parse()?, "v1")?;
/// let dispatcher = Arc::new(Dispatcher::new());
/// let engine = SessionEngine::new(
///     connector,
///     SessionOptions::new().with_token("secret"),
///     Arc::clone(&dispatcher),
///     standard_registry(),
/// );
///
/// engine.connect()?;
/// // ...
/// engine.close();
/// engine.wait_terminated().await;
/// ```
pub struct SessionEngine {
    inner: Arc<Inner>,
    /// Session task, once `connect()` was called.
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the engine handle and its tasks.
struct Inner {
    connector: Arc<dyn Connector>,
    options: SessionOptions,
    dispatcher: Arc<Dispatcher>,
    codec: MarkupCodec,
    state: watch::Sender<SessionState>,
    /// Last event id, written only by the session task.
    cursor: AtomicU64,
    shutdown: CancellationToken,
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("state", &self.state())
            .field("resume_cursor", &self.resume_cursor())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl SessionEngine {
    /// Creates an engine in the `Disconnected` state.
    ///
    /// Nothing happens until [`connect`](Self::connect) is called. Message
    /// content of inbound events is decoded with `registry`.
    #[must_use]
    pub fn new(
        connector: impl Connector,
        options: SessionOptions,
        dispatcher: Arc<Dispatcher>,
        registry: Arc<ElementRegistry>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);

        let inner = Inner {
            connector: Arc::new(connector),
            options,
            dispatcher,
            codec: MarkupCodec::new(registry),
            state,
            cursor: AtomicU64::new(NO_CURSOR),
            shutdown: CancellationToken::new(),
        };

        Self {
            inner: Arc::new(inner),
            task: Mutex::new(None),
        }
    }

    /// Starts the session task.
    ///
    /// Returns immediately; progress is observable through
    /// [`subscribe_state`](Self::subscribe_state). Calling it again while
    /// the task runs does nothing. Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after [`close`](Self::close).
    pub fn connect(&self) -> Result<()> {
        if self.inner.shutdown.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Session already running");
            return Ok(());
        }

        *task = Some(tokio::spawn(Arc::clone(&self.inner).run()));
        Ok(())
    }

    /// Stops the session for good.
    ///
    /// Unblocks any pending wait, drops the transport and suppresses further
    /// reconnection. Callable from any task; later calls do nothing.
    pub fn close(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        info!("Closing session");
        self.inner.shutdown.cancel();

        if self.task.lock().is_none() {
            self.inner.set_state(SessionState::Terminated);
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns the id of the last event received, if any.
    #[inline]
    #[must_use]
    pub fn resume_cursor(&self) -> Option<u64> {
        self.inner.resume_cursor()
    }

    /// Waits until the engine reaches `Terminated`.
    pub async fn wait_terminated(&self) {
        let mut state = self.subscribe_state();
        // The sender lives as long as `self`.
        let _ = state.wait_for(|s| s.is_terminal()).await;
    }

    /// Returns the dispatcher events are delivered to.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    /// Returns the session options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

// ============================================================================
// Session Task
// ============================================================================

impl Inner {
    /// Connect loop; runs until shutdown.
    async fn run(self: Arc<Self>) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(self.options.dispatch_capacity.max(1));
        tokio::spawn(run_dispatch_queue(
            Arc::clone(&self.dispatcher),
            dispatch_rx,
            self.shutdown.clone(),
        ));

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;

            match self.run_connection(&dispatch_tx).await {
                Ok(()) => break,
                Err(e) => warn!(attempt, error = %e, "Connection lost"),
            }

            self.set_state(SessionState::Disconnected);
            debug!(
                backoff_ms = millis(self.options.reconnect_backoff),
                "Reconnecting after backoff"
            );

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = sleep(self.options.reconnect_backoff) => {}
            }
        }

        self.set_state(SessionState::Terminated);
        info!("Session terminated");
    }

    /// Runs one connection from open to close.
    ///
    /// Returns `Ok(())` only on shutdown.
    async fn run_connection(self: &Arc<Self>, dispatch_tx: &DispatchQueue) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        self.set_state(SessionState::Connecting);

        let session = tokio::select! {
            () = self.shutdown.cancelled() => return Ok(()),
            session = self.connector.connect() => session?,
        };
        let TransportSession {
            mut sink,
            mut stream,
        } = session;

        let result = self.drive(&mut sink, &mut stream, dispatch_tx).await;

        if timeout(CLOSE_TIMEOUT, sink.close()).await.is_err() {
            debug!("Transport close timed out");
        }
        result
    }

    /// Handshake followed by the live loop.
    async fn drive(
        self: &Arc<Self>,
        sink: &mut FrameSink,
        stream: &mut FrameStream,
        dispatch_tx: &DispatchQueue,
    ) -> Result<()> {
        self.set_state(SessionState::AwaitingReady);

        let cursor = self.resume_cursor();
        let identify = Signal::identify(self.options.token.clone(), cursor);
        match self.write(sink, identify.encode()?).await {
            None => return Ok(()),
            Some(sent) => sent?,
        }
        debug!(sequence = ?cursor, "Identify sent");

        let ready_timeout = self.options.ready_timeout;
        let ready = tokio::select! {
            () = self.shutdown.cancelled() => return Ok(()),
            ready = timeout(ready_timeout, self.await_ready(stream, dispatch_tx)) => {
                ready.map_err(|_| Error::handshake_timeout(millis(ready_timeout)))??
            }
        };

        log_logins(&ready);
        self.set_state(SessionState::Live);

        self.run_live(sink, stream, dispatch_tx).await
    }

    /// Reads frames until `Ready` arrives.
    async fn await_ready(
        &self,
        stream: &mut FrameStream,
        dispatch_tx: &DispatchQueue,
    ) -> Result<Ready> {
        loop {
            let frame = match stream.next().await {
                Some(frame) => frame?,
                None => return Err(Error::ConnectionClosed),
            };

            match self.decode_frame(&frame) {
                Some(Signal::Ready(ready)) => return Ok(ready),
                Some(Signal::Event(event)) => self.handle_event(*event, dispatch_tx),
                Some(other) => debug!(op = other.opcode().code(), "Ignoring signal before ready"),
                None => {}
            }
        }
    }

    /// Reads frames and writes queued signals until the connection fails.
    async fn run_live(
        self: &Arc<Self>,
        sink: &mut FrameSink,
        stream: &mut FrameStream,
        dispatch_tx: &DispatchQueue,
    ) -> Result<()> {
        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<Signal>();
        let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();
        let (fail_tx, mut fail_rx) = oneshot::channel::<Error>();
        let stop = self.shutdown.child_token();

        let heartbeat = tokio::spawn(Arc::clone(self).run_heartbeat(
            write_tx,
            pong_rx,
            fail_tx,
            stop.clone(),
        ));

        let result = loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break Ok(()),

                failure = &mut fail_rx => {
                    break Err(failure.unwrap_or_else(|_| Error::transport("heartbeat stopped")));
                }

                Some(signal) = write_rx.recv() => {
                    let frame = match signal.encode() {
                        Ok(frame) => frame,
                        Err(e) => break Err(e),
                    };
                    match self.write(sink, frame).await {
                        None => break Ok(()),
                        Some(Err(e)) => break Err(e),
                        Some(Ok(())) => {}
                    }
                    trace!(op = signal.opcode().code(), "Signal sent");
                }

                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text, &pong_tx, dispatch_tx),
                    Some(Err(e)) => break Err(e),
                    None => break Err(Error::ConnectionClosed),
                },
            }
        };

        stop.cancel();
        let _ = heartbeat.await;
        result
    }

    /// Writes one frame; `None` if shutdown came first.
    async fn write(&self, sink: &mut FrameSink, frame: String) -> Option<Result<()>> {
        tokio::select! {
            () = self.shutdown.cancelled() => None,
            sent = sink.send(frame) => Some(sent),
        }
    }

    /// Ping / pong cycle for one connection.
    ///
    /// Reports a missed pong through `fail_tx` and exits.
    async fn run_heartbeat(
        self: Arc<Self>,
        write_tx: mpsc::UnboundedSender<Signal>,
        mut pong_rx: mpsc::UnboundedReceiver<()>,
        fail_tx: oneshot::Sender<Error>,
        stop: CancellationToken,
    ) {
        let interval = self.options.heartbeat_interval;
        let pong_timeout = self.options.pong_timeout;

        loop {
            tokio::select! {
                () = stop.cancelled() => return,
                () = sleep(interval) => {}
            }

            while pong_rx.try_recv().is_ok() {
                trace!("Discarding stale pong");
            }

            self.set_state(SessionState::AwaitingPong);
            if write_tx.send(Signal::Ping).is_err() {
                return;
            }

            tokio::select! {
                () = stop.cancelled() => return,
                pong = timeout(pong_timeout, pong_rx.recv()) => match pong {
                    Ok(Some(())) => {
                        trace!("Pong received");
                        self.set_state(SessionState::Live);
                    }
                    Ok(None) => return,
                    Err(_) => {
                        let _ = fail_tx.send(Error::heartbeat_timeout(millis(pong_timeout)));
                        return;
                    }
                },
            }
        }
    }
}

// ============================================================================
// Frame Handling
// ============================================================================

impl Inner {
    fn decode_frame(&self, frame: &str) -> Option<Signal> {
        match Signal::decode(frame) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(error = %e, frame = %frame, "Skipping malformed frame");
                None
            }
        }
    }

    fn handle_frame(
        &self,
        frame: &str,
        pong_tx: &mpsc::UnboundedSender<()>,
        dispatch_tx: &DispatchQueue,
    ) {
        let Some(signal) = self.decode_frame(frame) else {
            return;
        };

        match signal {
            Signal::Event(event) => self.handle_event(*event, dispatch_tx),
            Signal::Pong if *self.state.borrow() == SessionState::AwaitingPong => {
                let _ = pong_tx.send(());
            }
            Signal::Pong => debug!("Ignoring unexpected pong"),
            Signal::Ready(_) => debug!("Ignoring ready outside handshake"),
            other => debug!(op = other.opcode().code(), "Ignoring client-bound signal"),
        }
    }

    fn handle_event(&self, mut event: Event, dispatch_tx: &DispatchQueue) {
        self.cursor.store(event.id, Ordering::Release);
        trace!(event_id = event.id, event_type = %event.event_type, "Event received");

        if let Err(e) = event.decode_content(&self.codec) {
            warn!(error = %e, raw = %event.raw, "Dropping event with unparsable content");
            return;
        }

        match dispatch_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!(
                event_id = event.id,
                capacity = self.options.dispatch_capacity,
                "Dispatch queue full, dropping event"
            ),
            Err(TrySendError::Closed(_)) => debug!("Dispatch queue closed, event discarded"),
        }
    }

    fn resume_cursor(&self) -> Option<u64> {
        match self.cursor.load(Ordering::Acquire) {
            NO_CURSOR => None,
            id => Some(id),
        }
    }

    /// Publishes a state change; `Terminated` is never left.
    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next || current.is_terminal() {
                return false;
            }
            debug!(from = %current, to = %next, "Session state changed");
            *current = next;
            true
        });
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Delivers queued events one at a time, in arrival order.
async fn run_dispatch_queue(
    dispatcher: Arc<Dispatcher>,
    mut queue: mpsc::Receiver<Event>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            event = queue.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        // Failures and panics are logged by the dispatcher.
        let _ = dispatcher.dispatch(event).await;
    }
    debug!("Dispatch queue stopped");
}

fn log_logins(ready: &Ready) {
    info!(count = ready.logins.len(), "Session ready");
    for login in &ready.logins {
        info!(
            platform = login.platform.as_deref().unwrap_or_default(),
            self_id = login.self_id.as_deref().unwrap_or_default(),
            status = login.status.name(),
            "Active login"
        );
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
