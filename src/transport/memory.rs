//! In-process transport.
//!
//! [`channel`] returns a connector and the server end it connects to. Each
//! `connect()` produces one [`ServerConnection`] on the server side, which
//! can script signals for the client. Used by the engine tests and handy
//! for exercising listeners without a network.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{sink, stream};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::Signal;

use super::connection::{Connector, TransportSession};

// ============================================================================
// Constructors
// ============================================================================

/// Creates a connected connector / server pair.
#[must_use]
pub fn channel() -> (MemoryConnector, MemoryServer) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    let refusals = Arc::new(AtomicUsize::new(0));

    let connector = MemoryConnector {
        accept_tx,
        refusals: Arc::clone(&refusals),
    };
    let server = MemoryServer {
        accept_rx,
        refusals,
    };
    (connector, server)
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// Client end of an in-process transport.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<ServerConnection>,
    refusals: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<TransportSession> {
        let refused = self
            .refusals
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::transport("connection refused"));
        }

        let (to_server_tx, to_server_rx) = mpsc::unbounded_channel::<String>();
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel::<Result<String>>();

        self.accept_tx
            .send(ServerConnection {
                inbound: to_server_rx,
                outbound: Some(to_client_tx),
            })
            .map_err(|_| Error::transport("server is gone"))?;

        let sink = sink::unfold(to_server_tx, |tx, frame: String| async move {
            tx.send(frame).map_err(|_| Error::ConnectionClosed)?;
            Ok::<_, Error>(tx)
        });
        let stream = stream::unfold(to_client_rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        });

        debug!("Memory transport connected");
        Ok(TransportSession::new(Box::pin(sink), Box::pin(stream)))
    }
}

// ============================================================================
// MemoryServer
// ============================================================================

/// Server end of an in-process transport.
#[derive(Debug)]
pub struct MemoryServer {
    accept_rx: mpsc::UnboundedReceiver<ServerConnection>,
    refusals: Arc<AtomicUsize>,
}

impl MemoryServer {
    /// Waits for the next connection attempt.
    ///
    /// Returns `None` once every connector has been dropped.
    pub async fn accept(&mut self) -> Option<ServerConnection> {
        self.accept_rx.recv().await
    }

    /// Returns an already pending connection without waiting.
    pub fn try_accept(&mut self) -> Option<ServerConnection> {
        self.accept_rx.try_recv().ok()
    }

    /// Makes the next `count` connection attempts fail.
    pub fn refuse_next(&self, count: usize) {
        self.refusals.store(count, Ordering::Release);
    }
}

// ============================================================================
// ServerConnection
// ============================================================================

/// One accepted in-process connection, seen from the server.
#[derive(Debug)]
pub struct ServerConnection {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: Option<mpsc::UnboundedSender<Result<String>>>,
}

impl ServerConnection {
    /// Receives the next raw frame sent by the client.
    ///
    /// Returns `None` once the client dropped its session.
    pub async fn recv_frame(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Receives and decodes the next signal sent by the client.
    ///
    /// Returns `None` once the client dropped its session or on an
    /// undecodable frame.
    pub async fn recv(&mut self) -> Option<Signal> {
        let frame = self.recv_frame().await?;
        Signal::decode(&frame).ok()
    }

    /// Sends a raw frame to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if either side has closed.
    pub fn send_frame(&self, frame: impl Into<String>) -> Result<()> {
        self.outbound
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .send(Ok(frame.into()))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Encodes and sends a signal to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if either side has closed.
    pub fn send(&self, signal: &Signal) -> Result<()> {
        self.send_frame(signal.encode()?)
    }

    /// Delivers a transport error to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if either side has closed.
    pub fn fail(&self, message: &str) -> Result<()> {
        self.outbound
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .send(Err(Error::transport(message)))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Ends the client's inbound stream.
    pub fn close(&mut self) {
        self.outbound = None;
    }

    /// Returns `true` once the client has dropped its session.
    #[must_use]
    pub fn is_closed_by_client(&self) -> bool {
        self.outbound.as_ref().is_none_or(mpsc::UnboundedSender::is_closed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (connector, mut server) = channel();
        let mut session = connector.connect().await.expect("connect");
        let mut conn = server.accept().await.expect("accepted");

        session.sink.send("hello".to_owned()).await.expect("send");
        assert_eq!(conn.recv_frame().await.as_deref(), Some("hello"));

        conn.send(&Signal::Pong).expect("send pong");
        let frame = session.stream.next().await.expect("frame").expect("ok");
        assert_eq!(Signal::decode(&frame).expect("decode"), Signal::Pong);
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let (connector, mut server) = channel();
        let mut session = connector.connect().await.expect("connect");
        let mut conn = server.accept().await.expect("accepted");

        conn.close();
        assert!(session.stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_fail_yields_error() {
        let (connector, mut server) = channel();
        let mut session = connector.connect().await.expect("connect");
        let conn = server.accept().await.expect("accepted");

        conn.fail("reset").expect("fail");
        let item = session.stream.next().await.expect("item");
        assert!(matches!(item, Err(Error::Transport { .. })));
    }

    #[tokio::test]
    async fn test_refuse_next() {
        let (connector, mut server) = channel();
        server.refuse_next(1);

        assert!(connector.connect().await.is_err());
        assert!(server.try_accept().is_none());
        assert!(connector.connect().await.is_ok());
        assert!(server.try_accept().is_some());
    }

    #[tokio::test]
    async fn test_client_drop_detected() {
        let (connector, mut server) = channel();
        let session = connector.connect().await.expect("connect");
        let mut conn = server.accept().await.expect("accepted");

        drop(session);
        assert!(conn.recv_frame().await.is_none());
        assert!(conn.is_closed_by_client());
    }
}
