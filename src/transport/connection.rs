//! Duplex frame sessions and the WebSocket connector.
//!
//! A [`Connector`] opens one [`TransportSession`] per connection attempt.
//! The session engine owns the session for the lifetime of that connection
//! and drops it to close the transport.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default bound for the TCP, TLS and WebSocket upgrade handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

/// Outbound half of a transport session.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Inbound half of a transport session.
///
/// The stream ends when the remote side closes the connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

// ============================================================================
// TransportSession
// ============================================================================

/// One open connection carrying text frames in both directions.
pub struct TransportSession {
    /// Frames to the server.
    pub sink: FrameSink,
    /// Frames from the server.
    pub stream: FrameStream,
}

impl TransportSession {
    /// Creates a session from its two halves.
    #[inline]
    #[must_use]
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession").finish_non_exhaustive()
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens transport sessions.
///
/// Called once per connection attempt; a failure counts as a disconnect
/// and is retried after the reconnect backoff.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new session.
    async fn connect(&self) -> Result<TransportSession>;
}

#[async_trait]
impl Connector for Box<dyn Connector> {
    async fn connect(&self) -> Result<TransportSession> {
        (**self).connect().await
    }
}

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Connects to the event channel over WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
    connect_timeout: Duration,
}

impl WebSocketConnector {
    /// Creates a connector for an explicit WebSocket URL.
    #[inline]
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the bound for opening the connection.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Creates a connector for `<base>/<version>/events`.
    ///
    /// `http` and `https` bases are rewritten to `ws` and `wss`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base uses another scheme.
    pub fn from_base(base: &Url, version: &str) -> Result<Self> {
        let mut url = base.clone();

        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::config(format!(
                    "unsupported endpoint scheme: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::config(format!("cannot use scheme {scheme} for {base}")))?;

        let path = format!("{}/{version}/events", base.path().trim_end_matches('/'));
        url.set_path(&path);

        Ok(Self::new(url))
    }

    /// Returns the WebSocket URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<TransportSession> {
        debug!(url = %self.url, "Opening WebSocket");

        let handshake = connect_async(self.url.as_str());
        let (ws_stream, _response) = timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "WebSocket handshake with {} timed out after {}ms",
                    self.url,
                    self.connect_timeout.as_millis()
                ))
            })??;
        let (ws_write, ws_read) = ws_stream.split();

        let sink = ws_write
            .sink_map_err(Error::from)
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text.into()))));

        let stream = ws_read.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Some(Ok(text)),
                    Err(_) => {
                        trace!(len = bytes.len(), "Ignoring non-UTF-8 binary frame");
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    None
                }
                // Ping/Pong are answered by tungstenite.
                Ok(_) => None,
                Err(e) => Some(Err(Error::from(e))),
            })
        });

        Ok(TransportSession::new(Box::pin(sink), Box::pin(stream)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn base(text: &str) -> Url {
        Url::parse(text).expect("valid url")
    }

    #[test]
    fn test_from_base_rewrites_scheme() {
        let connector =
            WebSocketConnector::from_base(&base("http://localhost:5140"), "v1").expect("connector");
        assert_eq!(connector.url().as_str(), "ws://localhost:5140/v1/events");

        let connector =
            WebSocketConnector::from_base(&base("https://chat.example.com"), "v1").expect("tls");
        assert_eq!(connector.url().as_str(), "wss://chat.example.com/v1/events");
    }

    #[test]
    fn test_from_base_keeps_prefix() {
        let connector = WebSocketConnector::from_base(&base("http://host/api/"), "v2")
            .expect("connector");
        assert_eq!(connector.url().as_str(), "ws://host/api/v2/events");
    }

    #[test]
    fn test_from_base_rejects_other_schemes() {
        let err = WebSocketConnector::from_base(&base("ftp://host"), "v1").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 9 (discard) is not expected to accept WebSocket upgrades.
        let connector = WebSocketConnector::new(base("ws://127.0.0.1:9/v1/events"));
        assert!(connector.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_connect_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");

        // Accepts the TCP connection but never answers the upgrade.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let connector = WebSocketConnector::new(base(&format!("ws://{addr}/v1/events")))
            .with_connect_timeout(Duration::from_millis(200));
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }), "got {err:?}");
        assert!(err.to_string().contains("timed out"));

        server.abort();
    }

    #[test]
    fn test_default_connect_timeout() {
        let connector = WebSocketConnector::new(base("ws://host/v1/events"));
        assert_eq!(connector.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
