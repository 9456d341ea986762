//! Client coordinator.
//!
//! The [`Client`] owns one bot account's event session, its dispatcher and
//! its action client.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatlink::{Client, Event};
//!
//! # async fn example() -> chatlink::Result<()> {
//! let client = Client::builder()
//!     .endpoint("https://chat.example.com")
//!     .token("secret")
//!     .build()?;
//!
//! let actions = client.actions().clone();
//! client.on("message-created", move |event: Arc<Event>| {
//!     let actions = actions.clone();
//!     async move {
//!         let channel = event.require_channel()?;
//!         actions.message_create(&channel.id, &event.require_message()?.elements).await?;
//!         Ok::<(), chatlink::Error>(())
//!     }
//! });
//!
//! client.connect()?;
//! client.wait_terminated().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use url::Url;

use crate::action::ActionClient;
use crate::error::Result;
use crate::identifiers::ListenerId;
use crate::markup::{ElementRegistry, MarkupCodec, standard_registry};
use crate::session::{Dispatcher, EventListener, SessionEngine, SessionOptions, SessionState};
use crate::transport::{Connector, WebSocketConnector, WebhookServer};

use super::builder::ClientBuilder;

// ============================================================================
// Types
// ============================================================================

/// Validated configuration handed over by the builder.
pub(crate) struct ClientParts {
    pub base: Url,
    pub version: String,
    pub token: Option<String>,
    pub platform: String,
    pub self_id: String,
    pub options: SessionOptions,
    pub registry: Option<Arc<ElementRegistry>>,
    pub connector: Option<Box<dyn Connector>>,
}

/// Internal shared state for the client.
struct ClientInner {
    engine: SessionEngine,
    actions: ActionClient,
    registry: Arc<ElementRegistry>,
}

// ============================================================================
// Client
// ============================================================================

/// Chat protocol client for one bot account.
///
/// Cheap to clone; clones share the session. The session stops when
/// [`close`](Self::close) is called or the last clone is dropped.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("actions", &self.inner.actions)
            .field("listeners", &self.dispatcher().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new(parts: ClientParts) -> Result<Self> {
        let registry = parts.registry.unwrap_or_else(standard_registry);
        let dispatcher = Arc::new(Dispatcher::new());

        let connector: Box<dyn Connector> = match parts.connector {
            Some(connector) => connector,
            None => Box::new(WebSocketConnector::from_base(&parts.base, &parts.version)?),
        };

        let actions = ActionClient::new(
            parts.base.clone(),
            parts.version,
            parts.token,
            parts.platform,
            parts.self_id,
        )?;

        let engine = SessionEngine::new(
            connector,
            parts.options,
            dispatcher,
            Arc::clone(&registry),
        );

        info!(endpoint = %parts.base, "Client created");

        Ok(Self {
            inner: Arc::new(ClientInner {
                engine,
                actions,
                registry,
            }),
        })
    }
}

// ============================================================================
// Client - Session
// ============================================================================

impl Client {
    /// Starts the event session in the background.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// after [`close`](Self::close).
    #[inline]
    pub fn connect(&self) -> Result<()> {
        self.inner.engine.connect()
    }

    /// Stops the event session for good.
    #[inline]
    pub fn close(&self) {
        self.inner.engine.close();
    }

    /// Returns the session state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.engine.state()
    }

    /// Subscribes to session state changes.
    #[inline]
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.engine.subscribe_state()
    }

    /// Waits until the session is closed.
    pub async fn wait_terminated(&self) {
        self.inner.engine.wait_terminated().await;
    }

    /// Returns the session engine.
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.inner.engine
    }
}

// ============================================================================
// Client - Listeners
// ============================================================================

impl Client {
    /// Registers a listener for one event type.
    #[inline]
    pub fn on(&self, event_type: impl Into<String>, listener: impl EventListener) -> ListenerId {
        self.dispatcher().on(event_type, listener)
    }

    /// Registers a listener for every event.
    #[inline]
    pub fn on_any(&self, listener: impl EventListener) -> ListenerId {
        self.dispatcher().on_any(listener)
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    #[inline]
    pub fn off(&self, id: ListenerId) -> bool {
        self.dispatcher().off(id)
    }

    /// Returns the dispatcher shared by the session and webhooks.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.inner.engine.dispatcher()
    }
}

// ============================================================================
// Client - Actions & Markup
// ============================================================================

impl Client {
    /// Returns the action client.
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &ActionClient {
        &self.inner.actions
    }

    /// Returns a codec using the client's markup schema.
    #[must_use]
    pub fn codec(&self) -> MarkupCodec {
        MarkupCodec::new(Arc::clone(&self.inner.registry))
    }

    /// Creates a webhook endpoint delivering into this client's dispatcher.
    ///
    /// With `token` set, requests must carry `Authorization: Bearer <token>`.
    #[must_use]
    pub fn webhook(&self, token: Option<String>) -> WebhookServer {
        WebhookServer::new(
            token,
            Arc::clone(self.dispatcher()),
            Arc::clone(&self.inner.registry),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
