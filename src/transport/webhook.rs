//! Inbound HTTP listener.
//!
//! The server POSTs one event per request to a path registered through
//! [`ActionClient::admin_webhook_create`](crate::action::ActionClient::admin_webhook_create).
//!
//! | Condition | Status |
//! |-----------|--------|
//! | `Authorization` does not match the token | `401` |
//! | Event decoded and dispatched | `200` |
//! | Decode or listener failure | `500` |
//!
//! The listener is not restarted if it fails; [`WebhookServer::serve`]
//! returns the error to the caller.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::markup::{ElementRegistry, MarkupCodec};
use crate::protocol::Event;
use crate::session::Dispatcher;

// ============================================================================
// WebhookServer
// ============================================================================

/// HTTP endpoint delivering events to a dispatcher.
///
/// # Example
///
/// ```ignore
/// use tokio_util::sync::CancellationToken;
///
/// let webhook = WebhookServer::new(Some("secret".into()), dispatcher, standard_registry());
/// let shutdown = CancellationToken::new();
/// webhook.serve("0.0.0.0:8080".parse()?, "/chat/events", shutdown.clone()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct WebhookServer {
    state: WebhookState,
}

/// State shared with the request handler.
#[derive(Clone)]
struct WebhookState {
    token: Option<Arc<str>>,
    dispatcher: Arc<Dispatcher>,
    codec: MarkupCodec,
}

impl std::fmt::Debug for WebhookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookState")
            .field("authenticated", &self.token.is_some())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl WebhookServer {
    /// Creates a webhook endpoint.
    ///
    /// With `token` set, every request must carry
    /// `Authorization: Bearer <token>`.
    #[must_use]
    pub fn new(
        token: Option<String>,
        dispatcher: Arc<Dispatcher>,
        registry: Arc<ElementRegistry>,
    ) -> Self {
        Self {
            state: WebhookState {
                token: token.map(Arc::from),
                dispatcher,
                codec: MarkupCodec::new(registry),
            },
        }
    }

    /// Builds a router accepting events on `path`.
    pub fn router(&self, path: &str) -> Router {
        Router::new()
            .route(path, post(handle_event))
            .with_state(self.state.clone())
    }

    /// Binds `addr` and serves until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding or serving fails.
    pub async fn serve(
        &self,
        addr: SocketAddr,
        path: &str,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener, path, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if serving fails.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        path: &str,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!(addr = %listener.local_addr()?, path, "Webhook listening");

        axum::serve(listener, self.router(path))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Webhook stopped");
        Ok(())
    }
}

// ============================================================================
// Handler
// ============================================================================

/// POST handler: authenticate, decode, dispatch.
async fn handle_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if !state.is_authorized(&headers) {
        warn!("Rejected webhook request with bad credentials");
        return StatusCode::UNAUTHORIZED;
    }

    match state.process(&body).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(error = %e, body = %body, "Webhook event failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl WebhookState {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = self.token.as_deref() else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| bool::from(presented.as_bytes().ct_eq(token.as_bytes())))
    }

    async fn process(&self, body: &str) -> Result<()> {
        let mut event = Event::from_json(body)?;
        event.decode_content(&self.codec)?;
        debug!(event_id = event.id, event_type = %event.event_type, "Webhook event");
        self.dispatcher.dispatch(event).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use crate::error::Error;
    use crate::markup::standard_registry;

    const PATH: &str = "/hook";

    const EVENT: &str = r#"{
        "id": 11,
        "type": "message-created",
        "channel": {"id": "c", "type": 0},
        "user": {"id": "u"},
        "message": {"id": "m", "content": "<at id=\"u2\"/> ping"}
    }"#;

    fn server_with_sink() -> (WebhookServer, mpsc::UnboundedReceiver<Arc<Event>>) {
        let dispatcher = Arc::new(Dispatcher::new());
        let (tx, rx) = mpsc::unbounded_channel();
        dispatcher.on("message-created", move |event: Arc<Event>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
                Ok::<(), Error>(())
            }
        });
        let server = WebhookServer::new(Some("secret".into()), dispatcher, standard_registry());
        (server, rx)
    }

    fn request(auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(PATH)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_authorized_event() {
        let (server, mut events) = server_with_sink();
        let app = server.router(PATH);

        let resp = app
            .oneshot(request(Some("Bearer secret"), EVENT))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let event = events.recv().await.expect("event");
        assert_eq!(event.id, 11);
        let message = event.require_message().expect("message");
        assert_eq!(message.elements[0].attr_str("id"), Some("u2"));
    }

    #[tokio::test]
    async fn test_rejects_bad_token() {
        let (server, mut events) = server_with_sink();

        let resp = server
            .router(PATH)
            .oneshot(request(Some("Bearer wrong"), EVENT))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = server
            .router(PATH)
            .oneshot(request(None, EVENT))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejects_near_miss_tokens() {
        let (server, mut events) = server_with_sink();

        for auth in ["Bearer secreT", "Bearer secre", "Bearer secret2", "Bearer ", "secret"] {
            let resp = server
                .router(PATH)
                .oneshot(request(Some(auth), EVENT))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "accepted {auth:?}");
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let (server, _events) = server_with_sink();

        let resp = server
            .router(PATH)
            .oneshot(request(Some("Bearer secret"), "{\"type\": 1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bad_content_is_500() {
        let (server, mut events) = server_with_sink();
        let body = r#"{"id": 1, "type": "message-created",
            "message": {"id": "m", "content": "<img cache=\"maybe\"/>"}}"#;

        let resp = server
            .router(PATH)
            .oneshot(request(Some("Bearer secret"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_listener_failure_is_500() {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.on_any(|_event: Arc<Event>| async { Err::<(), _>(Error::transport("down")) });
        let server = WebhookServer::new(None, dispatcher, standard_registry());

        let resp = server
            .router(PATH)
            .oneshot(request(None, EVENT))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_no_token_accepts_all() {
        let dispatcher = Arc::new(Dispatcher::new());
        let server = WebhookServer::new(None, dispatcher, standard_registry());

        let resp = server
            .router(PATH)
            .oneshot(request(None, EVENT))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let (server, _events) = server_with_sink();
        let req = Request::builder()
            .method("GET")
            .uri(PATH)
            .body(Body::empty())
            .unwrap();

        let resp = server.router(PATH).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_serve_on_until_shutdown() {
        let (server, mut events) = server_with_sink();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let shutdown = CancellationToken::new();

        let task = tokio::spawn({
            let server = server.clone();
            let shutdown = shutdown.clone();
            async move { server.serve_on(listener, PATH, shutdown).await }
        });

        let resp = reqwest::Client::new()
            .post(format!("http://{addr}{PATH}"))
            .bearer_auth("secret")
            .body(EVENT)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(events.recv().await.expect("event").id, 11);

        shutdown.cancel();
        task.await.expect("join").expect("serve");
    }
}
