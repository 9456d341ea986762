//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use chatlink::Client;
//!
//! # fn example() -> chatlink::Result<()> {
//! let client = Client::builder()
//!     .endpoint("https://chat.example.com")
//!     .token("secret")
//!     .platform("discord")
//!     .self_id("1234")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::markup::ElementRegistry;
use crate::session::SessionOptions;
use crate::transport::Connector;

use super::core::Client;

// ============================================================================
// Constants
// ============================================================================

/// API version used when none is set.
pub const DEFAULT_VERSION: &str = "v1";

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
pub struct ClientBuilder {
    /// Server base URL.
    endpoint: Option<String>,
    /// API version path segment.
    version: String,
    /// Bearer token for the handshake and actions.
    token: Option<String>,
    /// Platform of the bot account.
    platform: String,
    /// Id of the bot account.
    self_id: String,
    /// Session timing options.
    options: SessionOptions,
    /// Markup schema; the standard one when unset.
    registry: Option<Arc<ElementRegistry>>,
    /// Replaces the WebSocket connector.
    connector: Option<Box<dyn Connector>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            version: DEFAULT_VERSION.to_owned(),
            token: None,
            platform: String::new(),
            self_id: String::new(),
            options: SessionOptions::default(),
            registry: None,
            connector: None,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("platform", &self.platform)
            .field("self_id", &self.self_id)
            .field("options", &self.options)
            .field("custom_connector", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server base URL.
    ///
    /// Accepts `http`, `https`, `ws` and `wss` URLs. Actions go to
    /// `<endpoint>/<version>/<resource>.<method>` and the event channel to
    /// `<endpoint>/<version>/events`.
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL (e.g., "https://chat.example.com")
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the API version path segment (default `v1`).
    #[inline]
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the bearer token.
    ///
    /// Used for the handshake and for every action. Overrides the token of
    /// [`options`](Self::options).
    #[inline]
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the platform sent with every action.
    #[inline]
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Sets the bot account id sent with every action.
    #[inline]
    #[must_use]
    pub fn self_id(mut self, self_id: impl Into<String>) -> Self {
        self.self_id = self_id.into();
        self
    }

    /// Sets the session timing options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the markup schema used to decode message content.
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: Arc<ElementRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the WebSocket connector, e.g. with an in-memory one.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Builds the client with validation.
    ///
    /// Nothing is connected yet; call [`Client::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint is missing, malformed or uses an
    ///   unsupported scheme
    /// - [`Error::Config`] if the version is empty or the options are invalid
    /// - [`Error::Http`] if the HTTP client cannot be initialized
    pub fn build(self) -> Result<Client> {
        let base = self.validate_endpoint()?;
        self.validate_version()?;

        let mut options = self.options;
        if let Some(token) = &self.token {
            options.token = Some(token.clone());
        }
        options.validate().map_err(Error::config)?;

        let token = options.token.clone();

        Client::new(super::core::ClientParts {
            base,
            version: self.version,
            token,
            platform: self.platform,
            self_id: self.self_id,
            options,
            registry: self.registry,
            connector: self.connector,
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the endpoint and normalizes it to an HTTP base URL.
    fn validate_endpoint(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().ok_or_else(|| {
            Error::config(
                "Endpoint is required. Use .endpoint() to set it.\n\
                 Example: Client::builder().endpoint(\"https://chat.example.com\")",
            )
        })?;

        let mut url = Url::parse(raw)
            .map_err(|e| Error::config(format!("Invalid endpoint {raw:?}: {e}")))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "http",
            "https" | "wss" => "https",
            other => {
                return Err(Error::config(format!(
                    "Unsupported endpoint scheme {other:?}; expected http, https, ws or wss"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::config(format!("Cannot use scheme {scheme} for {raw}")))?;

        Ok(url)
    }

    /// Validates the version segment.
    fn validate_version(&self) -> Result<()> {
        let version = self.version.trim_matches('/');
        if version.is_empty() || version.contains('/') {
            return Err(Error::config(format!(
                "Invalid API version {:?}; expected a single path segment",
                self.version
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let builder = ClientBuilder::new();
        assert!(builder.endpoint.is_none());
        assert_eq!(builder.version, "v1");
        assert!(builder.token.is_none());
        assert!(builder.connector.is_none());
    }

    #[test]
    fn test_setters() {
        let builder = ClientBuilder::new()
            .endpoint("http://localhost:5140")
            .version("v2")
            .token("T0")
            .platform("x")
            .self_id("1");

        assert_eq!(builder.endpoint.as_deref(), Some("http://localhost:5140"));
        assert_eq!(builder.version, "v2");
        assert_eq!(builder.token.as_deref(), Some("T0"));
        assert_eq!(builder.platform, "x");
        assert_eq!(builder.self_id, "1");
    }

    #[test]
    fn test_debug_redacts_token() {
        let builder = ClientBuilder::new().token("very-secret");
        let debug = format!("{builder:?}");
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_build_fails_without_endpoint() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("Endpoint"));
    }

    #[test]
    fn test_build_fails_with_bad_scheme() {
        let err = ClientBuilder::new()
            .endpoint("ftp://host")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn test_build_fails_with_unparsable_endpoint() {
        let err = ClientBuilder::new()
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_fails_with_empty_version() {
        let err = ClientBuilder::new()
            .endpoint("http://host")
            .version("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_build_fails_with_invalid_options() {
        let err = ClientBuilder::new()
            .endpoint("http://host")
            .options(SessionOptions::new().with_pong_timeout(Duration::ZERO))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_endpoint_normalized_to_http() {
        let builder = ClientBuilder::new().endpoint("wss://host/api");
        let url = builder.validate_endpoint().expect("endpoint");
        assert_eq!(url.as_str(), "https://host/api");

        let builder = ClientBuilder::new().endpoint("ws://host:8080");
        let url = builder.validate_endpoint().expect("endpoint");
        assert_eq!(url.scheme(), "http");
    }
}
