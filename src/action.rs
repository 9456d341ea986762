//! Action RPC client.
//!
//! Every action is an HTTP POST to `<base>/<version>/<resource>.<method>`
//! with a JSON body and these headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `Authorization` | `Bearer <token>` (when a token is set) |
//! | `X-Platform` | platform of the bot account |
//! | `X-Self-ID` | id of the bot account |
//!
//! # Example
//!
//! ```ignore
//! use chatlink::action::ActionClient;
//! use chatlink::markup::builders::{at, text};
//!
//! let actions = ActionClient::new(base, "v1", Some("secret".into()), "discord", "1234")?;
//! actions.message_create("channel-1", &[at("user-9"), text(" hello")]).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::markup::{Element, encode};
use crate::protocol::{Login, Message};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for one action request.
const ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform header name.
const PLATFORM_HEADER: &str = "X-Platform";

/// Bot account header name.
const SELF_ID_HEADER: &str = "X-Self-ID";

// ============================================================================
// ActionClient
// ============================================================================

/// Issues actions on behalf of one bot account.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ActionClient {
    http: reqwest::Client,
    base: Url,
    version: String,
    token: Option<String>,
    platform: String,
    self_id: String,
}

impl fmt::Debug for ActionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionClient")
            .field("base", &self.base.as_str())
            .field("version", &self.version)
            .field("platform", &self.platform)
            .field("self_id", &self.self_id)
            .finish_non_exhaustive()
    }
}

impl ActionClient {
    /// Creates a client for `<base>/<version>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be initialized.
    pub fn new(
        base: Url,
        version: impl Into<String>,
        token: Option<String>,
        platform: impl Into<String>,
        self_id: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(ACTION_TIMEOUT).build()?;

        Ok(Self {
            http,
            base,
            version: version.into(),
            token,
            platform: platform.into(),
            self_id: self_id.into(),
        })
    }

    /// Returns the URL of `resource.method`.
    #[must_use]
    pub fn endpoint(&self, resource: &str, method: &str) -> String {
        format!(
            "{}/{}/{resource}.{method}",
            self.base.as_str().trim_end_matches('/'),
            self.version
        )
    }

    /// Calls `resource.method` with a JSON body.
    ///
    /// Returns the decoded response body, or `Value::Null` when it is empty.
    ///
    /// # Errors
    ///
    /// - [`Error::Action`] if the server answers with a non-success status
    /// - [`Error::Http`] if the request fails
    /// - [`Error::Json`] if the response is not JSON
    pub async fn call(&self, resource: &str, method: &str, body: &Value) -> Result<Value> {
        let name = format!("{resource}.{method}");
        let url = self.endpoint(resource, method);
        debug!(action = %name, "Calling action");

        let mut request = self
            .http
            .post(&url)
            .header(PLATFORM_HEADER, &self.platform)
            .header(SELF_ID_HEADER, &self.self_id)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(action = %name, status = status.as_u16(), "Action failed");
            return Err(Error::action(name, status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Calls an action and decodes its response into `T`.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        resource: &str,
        method: &str,
        body: &Value,
    ) -> Result<T> {
        let value = self.call(resource, method, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends a message to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAttributeType`] if the content cannot be
    /// encoded, otherwise see [`call`](Self::call).
    pub async fn message_create(
        &self,
        channel_id: &str,
        content: &[Element],
    ) -> Result<Vec<Message>> {
        let content = encode(content)?;
        let body = json!({ "channel_id": channel_id, "content": content });

        match self.call("message", "create", &body).await? {
            Value::Null => Ok(Vec::new()),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    /// Registers a webhook the server will POST events to.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn admin_webhook_create(&self, url: &str, token: Option<&str>) -> Result<()> {
        let body = json!({ "url": url, "token": token });
        self.call("admin/webhook", "create", &body).await?;
        Ok(())
    }

    /// Unregisters a webhook.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn admin_webhook_delete(&self, url: &str) -> Result<()> {
        self.call("admin/webhook", "delete", &json!({ "url": url }))
            .await?;
        Ok(())
    }

    /// Fetches the login of this bot account.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn login_get(&self) -> Result<Login> {
        self.call_as("login", "get", &json!({})).await
    }
}

// ============================================================================
// Tests
// ============================================================================
