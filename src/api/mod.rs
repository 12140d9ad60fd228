//! Control-plane HTTP client.
//!
//! Thin request/response wrapper around the remote socket API. The
//! supervisor only needs two calls: fetch a socket's metadata after
//! creation and replace its tags with the workflow identity merged in.
//! Socket deletion goes through the connector binary, not this client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CiContext;
use crate::{AppError, Result};

/// Production control-plane base URL.
pub const DEFAULT_API_BASE: &str = "https://api.border0.com/api/v1";

/// Fixed DNS suffix appended to every socket DNS name.
pub const DNS_SUFFIX: &str = ".border0.io";

/// Socket metadata as returned by `GET /socket/{name}`.
///
/// Unknown fields are retained through `extra` so the tag-update `PUT`
/// can send the full object back unchanged apart from the tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketInfo {
    /// Socket name (equals the session name).
    pub name: String,
    /// Fully qualified DNS name of the endpoint.
    pub dnsname: String,
    /// Tag mapping; replaced wholesale by [`ControlPlaneClient::replace_tags`].
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Remaining socket fields, passed through verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request/response client for the remote socket API.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ControlPlaneClient {
    /// Client against the production control plane.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, token)
    }

    /// Client against an explicit base URL (used by tests and overrides).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    /// Fetch socket metadata by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`] on transport failure or a non-2xx
    /// response.
    pub async fn fetch_socket(&self, name: &str) -> Result<SocketInfo> {
        let url = format!("{}/socket/{name}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .header("x-access-token", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Api(format!("failed to query socket {name}: {err}")))?;
        Ok(response.json().await?)
    }

    /// Replace the socket's tags by `PUT`ting the full socket body back.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`] on transport failure or a non-2xx
    /// response. Call sites treat this as best-effort.
    pub async fn replace_tags(&self, socket: &SocketInfo) -> Result<()> {
        let url = format!("{}/socket/{}", self.base_url, socket.name);
        self.http
            .put(&url)
            .header("accept", "application/json")
            .header("x-access-token", &self.token)
            .json(socket)
            .send()
            .await?
            .error_for_status()
            .map_err(|err| {
                AppError::Api(format!("failed to update tags for {}: {err}", socket.name))
            })?;
        info!(socket = %socket.name, "socket tags updated");
        Ok(())
    }
}

/// Tags identifying the workflow run that owns the socket.
#[must_use]
pub fn workflow_tags(ci: &CiContext) -> HashMap<String, String> {
    let icon_text = format!("{} action #{}", ci.workflow, ci.run_id);
    HashMap::from([
        ("border0_client_category".to_owned(), "GitHub Actions".to_owned()),
        ("border0_client_subcategory".to_owned(), ci.repository.clone()),
        (
            "border0_client_icon".to_owned(),
            "devicon-plain:githubactions".to_owned(),
        ),
        ("provider_type".to_owned(), "azure".to_owned()),
        ("border0_client_icon_text".to_owned(), icon_text),
    ])
}

/// Merge the workflow-identity tags into the socket's existing tags.
pub fn merge_workflow_tags(socket: &mut SocketInfo, ci: &CiContext) {
    socket.tags.extend(workflow_tags(ci));
}

/// Extract the organization name from a socket DNS name.
///
/// The DNS name has the shape `<session>.<org><suffix>`; the org is what
/// remains after stripping the session prefix and the fixed suffix.
/// Returns `None` when the DNS name does not match that shape.
#[must_use]
pub fn org_from_dns_name(dns_name: &str, session_name: &str) -> Option<String> {
    dns_name
        .strip_prefix(session_name)?
        .strip_prefix('.')?
        .strip_suffix(DNS_SUFFIX)
        .map(str::to_owned)
}
