//! Private SOAP client for set-top box communication
//!
//! This crate provides a minimal async SOAP client for the Sky+ box's UPnP
//! control interface. It builds and decodes envelopes, posts actions, and
//! sends the raw SUBSCRIBE/UNSUBSCRIBE requests used for event subscriptions.
//! Higher level semantics (which actions exist, what the replies mean, the
//! subscription state machine) live in `skyplus-api`.

pub mod envelope;
mod error;

pub use envelope::{action_payload, build_envelope, decode_envelope, ActionRequest};
pub use error::SoapError;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// User agent the box expects from its own remote-control apps
pub const USER_AGENT: &str = "SKY_skyplus";

/// Network address of the controlled box.
///
/// `path_override`, when set, replaces the path of every control request
/// sent to the device. Event requests always use the service's event path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub path_override: Option<String>,
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path_override: None,
        }
    }

    pub fn with_path_override(mut self, path: impl Into<String>) -> Self {
        self.path_override = Some(path.into());
        self
    }

    /// Full URL for a control request to `path`, honouring the override
    pub fn url(&self, path: &str) -> String {
        self.join(self.path_override.as_deref().unwrap_or(path))
    }

    /// Full URL for a GENA request to `path`; the override does not apply
    pub fn event_url(&self, path: &str) -> String {
        self.join(path)
    }

    fn join(&self, path: &str) -> String {
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("http://{}:{}{}{}", self.host, self.port, separator, path)
    }
}

/// Decoded reply to one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    action: String,
    body: Value,
}

impl ActionResponse {
    pub fn new(action: impl Into<String>, body: Value) -> Self {
        Self {
            action: action.into(),
            body,
        }
    }

    /// The whole decoded `s:Body`
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The `<Action>Response` element, whatever prefix the device used for it
    pub fn response_element(&self) -> Option<&Value> {
        let expected = format!("{}Response", self.action);
        self.body.as_object()?.iter().find_map(|(key, value)| {
            let local = key.rsplit(':').next().unwrap_or(key);
            (local == expected).then_some(value)
        })
    }

    /// A string field of the `<Action>Response` element
    pub fn field(&self, name: &str) -> Option<&str> {
        self.response_element()?.get(name)?.as_str()
    }
}

/// Result of a SUBSCRIBE request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    /// HTTP status of the reply
    pub status: u16,
    /// Session id from the `SID` header, when the device issued one
    pub sid: Option<String>,
}

/// A minimal SOAP client for the box's control interface
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
}

impl SoapClient {
    /// Create a new SOAP client with a 10 second request timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a SOAP client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .http1_title_case_headers()
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self { http }
    }

    /// Send one action and decode the reply.
    ///
    /// The reply body is read to the end before it is decoded.
    pub async fn call(
        &self,
        endpoint: &DeviceEndpoint,
        path: &str,
        request: &ActionRequest,
    ) -> Result<ActionResponse, SoapError> {
        let url = endpoint.url(path);
        let body = build_envelope(action_payload(request))?;

        tracing::debug!(action = %request.action, %url, "Sending SOAP action");

        let response = self
            .http
            .post(&url)
            .header("USER-AGENT", USER_AGENT)
            .header("SOAPACTION", request.soap_action())
            .header("CONTENT-TYPE", "text/xml; charset=\"utf-8\"")
            .body(body)
            .send()
            .await
            .map_err(|e| log_failure(&request.action, e.into()))?;

        let status = response.status();
        let xml_text = response
            .text()
            .await
            .map_err(|e| log_failure(&request.action, e.into()))?;

        match decode_envelope(&xml_text) {
            Ok(body) => Ok(ActionResponse::new(request.action.clone(), body)),
            Err(SoapError::Parse(msg)) if !status.is_success() => Err(log_failure(
                &request.action,
                SoapError::Network(format!("HTTP {}: {}", status, msg)),
            )),
            Err(e) => Err(log_failure(&request.action, e)),
        }
    }

    /// Send a fresh SUBSCRIBE request.
    ///
    /// # Arguments
    /// * `endpoint` - The device
    /// * `path` - Event path, e.g. `/SkyPlay2`
    /// * `callback_url` - Full callback URL, without angle brackets
    pub async fn subscribe(
        &self,
        endpoint: &DeviceEndpoint,
        path: &str,
        callback_url: &str,
    ) -> Result<SubscriptionResponse, SoapError> {
        let response = self
            .http
            .request(subscribe_method(), endpoint.event_url(path))
            .header("CALLBACK", format!("<{}>", callback_url))
            .header("NT", "upnp:event")
            .send()
            .await?;

        Self::read_subscription_response(response).await
    }

    /// Renew an existing subscription by sending SUBSCRIBE with its SID.
    pub async fn renew_subscription(
        &self,
        endpoint: &DeviceEndpoint,
        path: &str,
        sid: &str,
    ) -> Result<SubscriptionResponse, SoapError> {
        let response = self
            .http
            .request(subscribe_method(), endpoint.event_url(path))
            .header("SID", sid)
            .send()
            .await?;

        Self::read_subscription_response(response).await
    }

    /// Cancel a subscription
    pub async fn unsubscribe(
        &self,
        endpoint: &DeviceEndpoint,
        path: &str,
        sid: &str,
    ) -> Result<(), SoapError> {
        let response = self
            .http
            .request(unsubscribe_method(), endpoint.event_url(path))
            .header("SID", sid)
            .send()
            .await?;

        let status = response.status();
        // drain so the connection is reusable
        let _ = response.bytes().await?;

        if !status.is_success() {
            return Err(SoapError::Network(format!("UNSUBSCRIBE failed: HTTP {}", status)));
        }

        Ok(())
    }

    async fn read_subscription_response(
        response: reqwest::Response,
    ) -> Result<SubscriptionResponse, SoapError> {
        let status = response.status();
        let sid = response
            .headers()
            .get("SID")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let _ = response.bytes().await?;

        if status != StatusCode::OK {
            tracing::warn!("SUBSCRIBE answered with HTTP {}", status);
        }

        Ok(SubscriptionResponse {
            status: status.as_u16(),
            sid,
        })
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn subscribe_method() -> Method {
    Method::from_bytes(b"SUBSCRIBE").unwrap_or(Method::POST)
}

fn unsubscribe_method() -> Method {
    Method::from_bytes(b"UNSUBSCRIBE").unwrap_or(Method::POST)
}

fn log_failure(action: &str, error: SoapError) -> SoapError {
    tracing::warn!(%action, "SOAP action failed: {}", error);
    error
}
