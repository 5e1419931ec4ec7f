//! HTTP server for receiving event notifications.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::sync::{mpsc, oneshot};
use warp::http::StatusCode;
use warp::Filter;

/// One notification pushed by the box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    /// Subscription id from the `SID` header, if the sender set one
    pub sid: Option<String>,
    /// HTTP method, normally `NOTIFY`
    pub method: String,
    /// Request path the box used
    pub path: String,
    /// Raw body, usually a UPnP property set
    pub body: String,
}

/// Errors raised while starting the listener
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind port {port}: {reason}")]
    Bind { port: u16, reason: String },
}

/// HTTP listener for event notifications.
///
/// Every request on every path is acknowledged with `200`, body `OK`,
/// `Content-Type: text/plain`. There is no authentication; see the crate
/// documentation for the trust assumption.
#[derive(Debug)]
pub struct CallbackServer {
    /// The port the server is bound to
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CallbackServer {
    /// Start a listener on exactly `port`.
    ///
    /// Notifications are forwarded to `event_sender`; the server keeps
    /// acknowledging requests even after the receiver is dropped.
    pub async fn bind(
        port: u16,
        event_sender: mpsc::UnboundedSender<NotificationPayload>,
    ) -> Result<Self, ServerError> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let (bound, server) = warp::serve(notification_route(event_sender))
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| ServerError::Bind {
                port,
                reason: e.to_string(),
            })?;

        tracing::info!("Callback server listening on {}", bound);
        let server_handle = tokio::spawn(server);

        Ok(Self {
            port: bound.port(),
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Get the port the server is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }

        tracing::debug!("Callback server on port {} stopped", self.port);
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Detect the local IP address the box should call back to.
///
/// Uses a connected UDP socket to find the interface that routes outwards.
/// No data is sent.
pub fn detect_local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}

fn notification_route(
    event_sender: mpsc::UnboundedSender<NotificationPayload>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::method()
        .and(warp::path::full())
        .and(warp::header::optional::<String>("sid"))
        .and(warp::body::bytes())
        .map(
            move |method: warp::http::Method,
                  path: warp::path::FullPath,
                  sid: Option<String>,
                  body: bytes::Bytes| {
                let payload = NotificationPayload {
                    sid,
                    method: method.to_string(),
                    path: path.as_str().to_string(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                };

                tracing::info!(
                    method = %payload.method,
                    sid = ?payload.sid,
                    bytes = body.len(),
                    "Notification received"
                );

                if event_sender.send(payload).is_err() {
                    tracing::debug!("Notification receiver dropped, acknowledging anyway");
                }

                acknowledge()
            },
        )
}

fn acknowledge() -> impl warp::Reply {
    warp::reply::with_header(
        warp::reply::with_status("OK", StatusCode::OK),
        "content-type",
        "text/plain",
    )
}
