//! HTTP listener for set-top box event notifications.
//!
//! The box pushes state changes to the callback URL registered with its
//! SUBSCRIBE request. This crate runs that endpoint: it binds a local port,
//! accepts every request, drains the body, answers `200 OK`, and forwards a
//! [`NotificationPayload`] to a channel owned by the caller.
//!
//! # Trust boundary
//!
//! The listener performs no authentication and treats any inbound request
//! as a legitimate notification. It is meant for a private home network
//! where only the box can reach it.
//!
//! # Example
//!
//! ```no_run
//! use callback_server::{CallbackServer, NotificationPayload};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), callback_server::ServerError> {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<NotificationPayload>();
//!     let server = CallbackServer::bind(55123, tx).await?;
//!
//!     println!("Listening on port {}", server.port());
//!
//!     while let Some(notification) = rx.recv().await {
//!         println!("Notification for {:?}", notification.sid);
//!     }
//!
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod server;

pub use server::{detect_local_ip, CallbackServer, NotificationPayload, ServerError};
