//! Remote control for Sky+ set-top boxes
//!
//! This crate drives a box's UPnP control interface, reads programme data
//! from the public EPG services and keeps an event subscription through
//! which the box reports state changes. It uses the private `soap-client`
//! crate for the SOAP exchange and `callback-server` for inbound events.
//!
//! # Example
//!
//! ```rust,ignore
//! use skyplus_api::{SkyBox, SkyConfig};
//!
//! let sky = SkyBox::new(SkyConfig::new("192.168.1.193", 49153))?;
//! sky.pause().await?;
//!
//! let mut monitor = sky.monitor().await?;
//! while let Some(event) = monitor.recv().await {
//!     println!("{}", event.body);
//! }
//! sky.cancel_subscription().await?;
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod discovery;
pub mod epg;
pub mod error;
pub mod listings;
pub mod logging;
pub mod media_info;
pub mod operation;
pub mod operations;
pub mod programme;
pub mod service;
pub mod subscription;

pub use callback_server::NotificationPayload;
pub use client::SkyClient;
pub use config::SkyConfig;
pub use device::{Monitor, SkyBox};
pub use discovery::{detect, DetectedDevice};
pub use epg::SkyEpgClient;
pub use error::{ApiError, Result};
pub use listings::{ListingAggregator, ProgrammeSource};
pub use media_info::MediaInfo;
pub use operation::SkyOperation;
pub use programme::{NowNext, Programme};
pub use service::{Service, ServiceInfo};
pub use soap_client::DeviceEndpoint;
pub use subscription::{CancelOutcome, SubscriptionManager};
