//! Configuration for talking to a box and its metadata services
//!
//! [`SkyConfig`] carries the device endpoint plus the timeouts, callback
//! settings and metadata base URLs used by [`crate::SkyBox`].

use soap_client::DeviceEndpoint;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Port the box's UPnP control interface listens on
pub const DEFAULT_PORT: u16 = 49153;

/// Base URL of the day-listing service (metadata source A)
pub const DEFAULT_LISTINGS_BASE_URL: &str = "http://tv.sky.com/programme";

/// Base URL of the now/next service (metadata source B)
pub const DEFAULT_NOW_NEXT_BASE_URL: &str = "http://epgservices.sky.com/5.1.1/api/2.0";

/// Configuration for a [`crate::SkyBox`]
#[derive(Debug, Clone)]
pub struct SkyConfig {
    /// The box to control
    pub endpoint: DeviceEndpoint,

    /// Timeout for every request sent to the box
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Timeout for each listing part fetch
    /// Default: 15 seconds
    pub listing_timeout: Duration,

    /// Inclusive range the monitor picks its callback port from
    /// Default: (50000, 65000)
    pub callback_port_range: (u16, u16),

    /// Host the box should send notifications to
    /// Default: None (detect the local address)
    pub callback_host: Option<String>,

    /// Base URL for day listings
    pub listings_base_url: String,

    /// Base URL for now/next lookups
    pub now_next_base_url: String,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            endpoint: DeviceEndpoint::new("192.168.1.193", DEFAULT_PORT),
            request_timeout: Duration::from_secs(10),
            listing_timeout: Duration::from_secs(15),
            callback_port_range: (50000, 65000),
            callback_host: None,
            listings_base_url: DEFAULT_LISTINGS_BASE_URL.to_string(),
            now_next_base_url: DEFAULT_NOW_NEXT_BASE_URL.to_string(),
        }
    }
}

impl SkyConfig {
    /// Defaults, pointed at `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            endpoint: DeviceEndpoint::new(host, port),
            ..Default::default()
        }
    }

    /// Read the endpoint from `SKY_HOST`, `SKY_PORT` and `SKY_PATH`.
    ///
    /// `SKY_HOST` is required; the port defaults to 49153.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SKY_HOST")
            .map_err(|_| ApiError::ConfigError("SKY_HOST is not set".to_string()))?;

        let port = match std::env::var("SKY_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|e| ApiError::ConfigError(format!("Invalid SKY_PORT '{}': {}", port, e)))?,
            Err(_) => DEFAULT_PORT,
        };

        let mut config = Self::new(host, port);
        if let Ok(path) = std::env::var("SKY_PATH") {
            config = config.with_path_override(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_path_override(mut self, path: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_path_override(path);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }

    pub fn with_callback_host(mut self, host: impl Into<String>) -> Self {
        self.callback_host = Some(host.into());
        self
    }

    pub fn with_callback_port_range(mut self, start: u16, end: u16) -> Self {
        self.callback_port_range = (start, end);
        self
    }

    /// Point both metadata sources somewhere else (mirrors, tests)
    pub fn with_metadata_base_urls(
        mut self,
        listings: impl Into<String>,
        now_next: impl Into<String>,
    ) -> Self {
        self.listings_base_url = listings.into();
        self.now_next_base_url = now_next.into();
        self
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.host.trim().is_empty() {
            return Err(ApiError::ConfigError("Device host is empty".to_string()));
        }

        let (start, end) = self.callback_port_range;
        if start > end {
            return Err(ApiError::ConfigError(format!(
                "Callback port range {}-{} is inverted",
                start, end
            )));
        }

        if self.request_timeout.is_zero() || self.listing_timeout.is_zero() {
            return Err(ApiError::ConfigError("Timeouts must be non-zero".to_string()));
        }

        Ok(())
    }
}
