//! The [`SkyBox`] facade: one controlled box and everything attached to it

use callback_server::{detect_local_ip, CallbackServer, NotificationPayload};
use rand::Rng;
use soap_client::SoapClient;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::client::SkyClient;
use crate::config::SkyConfig;
use crate::epg::SkyEpgClient;
use crate::listings::{ListingAggregator, ProgrammeSource};
use crate::media_info::MediaInfo;
use crate::operations::sky_play::{
    GetMediaInfoOperation, GetMediaInfoRequest, PauseOperation, PauseRequest, PlayOperation,
    PlayRequest, SetAVTransportURIOperation, SetAVTransportURIRequest,
};
use crate::programme::{NowNext, Programme};
use crate::subscription::{CancelOutcome, SubscriptionManager};
use crate::{ApiError, Result};

/// Remote control for one Sky+ box
///
/// Owns the control client, the event subscription and the listing
/// aggregator. Subscription state belongs to this instance; two `SkyBox`
/// values for the same box track their subscriptions independently.
///
/// # Example
/// ```rust,ignore
/// let sky = SkyBox::new(SkyConfig::new("192.168.1.193", 49153))?;
///
/// sky.change_channel_id(2002).await?;
/// if let Some(channel) = sky.get_media_info().await?.channel_id() {
///     let on = sky.whats_on(channel).await?;
///     println!("{} then {}", on.now.title, on.next.title);
/// }
/// ```
#[derive(Debug)]
pub struct SkyBox {
    config: SkyConfig,
    client: SkyClient,
    subscriptions: SubscriptionManager,
    listings: ListingAggregator,
}

impl SkyBox {
    /// Create a facade for the box described by `config`
    pub fn new(config: SkyConfig) -> Result<Self> {
        config.validate()?;

        let soap_client = SoapClient::with_timeout(config.request_timeout);
        let source: Arc<dyn ProgrammeSource> = Arc::new(SkyEpgClient::from_config(&config));

        Ok(Self {
            client: SkyClient::with_soap_client(config.endpoint.clone(), soap_client.clone()),
            subscriptions: SubscriptionManager::new(soap_client, config.endpoint.clone()),
            listings: ListingAggregator::new(source, config.listing_timeout),
            config,
        })
    }

    /// Replace where programme data comes from
    pub fn with_programme_source(mut self, source: Arc<dyn ProgrammeSource>) -> Self {
        self.listings = ListingAggregator::new(source, self.config.listing_timeout);
        self
    }

    pub fn config(&self) -> &SkyConfig {
        &self.config
    }

    pub async fn play(&self) -> Result<()> {
        self.client
            .execute::<PlayOperation>(&PlayRequest::default())
            .await
    }

    pub async fn pause(&self) -> Result<()> {
        self.client
            .execute::<PauseOperation>(&PauseRequest::default())
            .await
    }

    /// Tune to a channel by its hexadecimal id
    pub async fn change_channel_hex_id(&self, channel_hex_id: &str) -> Result<()> {
        tracing::debug!(channel_hex_id, "Changing channel");
        self.client
            .execute::<SetAVTransportURIOperation>(&SetAVTransportURIRequest::channel(
                channel_hex_id,
            ))
            .await
    }

    /// Tune to a channel by its decimal id
    pub async fn change_channel_id(&self, channel_id: u32) -> Result<()> {
        self.change_channel_hex_id(&format!("{:x}", channel_id))
            .await
    }

    /// What the box is showing
    pub async fn get_media_info(&self) -> Result<MediaInfo> {
        self.client
            .execute::<GetMediaInfoOperation>(&GetMediaInfoRequest::default())
            .await
    }

    /// Today's listing for `channel_id`, sorted by start
    pub async fn get_channel_listing(&self, channel_id: u32) -> Result<Vec<Programme>> {
        self.listings.channel_listing(channel_id).await
    }

    pub async fn whats_on(&self, channel_id: u32) -> Result<NowNext> {
        self.listings.whats_on(channel_id).await
    }

    /// Subscribe with an explicit callback address.
    ///
    /// Renews when the active subscription already points at this address;
    /// otherwise the old one is cancelled and a new one registered.
    pub async fn subscribe(
        &self,
        callback_host: &str,
        callback_port: u16,
    ) -> Result<Option<String>> {
        self.subscriptions
            .subscribe(callback_host, callback_port)
            .await
    }

    /// Start a callback listener and subscribe to events with it.
    ///
    /// The listener port is picked at random from the configured range. Any
    /// subscription pointing elsewhere is replaced, so the returned monitor
    /// always receives the events. When the subscription request fails the
    /// listener is stopped again.
    pub async fn monitor(&self) -> Result<Monitor> {
        let callback_host = self.callback_host()?;
        let port = random_port(self.config.callback_port_range);

        let (sender, notifications) = mpsc::unbounded_channel();
        let server = CallbackServer::bind(port, sender)
            .await
            .map_err(|e| ApiError::SubscriptionError(e.to_string()))?;

        match self.subscribe(&callback_host, server.port()).await {
            Ok(sid) => Ok(Monitor {
                sid,
                callback_host,
                notifications,
                server,
            }),
            Err(e) => {
                server.shutdown().await;
                Err(e)
            }
        }
    }

    pub async fn cancel_subscription(&self) -> Result<CancelOutcome> {
        self.subscriptions.cancel().await
    }

    pub fn subscription_id(&self) -> Option<String> {
        self.subscriptions.subscription_id()
    }

    fn callback_host(&self) -> Result<String> {
        match &self.config.callback_host {
            Some(host) => Ok(host.clone()),
            None => detect_local_ip().map(|ip| ip.to_string()).ok_or_else(|| {
                ApiError::SubscriptionError(
                    "Could not determine a local address for callbacks".to_string(),
                )
            }),
        }
    }
}

fn random_port((start, end): (u16, u16)) -> u16 {
    rand::thread_rng().gen_range(start..=end)
}

/// A running event monitor returned by [`SkyBox::monitor`]
///
/// Dropping it stops the listener. The subscription itself stays registered
/// on the box until [`SkyBox::cancel_subscription`] is called.
#[derive(Debug)]
pub struct Monitor {
    sid: Option<String>,
    callback_host: String,
    notifications: mpsc::UnboundedReceiver<NotificationPayload>,
    server: CallbackServer,
}

impl Monitor {
    /// SID the box issued, if any
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.server.port()
    }

    /// URL registered with the box
    pub fn callback_url(&self) -> String {
        crate::Service::SkyPlay.callback_url(&self.callback_host, self.server.port())
    }

    /// Next notification from the box; `None` once the listener has stopped
    pub async fn recv(&mut self) -> Option<NotificationPayload> {
        self.notifications.recv().await
    }

    /// Stop the listener
    pub async fn shutdown(self) {
        self.server.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_port_stays_in_range() {
        for _ in 0..100 {
            let port = random_port((50000, 50010));
            assert!((50000..=50010).contains(&port));
        }
        assert_eq!(random_port((55555, 55555)), 55555);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SkyConfig::new("", 49153);
        assert!(matches!(SkyBox::new(config), Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn test_callback_host_prefers_config() {
        let sky = SkyBox::new(SkyConfig::default().with_callback_host("10.1.2.3")).unwrap();
        assert_eq!(sky.callback_host().unwrap(), "10.1.2.3");
    }

    #[test]
    fn test_starts_without_subscription() {
        let sky = SkyBox::new(SkyConfig::default()).unwrap();
        assert_eq!(sky.subscription_id(), None);
    }
}
