//! Event subscription state for one box
//!
//! The box pushes state changes to a callback URL registered with a UPnP
//! `SUBSCRIBE`. [`SubscriptionManager`] owns the session id (SID) the box
//! hands out together with the callback it was registered for, and drives
//! the `Unsubscribed -> Subscribed -> Unsubscribed` lifecycle. There is no
//! expiry tracking; callers renew by subscribing again.
//!
//! Every state change bumps a generation counter. A request that finishes
//! after the state moved on (for example a renewal overtaken by a cancel)
//! does not write its result back.

use soap_client::{DeviceEndpoint, SoapClient};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ApiError, Result, Service};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSubscription {
    sid: String,
    callback_url: String,
}

#[derive(Debug, Default)]
struct SubscriptionState {
    generation: u64,
    active: Option<ActiveSubscription>,
}

impl SubscriptionState {
    fn replace(&mut self, active: Option<ActiveSubscription>) -> Option<ActiveSubscription> {
        self.generation += 1;
        std::mem::replace(&mut self.active, active)
    }
}

/// Result of [`SubscriptionManager::cancel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// No subscription was active; nothing was sent
    NothingToCancel,
    /// The subscription was dropped locally and an UNSUBSCRIBE was sent
    Cancelled { sid: String },
}

/// Tracks the event subscription with one box
#[derive(Debug)]
pub struct SubscriptionManager {
    soap_client: SoapClient,
    endpoint: DeviceEndpoint,
    service: Service,
    state: Mutex<SubscriptionState>,
}

impl SubscriptionManager {
    pub fn new(soap_client: SoapClient, endpoint: DeviceEndpoint) -> Self {
        Self {
            soap_client,
            endpoint,
            service: Service::SkyPlay,
            state: Mutex::new(SubscriptionState::default()),
        }
    }

    /// SID of the active subscription
    pub fn subscription_id(&self) -> Option<String> {
        self.lock_state().active.as_ref().map(|a| a.sid.clone())
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock_state().active.is_some()
    }

    /// Ask the box to send events to `callback_host:callback_port`.
    ///
    /// With no active subscription this registers a new one and returns the
    /// SID the box issued, or `None` when it issued none. An active
    /// subscription for the same callback is renewed instead. One registered
    /// for a different callback is cancelled first, then replaced.
    ///
    /// # Errors
    /// - `ApiError::SubscriptionError` if the box rejects a renewal (the
    ///   subscription is forgotten), or if the subscription was cancelled
    ///   while the request was in flight
    /// - Network errors from the request
    pub async fn subscribe(
        &self,
        callback_host: &str,
        callback_port: u16,
    ) -> Result<Option<String>> {
        let callback_url = self.service.callback_url(callback_host, callback_port);
        let (generation, active) = self.snapshot();

        match active {
            Some(active) if active.callback_url == callback_url => {
                self.renew(generation, active).await.map(Some)
            }
            Some(active) => {
                tracing::info!(
                    sid = %active.sid,
                    old = %active.callback_url,
                    new = %callback_url,
                    "Callback moved; replacing subscription"
                );
                self.cancel().await?;
                self.subscribe_new(callback_url).await
            }
            None => self.subscribe_new(callback_url).await,
        }
    }

    /// Drop the active subscription.
    ///
    /// Local state is cleared before the `UNSUBSCRIBE` goes out, so a box
    /// that never answers still leaves this manager unsubscribed. Delivery
    /// failures are logged, not returned.
    pub async fn cancel(&self) -> Result<CancelOutcome> {
        let previous = self.lock_state().replace(None);
        let Some(active) = previous else {
            tracing::info!("No subscription to cancel");
            return Ok(CancelOutcome::NothingToCancel);
        };

        self.send_unsubscribe(&active.sid).await;
        Ok(CancelOutcome::Cancelled { sid: active.sid })
    }

    async fn subscribe_new(&self, callback_url: String) -> Result<Option<String>> {
        let info = self.service.info();
        let generation = self.snapshot().0;

        tracing::debug!(%callback_url, "Subscribing to {} events", self.service.name());

        let response = self
            .soap_client
            .subscribe(&self.endpoint, info.event_endpoint, &callback_url)
            .await?;

        let Some(sid) = response.sid else {
            tracing::warn!(
                status = response.status,
                "SUBSCRIBE reply carried no SID; staying unsubscribed"
            );
            return Ok(None);
        };

        let active = ActiveSubscription {
            sid: sid.clone(),
            callback_url,
        };
        if !self.install(generation, active) {
            tracing::warn!(%sid, "Subscription changed while SUBSCRIBE was in flight");
            self.send_unsubscribe(&sid).await;
            return Err(ApiError::SubscriptionError(format!(
                "Subscription {} was superseded before it completed",
                sid
            )));
        }

        tracing::info!(%sid, "Subscribed to {} events", self.service.name());
        Ok(Some(sid))
    }

    async fn renew(&self, generation: u64, active: ActiveSubscription) -> Result<String> {
        let info = self.service.info();
        let response = self
            .soap_client
            .renew_subscription(&self.endpoint, info.event_endpoint, &active.sid)
            .await?;

        if !(200..300).contains(&response.status) {
            self.clear_if_current(generation);
            tracing::warn!(sid = %active.sid, status = response.status, "Renewal rejected");
            return Err(ApiError::SubscriptionError(format!(
                "Renewal of {} rejected with HTTP {}",
                active.sid, response.status
            )));
        }

        let renewed = ActiveSubscription {
            sid: response.sid.unwrap_or(active.sid),
            callback_url: active.callback_url,
        };
        let sid = renewed.sid.clone();
        if !self.install(generation, renewed) {
            tracing::info!(%sid, "Subscription cancelled while renewing; not restoring it");
            return Err(ApiError::SubscriptionError(format!(
                "Subscription {} was cancelled during renewal",
                sid
            )));
        }

        tracing::info!(%sid, "Renewed subscription");
        Ok(sid)
    }

    async fn send_unsubscribe(&self, sid: &str) {
        let info = self.service.info();
        match self
            .soap_client
            .unsubscribe(&self.endpoint, info.event_endpoint, sid)
            .await
        {
            Ok(()) => tracing::info!(%sid, "Cancelled subscription"),
            Err(e) => tracing::warn!(%sid, "UNSUBSCRIBE was not delivered: {}", e),
        }
    }

    fn snapshot(&self) -> (u64, Option<ActiveSubscription>) {
        let state = self.lock_state();
        (state.generation, state.active.clone())
    }

    /// Store `active` unless the state changed since `generation` was read
    fn install(&self, generation: u64, active: ActiveSubscription) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.replace(Some(active));
        true
    }

    fn clear_if_current(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation {
            state.replace(None);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SubscriptionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SubscriptionManager {
        SubscriptionManager::new(SoapClient::new(), DeviceEndpoint::new("127.0.0.1", 1))
    }

    fn active(sid: &str) -> ActiveSubscription {
        ActiveSubscription {
            sid: sid.to_string(),
            callback_url: Service::SkyPlay.callback_url("10.0.0.5", 51000),
        }
    }

    #[test]
    fn test_starts_unsubscribed() {
        let manager = manager();
        assert_eq!(manager.subscription_id(), None);
        assert!(!manager.is_subscribed());
    }

    #[test]
    fn test_install_rejects_stale_generation() {
        let manager = manager();
        let (generation, _) = manager.snapshot();

        assert!(manager.install(generation, active("uuid:first")));
        assert_eq!(manager.subscription_id().as_deref(), Some("uuid:first"));

        // the first install moved the generation on
        assert!(!manager.install(generation, active("uuid:late")));
        assert_eq!(manager.subscription_id().as_deref(), Some("uuid:first"));
    }

    #[test]
    fn test_clear_only_applies_to_current_generation() {
        let manager = manager();
        assert!(manager.install(0, active("uuid:abc")));

        manager.clear_if_current(0);
        assert!(manager.is_subscribed());

        manager.clear_if_current(1);
        assert!(!manager.is_subscribed());
    }

    #[tokio::test]
    async fn test_cancel_without_subscription_sends_nothing() {
        // port 1 on loopback would refuse; NothingToCancel means no request was tried
        let outcome = manager().cancel().await.unwrap();
        assert_eq!(outcome, CancelOutcome::NothingToCancel);
    }

    #[tokio::test]
    async fn test_cancel_survives_unreachable_box() {
        let manager = manager();
        assert!(manager.install(0, active("uuid:abc")));

        let outcome = manager.cancel().await.unwrap();
        assert_eq!(
            outcome,
            CancelOutcome::Cancelled {
                sid: "uuid:abc".to_string()
            }
        );
        assert!(!manager.is_subscribed());
        assert!(!manager.install(1, active("uuid:abc")));
    }
}
