//! Day listings assembled from concurrently fetched parts
//!
//! The listing service splits a channel's day into four parts. The
//! [`ListingAggregator`] fetches all of them at once, each under its own
//! timeout, and only answers once every part has either delivered its
//! programmes or failed.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::programme::{NowNext, Programme};

/// Number of parts a day listing is split into
pub const LISTING_PARTS: u8 = 4;

/// Where programme data comes from
#[async_trait]
pub trait ProgrammeSource: Send + Sync {
    /// Programmes of one part (0..=3) of `channel_id`'s listing for `date`
    async fn fetch_listing_part(
        &self,
        channel_id: u32,
        date: NaiveDate,
        part: u8,
    ) -> Result<Vec<Programme>>;

    /// The next few programmes on `channel_id`, starting with the one on air
    async fn fetch_now_next(&self, channel_id: u32) -> Result<Vec<Programme>>;
}

/// Fans listing requests out over a [`ProgrammeSource`]
#[derive(Clone)]
pub struct ListingAggregator {
    source: Arc<dyn ProgrammeSource>,
    part_timeout: Duration,
}

impl ListingAggregator {
    pub fn new(source: Arc<dyn ProgrammeSource>, part_timeout: Duration) -> Self {
        Self {
            source,
            part_timeout,
        }
    }

    /// Today's (UTC) listing for `channel_id`
    pub async fn channel_listing(&self, channel_id: u32) -> Result<Vec<Programme>> {
        self.channel_listing_for(channel_id, Utc::now().date_naive())
            .await
    }

    /// `channel_id`'s listing for `date`, sorted by start time.
    ///
    /// Programmes that appear in more than one part are kept as they are.
    /// Fails with [`ApiError::Listing`] naming every part that did not arrive.
    pub async fn channel_listing_for(
        &self,
        channel_id: u32,
        date: NaiveDate,
    ) -> Result<Vec<Programme>> {
        tracing::debug!(channel_id, %date, "Fetching channel listing");

        let mut pending: FuturesUnordered<_> = (0..LISTING_PARTS)
            .map(|part| self.fetch_part(channel_id, date, part))
            .collect();

        let mut programmes = Vec::new();
        let mut failures = Vec::new();

        while let Some((part, outcome)) = pending.next().await {
            match outcome {
                Ok(mut batch) => {
                    tracing::debug!(channel_id, part, count = batch.len(), "Listing part arrived");
                    programmes.append(&mut batch);
                }
                Err(e) => {
                    tracing::warn!(channel_id, part, "Listing part failed: {}", e);
                    failures.push((part, e.to_string()));
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|(part, _)| *part);
            return Err(ApiError::Listing { failures });
        }

        programmes.sort_by_key(|programme| programme.start);
        Ok(programmes)
    }

    /// What is on `channel_id` now, and what follows
    pub async fn whats_on(&self, channel_id: u32) -> Result<NowNext> {
        let programmes = tokio::time::timeout(
            self.part_timeout,
            self.source.fetch_now_next(channel_id),
        )
        .await
        .map_err(|_| {
            ApiError::Timeout(format!(
                "now/next for channel {} after {:?}",
                channel_id, self.part_timeout
            ))
        })??;

        let mut programmes = programmes.into_iter();
        match (programmes.next(), programmes.next()) {
            (Some(now), Some(next)) => Ok(NowNext { now, next }),
            _ => Err(ApiError::ParseError(format!(
                "Channel {} has fewer than two upcoming programmes",
                channel_id
            ))),
        }
    }

    async fn fetch_part(
        &self,
        channel_id: u32,
        date: NaiveDate,
        part: u8,
    ) -> (u8, Result<Vec<Programme>>) {
        let outcome = tokio::time::timeout(
            self.part_timeout,
            self.source.fetch_listing_part(channel_id, date, part),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ApiError::Timeout(format!("no answer after {:?}", self.part_timeout)))
        });

        (part, outcome)
    }
}

impl std::fmt::Debug for ListingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingAggregator")
            .field("part_timeout", &self.part_timeout)
            .finish_non_exhaustive()
    }
}
