//! Source adapters.
//!
//! Every source is a [`Source`] implementation: a static descriptor plus a
//! `process_entry` hook that turns one feed entry into at most one
//! [`Update`]. The feed fetch, timestamp resolution and cutoff filter are
//! shared in the provided [`Source::get_updates`].
//!
//! # Error policy
//!
//! - Entry-local failures ([`StripError::Extraction`], a missing entry
//!   timestamp, a bad selector) skip that entry with a warning. The feed
//!   keeps going.
//! - Anything else, most notably [`StripError::Fetch`] on the feed, a comic
//!   page or an image, fails the whole source for this run so its watermark
//!   is not advanced past an item that was never delivered.

pub mod markup;

mod commit_strip;
mod kill_six_billion_demons;
mod penny_arcade;
mod pvp;
mod slack_wyrm;
mod smbc;
mod xkcd;

pub use commit_strip::CommitStrip;
pub use kill_six_billion_demons::KillSixBillionDemons;
pub use penny_arcade::PennyArcade;
pub use pvp::PvP;
pub use slack_wyrm::SlackWyrm;
pub use smbc::SaturdayMorningBreakfastCereal;
pub use xkcd::Xkcd;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::app::{Result, StripError};
use crate::domain::{SourceDescriptor, Update};
use crate::fetcher::Fetcher;
use crate::normalizer::{FeedEntry, Normalizer};

#[async_trait]
pub trait Source: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// Turn one feed entry into an update.
    ///
    /// `Ok(None)` rejects the entry (not a comic, nothing to show).
    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>>;

    /// All updates published at or after `cutoff`, in feed order.
    async fn get_updates(
        &self,
        fetcher: &dyn Fetcher,
        normalizer: &Normalizer,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Update>> {
        let descriptor = self.descriptor();
        info!(source = descriptor.id, url = descriptor.feed_url, "Requesting feed");

        let body = fetcher.fetch(descriptor.feed_url).await?;
        let entries = normalizer.parse(&body)?;

        let mut updates = Vec::new();
        for entry in &entries {
            let published_on = match entry.published_on() {
                Ok(published_on) => published_on,
                Err(e) => {
                    warn!(source = descriptor.id, title = %entry.title, "Skipping entry: {}", e);
                    continue;
                }
            };

            if published_on < cutoff {
                debug!(source = descriptor.id, title = %entry.title, "Ignoring entry: too old");
                continue;
            }

            match self.process_entry(fetcher, entry, published_on).await {
                Ok(Some(update)) => updates.push(update),
                Ok(None) => {
                    debug!(source = descriptor.id, title = %entry.title, "Entry rejected");
                }
                Err(e) if e.is_entry_local() => {
                    warn!(source = descriptor.id, title = %entry.title, "Skipping entry: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            source = descriptor.id,
            count = updates.len(),
            "Collected updates"
        );
        Ok(updates)
    }
}

/// Every known source, in a fixed order.
pub fn registry() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(PennyArcade),
        Arc::new(PvP),
        Arc::new(SaturdayMorningBreakfastCereal),
        Arc::new(Xkcd),
        Arc::new(CommitStrip),
        Arc::new(SlackWyrm),
        Arc::new(KillSixBillionDemons),
    ]
}

/// Restrict the registry to `ids`, keeping registry order.
///
/// An empty list selects everything; an unknown id is an error.
pub fn select(ids: &[String]) -> Result<Vec<Arc<dyn Source>>> {
    let all = registry();
    if ids.is_empty() {
        return Ok(all);
    }

    if let Some(unknown) = ids
        .iter()
        .find(|id| !all.iter().any(|source| source.id() == id.as_str()))
    {
        return Err(StripError::UnknownSource(unknown.clone()));
    }

    Ok(all
        .into_iter()
        .filter(|source| ids.iter().any(|id| id == source.id()))
        .collect())
}

/// Fetch a batch of image URLs, keeping their order.
pub(crate) async fn fetch_images(
    fetcher: &dyn Fetcher,
    source_id: &str,
    urls: &[String],
) -> Result<Vec<Vec<u8>>> {
    let mut images = Vec::with_capacity(urls.len());
    for url in urls {
        debug!(source = source_id, url = %url, "Fetching image");
        images.push(fetcher.fetch(url).await?);
    }
    Ok(images)
}
