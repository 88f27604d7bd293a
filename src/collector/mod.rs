//! Concurrent fan-out over sources.
//!
//! One task per source, joined in full before anything is merged. A failing,
//! slow or panicking source is recorded as a [`SourceFailure`] and never
//! affects the other sources' updates or watermarks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::app::{Result, StripError};
use crate::domain::watermark::{advance, cutoff_for};
use crate::domain::{Update, WatermarkMap};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::sources::Source;

pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: StripError,
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// Sources in the order given, each source's updates in feed order.
    pub updates: Vec<Update>,
    /// Previous watermarks, advanced for every source that produced updates.
    pub watermarks: WatermarkMap,
    pub failures: Vec<SourceFailure>,
}

pub struct Collector {
    fetcher: Arc<dyn Fetcher>,
    normalizer: Normalizer,
    source_timeout: Option<Duration>,
}

impl Collector {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_timeout(fetcher, Some(Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS)))
    }

    /// `None` lets a source run for as long as it needs.
    pub fn with_timeout(fetcher: Arc<dyn Fetcher>, source_timeout: Option<Duration>) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            source_timeout,
        }
    }

    pub async fn collect(
        &self,
        sources: Vec<Arc<dyn Source>>,
        watermarks: &WatermarkMap,
        default_cutoff: DateTime<Utc>,
    ) -> CollectOutcome {
        let mut ids = Vec::with_capacity(sources.len());
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let cutoff = cutoff_for(watermarks, source.id(), default_cutoff);
            let fetcher = self.fetcher.clone();
            let normalizer = self.normalizer.clone();
            let deadline = self.source_timeout;

            ids.push(source.id());
            handles.push(tokio::spawn(async move {
                let work = source.get_updates(fetcher.as_ref(), &normalizer, cutoff);
                match deadline {
                    Some(limit) => tokio::time::timeout(limit, work)
                        .await
                        .unwrap_or_else(|_| Err(StripError::Timeout(limit.as_secs()))),
                    None => work.await,
                }
            }));
        }

        let results = join_all(handles).await;

        let mut outcome = CollectOutcome {
            watermarks: watermarks.clone(),
            ..CollectOutcome::default()
        };

        for (source_id, joined) in ids.into_iter().zip(results) {
            let result: Result<Vec<Update>> = joined.unwrap_or_else(|e| {
                error!(source = source_id, "Task join error: {}", e);
                Err(StripError::Task(e.to_string()))
            });

            match result {
                Ok(updates) => {
                    if advance(&mut outcome.watermarks, source_id, &updates) {
                        info!(source = source_id, count = updates.len(), "Watermark advanced");
                    }
                    outcome.updates.extend(updates);
                }
                Err(error) => {
                    warn!(source = source_id, "Source failed: {}", error);
                    outcome.failures.push(SourceFailure {
                        source_id: source_id.to_string(),
                        error,
                    });
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceDescriptor;
    use crate::fetcher::testing::MapFetcher;
    use crate::normalizer::FeedEntry;
    use crate::sources::testing::rss;
    use crate::store::{SqliteStore, WatermarkStore};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, SubsecRound};

    static ALPHA: SourceDescriptor =
        SourceDescriptor::new("alpha", "Alpha", "https://alpha.example.com/feed");
    static BETA: SourceDescriptor =
        SourceDescriptor::new("beta", "Beta", "https://beta.example.com/feed");
    static BROKEN: SourceDescriptor =
        SourceDescriptor::new("broken", "Broken", "https://broken.example.com/feed");

    /// Turns every entry into a text-only update.
    struct Echo(&'static SourceDescriptor);

    #[async_trait]
    impl Source for Echo {
        fn descriptor(&self) -> &SourceDescriptor {
            self.0
        }

        async fn process_entry(
            &self,
            _fetcher: &dyn Fetcher,
            entry: &FeedEntry,
            published_on: DateTime<Utc>,
        ) -> Result<Option<Update>> {
            Ok(Some(Update::new(self.0.id, entry.title.clone(), published_on)))
        }
    }

    /// Never finishes.
    struct Stuck;

    #[async_trait]
    impl Source for Stuck {
        fn descriptor(&self) -> &SourceDescriptor {
            &BROKEN
        }

        async fn process_entry(
            &self,
            _fetcher: &dyn Fetcher,
            _entry: &FeedEntry,
            _published_on: DateTime<Utc>,
        ) -> Result<Option<Update>> {
            Ok(None)
        }

        async fn get_updates(
            &self,
            _fetcher: &dyn Fetcher,
            _normalizer: &Normalizer,
            _cutoff: DateTime<Utc>,
        ) -> Result<Vec<Update>> {
            futures::future::pending().await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }

    fn fixture(now: DateTime<Utc>) -> MapFetcher {
        MapFetcher::new()
            .with(
                ALPHA.feed_url,
                rss(&[
                    ("alpha 2", "https://alpha.example.com/2", now, ""),
                    ("alpha 1", "https://alpha.example.com/1", now - ChronoDuration::hours(3), ""),
                    ("alpha 0", "https://alpha.example.com/0", now - ChronoDuration::days(3), ""),
                ]),
            )
            .with(
                BETA.feed_url,
                rss(&[("beta 1", "https://beta.example.com/1", now - ChronoDuration::hours(1), "")]),
            )
    }

    fn sources(with_broken: bool) -> Vec<Arc<dyn Source>> {
        let mut sources: Vec<Arc<dyn Source>> = vec![Arc::new(Echo(&ALPHA))];
        if with_broken {
            sources.push(Arc::new(Echo(&BROKEN)));
        }
        sources.push(Arc::new(Echo(&BETA)));
        sources
    }

    #[tokio::test]
    async fn test_merges_in_source_then_feed_order() {
        let now = now();
        let collector = Collector::new(Arc::new(fixture(now)));

        let outcome = collector
            .collect(sources(false), &WatermarkMap::new(), now - ChronoDuration::days(1))
            .await;

        let titles: Vec<_> = outcome.updates.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha 2", "alpha 1", "beta 1"]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.watermarks.get("alpha"), Some(&now));
        assert_eq!(
            outcome.watermarks.get("beta"),
            Some(&(now - ChronoDuration::hours(1)))
        );
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let now = now();
        let cutoff = now - ChronoDuration::days(1);
        let collector = Collector::new(Arc::new(fixture(now)));

        let healthy = collector
            .collect(sources(false), &WatermarkMap::new(), cutoff)
            .await;
        let mixed = collector
            .collect(sources(true), &WatermarkMap::new(), cutoff)
            .await;

        assert_eq!(mixed.updates, healthy.updates);
        assert_eq!(mixed.failures.len(), 1);
        assert_eq!(mixed.failures[0].source_id, "broken");
        assert!(matches!(mixed.failures[0].error, StripError::Fetch { .. }));
        assert!(!mixed.watermarks.contains_key("broken"));
    }

    #[tokio::test]
    async fn test_failed_source_keeps_previous_watermark() {
        let now = now();
        let mut previous = WatermarkMap::new();
        previous.insert("broken".into(), now - ChronoDuration::days(7));
        let collector = Collector::new(Arc::new(fixture(now)));

        let outcome = collector
            .collect(sources(true), &previous, now - ChronoDuration::days(1))
            .await;

        assert_eq!(
            outcome.watermarks.get("broken"),
            Some(&(now - ChronoDuration::days(7)))
        );
    }

    #[tokio::test]
    async fn test_second_run_is_empty() {
        let now = now();
        let cutoff = now - ChronoDuration::days(1);
        let collector = Collector::new(Arc::new(fixture(now)));
        let store = SqliteStore::in_memory().unwrap();

        let first = collector
            .collect(sources(false), &store.load().unwrap(), cutoff)
            .await;
        assert_eq!(first.updates.len(), 3);
        store.save(&first.watermarks).unwrap();

        let second = collector
            .collect(sources(false), &store.load().unwrap(), cutoff)
            .await;
        assert!(second.updates.is_empty());
        assert!(second.failures.is_empty());
        assert_eq!(second.watermarks, first.watermarks);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_alone() {
        let now = now();
        let collector = Collector::with_timeout(
            Arc::new(fixture(now)),
            Some(std::time::Duration::from_millis(50)),
        );
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(Stuck), Arc::new(Echo(&BETA))];

        let outcome = collector
            .collect(sources, &WatermarkMap::new(), now - ChronoDuration::days(1))
            .await;

        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].error, StripError::Timeout(_)));
    }
}
