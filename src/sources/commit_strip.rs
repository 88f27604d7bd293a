use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::markup;
use super::{fetch_images, Source};
use crate::app::Result;
use crate::domain::{SourceDescriptor, Update};
use crate::fetcher::Fetcher;
use crate::normalizer::FeedEntry;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor::new(
    "commit-strip",
    "Commit Strip",
    "https://www.commitstrip.com/en/feed/",
);

/// Strip images are embedded in `content:encoded`; entries without one are
/// not strips and are rejected.
pub struct CommitStrip;

fn first_image(content: &str) -> Result<Option<String>> {
    let fragment = markup::fragment(content);
    markup::first_attr(&fragment, "img", "src")
}

#[async_trait]
impl Source for CommitStrip {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>> {
        let content = entry.content.as_deref().unwrap_or_default();
        let Some(image_url) = first_image(content)? else {
            debug!(source = DESCRIPTOR.id, title = %entry.title, "No strip in entry");
            return Ok(None);
        };

        let images = fetch_images(fetcher, DESCRIPTOR.id, &[image_url]).await?;
        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on).with_images(images),
        ))
    }
}
