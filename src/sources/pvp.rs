use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::markup;
use super::{fetch_images, Source};
use crate::app::{Result, StripError};
use crate::domain::{SourceDescriptor, Update};
use crate::fetcher::Fetcher;
use crate::normalizer::FeedEntry;

static DESCRIPTOR: SourceDescriptor =
    SourceDescriptor::new("pvp", "PvP", "http://pvponline.com/feed");

pub struct PvP;

fn comic_image(page_url: &str, body: &[u8]) -> Result<String> {
    let html = markup::document(body);
    markup::first_attr(&html, "section.comic-art img", "src")?
        .map(|src| markup::resolve(page_url, &src))
        .ok_or_else(|| StripError::extraction(format!("no comic art on {}", page_url)))
}

#[async_trait]
impl Source for PvP {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>> {
        if !entry.title.starts_with("Comic:") {
            debug!(source = DESCRIPTOR.id, title = %entry.title, "Not a comic");
            return Ok(None);
        }

        let link = entry.link()?;
        debug!(source = DESCRIPTOR.id, title = %entry.title, "Fetching comic page");
        let image_url = comic_image(link, &fetcher.fetch(link).await?)?;
        let images = fetch_images(fetcher, DESCRIPTOR.id, &[image_url]).await?;

        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on).with_images(images),
        ))
    }
}
