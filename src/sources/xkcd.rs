use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::markup;
use super::{fetch_images, Source};
use crate::app::{Result, StripError};
use crate::domain::{SourceDescriptor, Update};
use crate::fetcher::Fetcher;
use crate::normalizer::FeedEntry;

static DESCRIPTOR: SourceDescriptor =
    SourceDescriptor::new("xkcd", "XKCD", "https://xkcd.com/rss.xml");

pub struct Xkcd;

/// Image URL and alt text of the strip embedded in the feed description.
fn parse_description(html: &str) -> Result<(String, Option<String>)> {
    let fragment = markup::fragment(html);
    let selector = markup::parse_selector("img")?;
    let img = fragment
        .select(&selector)
        .next()
        .ok_or_else(|| StripError::extraction("no image in feed description"))?;

    let src = img
        .value()
        .attr("src")
        .ok_or_else(|| StripError::extraction("image without src"))?;
    let alt = img.value().attr("alt").map(str::to_string);

    Ok((src.to_string(), alt))
}

#[async_trait]
impl Source for Xkcd {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>> {
        let (image_url, alt) = parse_description(entry.summary.as_deref().unwrap_or_default())?;
        let images = fetch_images(fetcher, DESCRIPTOR.id, &[image_url]).await?;

        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on)
                .with_description(alt)
                .with_images(images),
        ))
    }
}
