use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::Node;

use super::markup;
use super::{fetch_images, Source};
use crate::app::{Result, StripError};
use crate::domain::{SourceDescriptor, Update};
use crate::fetcher::Fetcher;
use crate::normalizer::FeedEntry;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor::new(
    "smbc",
    "Saturday Morning Breakfast Cereal",
    "https://www.smbc-comics.com/comic/rss",
);

/// Everything is inline in the feed: the strip image and a
/// `<p>Hovertext:<br/>...</p>` paragraph.
pub struct SaturdayMorningBreakfastCereal;

struct Strip {
    image_url: String,
    hovertext: Option<String>,
}

fn parse_description(html: &str) -> Result<Strip> {
    let fragment = markup::fragment(html);

    let image_url = markup::first_attr(&fragment, "img", "src")?
        .ok_or_else(|| StripError::extraction("no image in feed description"))?;

    let line_break = markup::parse_selector("p br")?;
    let hovertext = fragment
        .select(&line_break)
        .next()
        .and_then(|br| br.next_sibling())
        .and_then(|node| match node.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            _ => None,
        });

    Ok(Strip {
        image_url,
        hovertext,
    })
}

#[async_trait]
impl Source for SaturdayMorningBreakfastCereal {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>> {
        let strip = parse_description(entry.summary.as_deref().unwrap_or_default())?;
        let images = fetch_images(fetcher, DESCRIPTOR.id, &[strip.image_url]).await?;

        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on)
                .with_description(strip.hovertext)
                .with_images(images),
        ))
    }
}
