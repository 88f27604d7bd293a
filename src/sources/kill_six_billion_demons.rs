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
    "kill-6-billion-demons",
    "Kill 6 Billion Demons",
    "https://killsixbilliondemons.com/feed/",
);

/// The page advertises its strip through `og:image`; pages without it are
/// not comic pages and are rejected.
pub struct KillSixBillionDemons;

struct ComicPage {
    image_url: Option<String>,
    description: Option<String>,
}

fn parse_page(page_url: &str, body: &[u8]) -> Result<ComicPage> {
    let html = markup::document(body);

    let image_url = markup::first_attr(&html, r#"meta[property="og:image"]"#, "content")?
        .map(|content| markup::resolve(page_url, &content));

    let entry = markup::parse_selector("div.entry")?;
    let description = html
        .select(&entry)
        .next()
        .map(|el| markup::to_markdown(el, false))
        .transpose()?;

    Ok(ComicPage {
        image_url,
        description,
    })
}

#[async_trait]
impl Source for KillSixBillionDemons {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn process_entry(
        &self,
        fetcher: &dyn Fetcher,
        entry: &FeedEntry,
        published_on: DateTime<Utc>,
    ) -> Result<Option<Update>> {
        let link = entry.link()?;
        debug!(source = DESCRIPTOR.id, title = %entry.title, "Fetching comic page");
        let page = parse_page(link, &fetcher.fetch(link).await?)?;

        let Some(image_url) = page.image_url else {
            debug!(source = DESCRIPTOR.id, title = %entry.title, "No og:image, not a comic");
            return Ok(None);
        };

        let images = fetch_images(fetcher, DESCRIPTOR.id, &[image_url]).await?;
        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on)
                .with_markdown_description(page.description)
                .with_images(images),
        ))
    }
}
