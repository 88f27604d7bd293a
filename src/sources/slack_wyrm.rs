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
    "slack-wyrm",
    "Slack Wyrm",
    "http://www.joshuawright.net/rss_joshuawright.xml",
);

/// Image sources on the site are relative to the site root, not the page.
const SITE_ROOT: &str = "http://www.joshuawright.net/";

/// A single entry can span several panels; each panel frame is one image.
pub struct SlackWyrm;

fn panel_images(body: &[u8]) -> Result<Vec<String>> {
    let html = markup::document(body);
    let urls = markup::all_attrs(&html, r#"div[data-muse-type="img_frame"] img"#, "src")?
        .into_iter()
        .map(|src| markup::resolve(SITE_ROOT, &src))
        .collect();
    Ok(urls)
}

#[async_trait]
impl Source for SlackWyrm {
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
        let urls = panel_images(&fetcher.fetch(link).await?)?;
        let images = fetch_images(fetcher, DESCRIPTOR.id, &urls).await?;

        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on)
                .with_description(entry.summary.clone())
                .with_images(images),
        ))
    }
}
