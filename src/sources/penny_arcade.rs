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
    SourceDescriptor::new("penny-arcade", "Penny Arcade", "http://penny-arcade.com/feed");

/// The feed mixes comics and news posts; only `Comic:` entries are kept.
/// The strip lives on the comic page, the description on the linked news post.
pub struct PennyArcade;

struct ComicPage {
    image_url: String,
    post_url: Option<String>,
}

fn parse_comic_page(page_url: &str, body: &[u8]) -> Result<ComicPage> {
    let html = markup::document(body);

    let image = markup::first_attr(&html, "div#comicFrame img", "src")?
        .ok_or_else(|| StripError::extraction(format!("no comic image on {}", page_url)))?;
    let post = markup::first_attr(&html, r#"a[title="Read News Post"]"#, "href")?;

    Ok(ComicPage {
        image_url: markup::resolve(page_url, &image),
        post_url: post.map(|href| markup::resolve(page_url, &href)),
    })
}

fn parse_post_page(body: &[u8]) -> Result<Option<String>> {
    let html = markup::document(body);
    let copy = markup::parse_selector("div.copy")?;
    html.select(&copy)
        .next()
        .map(|el| markup::to_markdown(el, true))
        .transpose()
}

#[async_trait]
impl Source for PennyArcade {
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
        let page = parse_comic_page(link, &fetcher.fetch(link).await?)?;

        let description = match &page.post_url {
            Some(post_url) => {
                debug!(source = DESCRIPTOR.id, title = %entry.title, "Fetching news post");
                parse_post_page(&fetcher.fetch(post_url).await?)?
            }
            None => None,
        };

        let images = fetch_images(fetcher, DESCRIPTOR.id, &[page.image_url]).await?;

        Ok(Some(
            Update::new(DESCRIPTOR.id, entry.title.clone(), published_on)
                .with_markdown_description(description)
                .with_images(images),
        ))
    }
}
