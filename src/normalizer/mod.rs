use chrono::{DateTime, SubsecRound, Utc};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, StripError};

/// One raw feed item, before any source-specific extraction.
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    /// Full inline body (`content:encoded`, Atom `<content>`).
    pub content: Option<String>,
    /// RSS `<description>` or Atom `<summary>`.
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Publication instant, falling back to the last update time.
    pub fn published_on(&self) -> Result<DateTime<Utc>> {
        self.published.or(self.updated).ok_or_else(|| {
            StripError::FeedParse(format!("entry '{}' has no usable timestamp", self.title))
        })
    }

    pub fn link(&self) -> Result<&str> {
        self.link
            .as_deref()
            .ok_or_else(|| StripError::extraction(format!("entry '{}' has no link", self.title)))
    }
}

/// Turns RSS 0.9x/1.0/2.0, Atom and JSON Feed documents into [`FeedEntry`]s.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8]) -> Result<Vec<FeedEntry>> {
        let feed = parser::parse(body).map_err(|e| StripError::FeedParse(e.to_string()))?;

        let entries = feed
            .entries
            .into_iter()
            .map(|entry| FeedEntry {
                title: entry
                    .title
                    .map(|t| decode_html_entities(t.content.trim()).to_string())
                    .unwrap_or_default(),
                link: entry.links.first().map(|l| l.href.clone()),
                content: entry.content.and_then(|c| c.body),
                summary: entry.summary.map(|s| s.content),
                published: entry.published.map(|dt| dt.trunc_subsecs(0)),
                updated: entry.updated.map(|dt| dt.trunc_subsecs(0)),
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>Comic: Bits &amp; Pieces</title>
      <link>https://example.com/comic/1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 10:30:00 GMT</pubDate>
      <description>&lt;img src="https://example.com/1.png" /&gt;</description>
      <content:encoded><![CDATA[<p><img src="https://example.com/full.png"/></p>]]></content:encoded>
    </item>
    <item>
      <title>News Post: Undated</title>
      <link>https://example.com/news/2</link>
      <guid>item-2</guid>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:test</id>
  <updated>2024-01-02T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-02T08:15:30.750Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let entries = Normalizer::new().parse(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Comic: Bits & Pieces");
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/comic/1"));
        assert_eq!(
            entries[0].published_on().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap()
        );
        assert!(entries[0].summary.as_deref().unwrap().contains("1.png"));
        assert!(entries[0].content.as_deref().unwrap().contains("full.png"));
    }

    #[test]
    fn test_entry_order_is_preserved() {
        let entries = Normalizer::new().parse(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(entries[1].title, "News Post: Undated");
    }

    #[test]
    fn test_missing_timestamp_fails_only_that_entry() {
        let entries = Normalizer::new().parse(RSS_SAMPLE.as_bytes()).unwrap();
        assert!(matches!(
            entries[1].published_on(),
            Err(StripError::FeedParse(_))
        ));
    }

    #[test]
    fn test_parse_atom_falls_back_to_updated() {
        let entries = Normalizer::new().parse(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Atom Entry 1");
        assert_eq!(entries[0].published, None);
        // sub-second precision is dropped
        assert_eq!(
            entries[0].published_on().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 8, 15, 30).unwrap()
        );
    }

    #[test]
    fn test_invalid_document_is_parse_error() {
        let result = Normalizer::new().parse(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(StripError::FeedParse(_))));
    }

    #[test]
    fn test_missing_link_is_extraction_error() {
        let entry = FeedEntry::default();
        assert!(matches!(entry.link(), Err(StripError::Extraction(_))));
    }
}
