//! HTML helpers shared by the source adapters.
//!
//! `scraper::Html` is not `Send`, so every helper here is synchronous and
//! returns owned data. Adapters parse, extract, drop the document and only
//! then await the next fetch.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::app::{Result, StripError};

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| StripError::Selector {
        selector: css.to_string(),
        message: format!("{e:?}"),
    })
}

/// Decode a fetched page, tolerating invalid UTF-8.
pub fn document(body: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(body))
}

pub fn fragment(html: &str) -> Html {
    Html::parse_fragment(html)
}

/// Value of `attr` on the first element matching `css`.
pub fn first_attr(html: &Html, css: &str, attr: &str) -> Result<Option<String>> {
    let selector = parse_selector(css)?;
    Ok(html
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string))
}

/// Values of `attr` on every element matching `css`, in document order.
pub fn all_attrs(html: &Html, css: &str, attr: &str) -> Result<Vec<String>> {
    let selector = parse_selector(css)?;
    Ok(html
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::to_string)
        .collect())
}

/// Resolve a possibly relative `href` against the page it was found on.
pub fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape text so Telegram's MarkdownV2 shows it verbatim.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside the `(...)` of an inline link only `)` and `\` need escaping.
fn escape_link_target(href: &str) -> String {
    href.replace('\\', "\\\\").replace(')', "\\)")
}

/// Convert the paragraphs of a post body into Telegram MarkdownV2.
///
/// Text nodes become paragraphs, links become `[text](href)` glued to the
/// preceding text, `<i>` becomes `_text_`. Everything else is dropped. All
/// copied text is escaped. With `skip_last` the final child of every
/// paragraph is ignored (sign-offs).
pub fn to_markdown(root: ElementRef<'_>, skip_last: bool) -> Result<String> {
    let paragraph = parse_selector("p")?;
    let mut result = String::new();

    for p in root.select(&paragraph) {
        let children: Vec<_> = p.children().collect();
        let keep = if skip_last {
            children.len().saturating_sub(1)
        } else {
            children.len()
        };

        for child in &children[..keep] {
            match child.value() {
                Node::Text(text) => {
                    result.push_str(&escape_markdown(&text.replace('\u{a0}', " ")));
                    result.push_str("\n\n");
                }
                Node::Element(element) => {
                    let Some(el) = ElementRef::wrap(*child) else {
                        continue;
                    };
                    let text = escape_markdown(&el.text().collect::<String>().replace('\u{a0}', " "));
                    match element.name() {
                        "a" => {
                            let trimmed = result.trim_end().len();
                            result.truncate(trimmed);
                            let href = element.attr("href").unwrap_or_default();
                            result.push_str(&format!(" [{}]({})", text, escape_link_target(href)));
                        }
                        "i" => result.push_str(&format!("_{}_", text)),
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    Ok(result.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"<div class="copy">
        <p>First thought <a href="https://example.com/x">a link</a><i>lean</i>Signed, Tycho</p>
        <p>Second&nbsp;paragraph</p>
    </div>"#;

    fn root(html: &Html) -> ElementRef<'_> {
        let selector = parse_selector("div.copy").unwrap();
        html.select(&selector).next().unwrap()
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(matches!(
            parse_selector("[[invalid"),
            Err(StripError::Selector { .. })
        ));
    }

    #[test]
    fn test_to_markdown_keeps_links_and_italics() {
        let html = fragment(POST);
        let markdown = to_markdown(root(&html), false).unwrap();

        assert_eq!(
            markdown,
            "First thought [a link](https://example.com/x)_lean_Signed, Tycho\n\nSecond paragraph"
        );
    }

    #[test]
    fn test_to_markdown_skips_last_child() {
        let html = fragment(POST);
        let markdown = to_markdown(root(&html), true).unwrap();

        assert!(markdown.starts_with("First thought [a link](https://example.com/x)_lean_"));
        assert!(!markdown.contains("Tycho"));
        // single-child paragraph loses its only child
        assert!(!markdown.contains("Second"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("foo_bar *baz"), "foo\\_bar \\*baz");
        assert_eq!(escape_markdown("[1] (a.b)!"), "\\[1\\] \\(a\\.b\\)\\!");
        assert_eq!(escape_markdown("plain words"), "plain words");
    }

    #[test]
    fn test_to_markdown_escapes_copied_text() {
        let html = fragment(
            r#"<div class="copy"><p>snake_case *stars* <a href="https://example.com/a_(b)">see [this]</a></p></div>"#,
        );
        let markdown = to_markdown(root(&html), false).unwrap();

        assert_eq!(
            markdown,
            "snake\\_case \\*stars\\* [see \\[this\\]](https://example.com/a_(b\\))"
        );
    }

    #[test]
    fn test_first_attr_and_all_attrs() {
        let html = fragment(r#"<img src="/a.png"><img src="/b.png"><img>"#);

        assert_eq!(first_attr(&html, "img", "src").unwrap().as_deref(), Some("/a.png"));
        assert_eq!(all_attrs(&html, "img", "src").unwrap(), vec!["/a.png", "/b.png"]);
        assert_eq!(first_attr(&html, "video", "src").unwrap(), None);
    }

    #[test]
    fn test_resolve_relative_href() {
        assert_eq!(
            resolve("https://example.com/comic/1", "/img/1.png"),
            "https://example.com/img/1.png"
        );
        assert_eq!(
            resolve("https://example.com/comic/1", "https://cdn.example.com/1.png"),
            "https://cdn.example.com/1.png"
        );
    }
}
