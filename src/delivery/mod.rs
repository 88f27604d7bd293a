//! Delivery sinks.
//!
//! A sink receives the merged updates of a run in whatever order the
//! collector produced them and is responsible for putting them in
//! chronological order.

pub mod console;
pub mod telegram;

pub use console::ConsoleSink;
pub use telegram::TelegramSink;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Update;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn deliver(&self, updates: &[Update]) -> Result<()>;
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound<'a> {
    Photo { image: &'a [u8], caption: String },
    /// Plain text, no parse mode.
    Text(&'a str),
    /// Escaped MarkdownV2.
    Markdown(&'a str),
}

/// Updates sorted by timestamp; equal timestamps keep their input order.
pub fn chronological(updates: &[Update]) -> Vec<&Update> {
    let mut ordered: Vec<&Update> = updates.iter().collect();
    ordered.sort_by_key(|u| u.timestamp);
    ordered
}

/// Messages for a batch of updates, in sending order: each update's images,
/// then its description.
pub fn outbound(updates: &[Update]) -> Vec<Outbound<'_>> {
    let mut messages = Vec::new();
    for update in chronological(updates) {
        let caption = update.caption();
        messages.extend(update.images.iter().map(|image| Outbound::Photo {
            image,
            caption: caption.clone(),
        }));
        if let Some(description) = update.display_description() {
            messages.push(if update.markdown {
                Outbound::Markdown(description)
            } else {
                Outbound::Text(description)
            });
        }
    }
    messages
}
