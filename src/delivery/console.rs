use std::io::{self, Write};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crossterm::style::Stylize;

use crate::app::Result;
use crate::delivery::{chronological, Sink};
use crate::domain::Update;

/// Prints updates to stdout, images inline via the iTerm2 image escape.
pub struct ConsoleSink;

fn inline_image(image: &[u8]) -> String {
    format!(
        "\x1b]1337;File=inline=1;width=auto;height=auto;preserveAspectRatio=1:{}\x07",
        STANDARD.encode(image)
    )
}

/// Drop MarkdownV2 escapes; formatting markers are left as-is.
fn unescape(markdown: &str) -> String {
    let mut plain = String::with_capacity(markdown.len());
    let mut chars = markdown.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => plain.extend(chars.next()),
            c => plain.push(c),
        }
    }
    plain
}

pub fn render<W: Write>(out: &mut W, updates: &[Update]) -> io::Result<()> {
    for update in chronological(updates) {
        writeln!(out, "{}", format!("[{}]", update.title).bold())?;
        let description = update.display_description().unwrap_or_default();
        if update.markdown {
            writeln!(out, "{}", unescape(description))?;
        } else {
            writeln!(out, "{}", description)?;
        }
        writeln!(out)?;
        for image in &update.images {
            writeln!(out, "{}", inline_image(image))?;
            writeln!(out)?;
        }
    }
    out.flush()
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn deliver(&self, updates: &[Update]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        render(&mut out, updates)?;
        Ok(())
    }
}
