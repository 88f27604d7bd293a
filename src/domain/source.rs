/// Static identity of a content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Stable key, also used for the stored watermark.
    pub id: &'static str,
    pub title: &'static str,
    pub feed_url: &'static str,
}

impl SourceDescriptor {
    pub const fn new(id: &'static str, title: &'static str, feed_url: &'static str) -> Self {
        Self {
            id,
            title,
            feed_url,
        }
    }
}
