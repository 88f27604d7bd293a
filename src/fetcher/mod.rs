pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

/// Single GET of a remote resource.
///
/// Implementations report failures as [`StripError::Fetch`](crate::app::StripError::Fetch)
/// and never retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
