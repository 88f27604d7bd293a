pub mod sqlite;

use crate::app::Result;
use crate::domain::WatermarkMap;

pub use sqlite::SqliteStore;

/// Durable mapping of source id to the last delivered timestamp.
pub trait WatermarkStore {
    /// All stored watermarks; empty for a fresh store.
    fn load(&self) -> Result<WatermarkMap>;

    /// Upsert every entry of `watermarks` atomically. Keys not in the map are untouched.
    fn save(&self, watermarks: &WatermarkMap) -> Result<()>;
}
