use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::Update;

/// Latest delivered timestamp per source id.
pub type WatermarkMap = BTreeMap<String, DateTime<Utc>>;

/// First instant a source still has to deliver.
///
/// Stored watermarks mark an item that was already delivered and have
/// whole-second precision, so the cutoff starts one second later.
pub fn cutoff_for(
    watermarks: &WatermarkMap,
    source_id: &str,
    default_cutoff: DateTime<Utc>,
) -> DateTime<Utc> {
    watermarks
        .get(source_id)
        .map(|last_seen| *last_seen + Duration::seconds(1))
        .unwrap_or(default_cutoff)
}

/// Move a source's watermark forward to the newest of `updates`.
///
/// Returns true if the watermark changed.
pub fn advance(watermarks: &mut WatermarkMap, source_id: &str, updates: &[Update]) -> bool {
    let Some(newest) = updates.iter().map(|u| u.timestamp).max() else {
        return false;
    };

    match watermarks.get(source_id) {
        Some(previous) if *previous >= newest => false,
        _ => {
            watermarks.insert(source_id.to_string(), newest);
            true
        }
    }
}
