// src/ingest/dedup.rs
use std::collections::HashSet;

use crate::item::Item;

/// Lower-cased URL, or lower-cased title when the item has no URL.
pub fn identity_key(item: &Item) -> String {
    let url = item.url.trim();
    if url.is_empty() {
        item.title.trim().to_lowercase()
    } else {
        url.to_lowercase()
    }
}

/// First occurrence wins. Also drops later items reusing an already kept `id`,
/// so ids stay unique in the snapshot.
/// Returns (kept, dropped_count).
pub fn dedupe(items: Vec<Item>) -> (Vec<Item>, usize) {
    let mut seen_keys: HashSet<String> = HashSet::with_capacity(items.len());
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(items.len());
    let mut keep = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for it in items {
        let key = identity_key(&it);
        if seen_keys.contains(&key) || seen_ids.contains(&it.id) {
            dropped += 1;
            continue;
        }
        seen_keys.insert(key);
        seen_ids.insert(it.id.clone());
        keep.push(it);
    }

    (keep, dropped)
}
