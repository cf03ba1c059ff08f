// src/analyze/mod.rs
//! Ranker/Filter over a loaded snapshot.
//!
//! Pure and read-only: the snapshot is never mutated, every call returns a fresh
//! `Vec<Item>`. Order:
//! 1) filters (type, tag, free text over title + summary, time window)
//! 2) stable sort by `publishedAt` desc (`latest`) or hot score desc (`hot`);
//!    ties keep snapshot order.

pub mod query;
pub mod rules;
pub mod scoring;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::item::{Item, Snapshot};

pub use crate::analyze::query::{Query, QueryParams, SortMode, TimeWindow};
pub use crate::analyze::rules::{BoostRules, TagRules};
pub use crate::analyze::scoring::{hot_score, type_weight};

/// True when `item` passes every filter set in `query`.
pub fn matches(item: &Item, query: &Query, now: DateTime<Utc>) -> bool {
    if let Some(t) = query.item_type {
        if item.item_type != t {
            return false;
        }
    }
    if let Some(tag) = &query.tag {
        if !item.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return false;
        }
    }
    if !query.text.is_empty() && !item.search_text().contains(query.text.as_str()) {
        return false;
    }
    query.window.admits(item.published_at, now)
}

pub fn rank(snapshot: &Snapshot, query: &Query, now: DateTime<Utc>) -> Vec<Item> {
    rank_items(&snapshot.items, query, now)
}

pub fn rank_items(items: &[Item], query: &Query, now: DateTime<Utc>) -> Vec<Item> {
    let mut kept: Vec<&Item> = items.iter().filter(|it| matches(it, query, now)).collect();

    match query.sort {
        SortMode::Latest => {
            kept.sort_by(|a, b| b.sort_ts().cmp(&a.sort_ts()));
        }
        SortMode::Hot => {
            let boosts = BoostRules::builtin();
            let mut scored: Vec<(f64, &Item)> = kept
                .into_iter()
                .map(|it| (scoring::hot_score_with(boosts, it, now), it))
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            kept = scored.into_iter().map(|(_, it)| it).collect();
        }
    }

    kept.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use chrono::Duration;

    fn mk(id: &str, t: ItemType, title: &str, tags: &[&str], ts: Option<DateTime<Utc>>) -> Item {
        Item {
            id: id.into(),
            title: title.into(),
            url: format!("https://x.test/{id}"),
            published_at: ts,
            summary: String::new(),
            source: "s".into(),
            item_type: t,
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn filters_combine() {
        let now = Utc::now();
        let items = vec![
            mk("a", ItemType::Paper, "Humanoid robot", &["Robotics"], Some(now)),
            mk("b", ItemType::News, "Humanoid robot", &["Robotics"], Some(now)),
            mk("c", ItemType::Paper, "Humanoid", &["Vision"], Some(now)),
            mk("d", ItemType::Paper, "Other robot", &["Robotics"], Some(now)),
        ];
        let q = Query::default()
            .with_type(ItemType::Paper)
            .with_tag("Robotics")
            .with_text("HUMANOID");
        let out = rank_items(&items, &q, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn latest_is_stable_and_missing_sorts_last() {
        let now = Utc::now();
        let items = vec![
            mk("none", ItemType::News, "x", &[], None),
            mk("old", ItemType::News, "x", &[], Some(now - Duration::days(3))),
            mk("tie1", ItemType::News, "x", &[], Some(now)),
            mk("tie2", ItemType::Video, "x", &[], Some(now)),
        ];
        let out = rank_items(&items, &Query::default(), now);
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["tie1", "tie2", "old", "none"]);
    }

    #[test]
    fn hot_ties_keep_input_order() {
        let now = Utc::now();
        let items = vec![
            mk("first", ItemType::News, "x", &[], Some(now)),
            mk("second", ItemType::News, "y", &[], Some(now)),
        ];
        let q = Query::default().with_sort(SortMode::Hot);
        let ids: Vec<_> = rank_items(&items, &q, now)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn empty_in_empty_out() {
        let snap = Snapshot::empty(Utc::now());
        assert!(rank(&snap, &Query::default().with_sort(SortMode::Hot), Utc::now()).is_empty());
    }
}
