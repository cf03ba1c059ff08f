//! Hot score: recency decay × type weight × topical boosts.
//!
//! score = 1 / (1 + age_days) × type_weight × Π boost_factor
//!
//! `age_days` is clamped at 0 (future timestamps count as "now"); a missing
//! timestamp also counts as "now".

use chrono::{DateTime, Utc};

use crate::analyze::rules::BoostRules;
use crate::item::{Item, ItemType};

const MS_PER_DAY: f64 = 86_400_000.0;

pub fn type_weight(t: ItemType) -> f64 {
    match t {
        ItemType::Paper => 1.12,
        ItemType::News => 1.05,
        ItemType::Video => 1.02,
    }
}

/// Fractional days between `published_at` and `now`, never negative.
pub fn age_days(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let ms = published_at
        .map(|p| (now - p).num_milliseconds())
        .unwrap_or(0);
    (ms as f64 / MS_PER_DAY).max(0.0)
}

pub fn hot_score(item: &Item, now: DateTime<Utc>) -> f64 {
    hot_score_with(BoostRules::builtin(), item, now)
}

pub fn hot_score_with(boosts: &BoostRules, item: &Item, now: DateTime<Utc>) -> f64 {
    let decay = 1.0 / (1.0 + age_days(item.published_at, now));
    decay * type_weight(item.item_type) * boosts.factor_for(&item.search_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(title: &str, t: ItemType, published_at: Option<DateTime<Utc>>) -> Item {
        Item {
            id: title.to_string(),
            title: title.to_string(),
            url: String::new(),
            published_at,
            summary: String::new(),
            source: "test".into(),
            item_type: t,
            tags: vec![],
        }
    }

    #[test]
    fn fresh_plain_items_score_their_type_weight() {
        let now = Utc::now();
        let s = hot_score(&item("plain", ItemType::News, Some(now)), now);
        assert!((s - 1.05).abs() < 1e-9);
    }

    #[test]
    fn one_day_old_halves_the_decay() {
        let now = Utc::now();
        let s = hot_score(
            &item("plain", ItemType::Video, Some(now - Duration::days(1))),
            now,
        );
        assert!((s - 0.5 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn missing_or_future_timestamp_counts_as_now() {
        let now = Utc::now();
        assert_eq!(age_days(None, now), 0.0);
        assert_eq!(age_days(Some(now + Duration::hours(5)), now), 0.0);
    }

    #[test]
    fn newer_never_scores_lower() {
        let now = Utc::now();
        let mut prev = f64::INFINITY;
        for h in [0i64, 1, 12, 24, 24 * 30, 24 * 365] {
            let s = hot_score(
                &item("A Survey", ItemType::Paper, Some(now - Duration::hours(h))),
                now,
            );
            assert!(s <= prev);
            prev = s;
        }
    }
}
