//! Query-shaped input for the ranker. Every field is optional in spirit:
//! values that do not parse are treated as "unset", never as errors.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemType;

/// Recency window measured back from evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "none")]
    All,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "5y")]
    Years5,
}

impl TimeWindow {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "all" => Some(TimeWindow::All),
            "7d" => Some(TimeWindow::Days7),
            "30d" => Some(TimeWindow::Days30),
            "1y" => Some(TimeWindow::Year1),
            "5y" => Some(TimeWindow::Years5),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "none",
            TimeWindow::Days7 => "7d",
            TimeWindow::Days30 => "30d",
            TimeWindow::Year1 => "1y",
            TimeWindow::Years5 => "5y",
        }
    }

    /// Earliest admitted timestamp (inclusive), or `None` for no window.
    ///
    /// - `7d` / `30d`: rolling N × 24h
    /// - `1y`: same month/day/time one calendar year back (Feb 29 → Feb 28)
    /// - `5y`: January 1st 00:00 UTC of (current year − 5)
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Days7 => Some(now - Duration::days(7)),
            TimeWindow::Days30 => Some(now - Duration::days(30)),
            TimeWindow::Year1 => {
                let y = now.year() - 1;
                NaiveDate::from_ymd_opt(y, now.month(), now.day())
                    .or_else(|| NaiveDate::from_ymd_opt(y, now.month(), 28))
                    .map(|d| d.and_time(now.time()).and_utc())
            }
            TimeWindow::Years5 => NaiveDate::from_ymd_opt(now.year() - 5, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
        }
    }

    /// Missing timestamps count as the epoch and therefore fall outside any window.
    pub fn admits(&self, ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self.cutoff(now) {
            None => true,
            Some(cut) => ts.unwrap_or(DateTime::UNIX_EPOCH) >= cut,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Latest,
    Hot,
}

impl SortMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Some(SortMode::Latest),
            "hot" => Some(SortMode::Hot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Lower-cased, trimmed; empty means no text filter.
    pub text: String,
    pub item_type: Option<ItemType>,
    pub tag: Option<String>,
    pub window: TimeWindow,
    pub sort: SortMode,
}

impl Query {
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.trim().to_lowercase();
        self
    }

    pub fn with_type(mut self, t: ItemType) -> Self {
        self.item_type = Some(t);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        let tag = tag.trim();
        self.tag = (!tag.is_empty()).then(|| tag.to_string());
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

/// Raw string tuple as received from a caller (query string, RPC, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl QueryParams {
    /// Build from raw key/value pairs. A repeated key keeps its first value;
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut p = QueryParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut p.q,
                "type" => &mut p.item_type,
                "tag" => &mut p.tag,
                "window" => &mut p.window,
                "sort" => &mut p.sort,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        p
    }

    pub fn into_query(self) -> Query {
        Query {
            text: self
                .q
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_default(),
            item_type: self.item_type.as_deref().and_then(ItemType::parse),
            tag: self
                .tag
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            window: self
                .window
                .as_deref()
                .and_then(TimeWindow::parse)
                .unwrap_or_default(),
            sort: self
                .sort
                .as_deref()
                .and_then(SortMode::parse)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rolling_windows_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let edge = now - Duration::days(7);
        assert!(TimeWindow::Days7.admits(Some(edge), now));
        assert!(!TimeWindow::Days7.admits(Some(edge - Duration::milliseconds(1)), now));
        assert!(TimeWindow::Days30.admits(Some(now - Duration::days(30)), now));
        assert!(!TimeWindow::Days7.admits(None, now));
        assert!(TimeWindow::All.admits(None, now));
    }

    #[test]
    fn calendar_windows() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(
            TimeWindow::Year1.cutoff(now),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap())
        );
        assert_eq!(
            TimeWindow::Years5.cutoff(now),
            Some(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())
        );

        let leap = Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
        assert_eq!(
            TimeWindow::Year1.cutoff(leap),
            Some(Utc.with_ymd_and_hms(2023, 2, 28, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn malformed_params_are_unset() {
        let q = QueryParams {
            q: Some("  Humanoid ".into()),
            item_type: Some("podcast".into()),
            tag: Some("   ".into()),
            window: Some("2w".into()),
            sort: Some("random".into()),
        }
        .into_query();
        assert_eq!(q.text, "humanoid");
        assert_eq!(q.item_type, None);
        assert_eq!(q.tag, None);
        assert_eq!(q.window, TimeWindow::All);
        assert_eq!(q.sort, SortMode::Latest);
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let pairs = [
            ("window", "7d"),
            ("window", "30d"),
            ("sort", "hot"),
            ("sort", "latest"),
            ("utm_source", "feed"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let p = QueryParams::from_pairs(pairs);
        assert_eq!(p.window.as_deref(), Some("7d"));
        assert_eq!(p.sort.as_deref(), Some("hot"));
        assert_eq!(p.q, None);

        let q = p.into_query();
        assert_eq!(q.window, TimeWindow::Days7);
        assert_eq!(q.sort, SortMode::Hot);
    }

    #[test]
    fn well_formed_params_parse() {
        let q = QueryParams {
            q: None,
            item_type: Some("Paper".into()),
            tag: Some("Robotics".into()),
            window: Some("30D".into()),
            sort: Some("hot".into()),
        }
        .into_query();
        assert_eq!(q.item_type, Some(ItemType::Paper));
        assert_eq!(q.tag.as_deref(), Some("Robotics"));
        assert_eq!(q.window, TimeWindow::Days30);
        assert_eq!(q.sort, SortMode::Hot);
    }
}
