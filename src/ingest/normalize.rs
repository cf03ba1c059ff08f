// src/ingest/normalize.rs
//! RawRecord → Item. Never fails: missing fields degrade to defaults.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::analyze::rules::TagRules;
use crate::ingest::types::RawRecord;
use crate::item::{parse_timestamp, Item, ItemType};

/// Character budget for `Item::summary`.
pub const SUMMARY_MAX_CHARS: usize = 420;
pub const UNTITLED: &str = "(untitled)";

const SENTENCE_END: [char; 6] = ['.', '!', '?', '。', '！', '？'];

fn re_script_style() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").unwrap()
    })
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Collapse any whitespace run (incl. NBSP, newlines) to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    re_ws().replace_all(s, " ").trim().to_string()
}

/// Upper bound on entity-decoding passes for multiply-escaped feed text.
const MAX_DECODE_PASSES: usize = 8;

/// Decode entities until the text stops changing, so `&amp;amp;` ends as `&`.
fn decode_entities(html: &str) -> String {
    let mut text = html.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        let next = html_escape::decode_html_entities(&text);
        if next == text {
            break;
        }
        text = next.into_owned();
    }
    text
}

/// Plain text from feed HTML: entities decoded, script/style dropped, tags removed.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let decoded = decode_entities(html);
    let out = re_script_style().replace_all(&decoded, " ");
    let out = re_tags().replace_all(&out, " ");
    collapse_ws(&out)
}

/// Split after sentence-ending punctuation that is followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_end = false;
    for (i, ch) in text.char_indices() {
        if prev_end && ch.is_whitespace() {
            let s = text[start..i].trim();
            if !s.is_empty() {
                out.push(s);
            }
            start = i;
        }
        prev_end = SENTENCE_END.contains(&ch);
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Accumulate whole sentences while the joined result stays within `max_chars`.
/// A first sentence that alone exceeds the budget is cut at the budget.
pub fn take_sentences(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut total = 0usize;

    for s in split_sentences(text) {
        let len = s.chars().count();
        let sep = usize::from(!out.is_empty());
        if total + sep + len > max_chars {
            if out.is_empty() {
                return s.chars().take(max_chars).collect::<String>().trim_end().to_string();
            }
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(s);
        total += sep + len;
        if total >= max_chars {
            break;
        }
    }
    out
}

fn clean_opt(v: Option<String>) -> Option<String> {
    v.map(|s| collapse_ws(&s)).filter(|s| !s.is_empty())
}

/// Map one adapter record into an `Item` with the built-in tag rules.
pub fn normalize_record(
    raw: RawRecord,
    source: &str,
    item_type: ItemType,
    ingested_at: DateTime<Utc>,
) -> Item {
    normalize_record_with(TagRules::builtin(), raw, source, item_type, ingested_at)
}

pub fn normalize_record_with(
    rules: &TagRules,
    raw: RawRecord,
    source: &str,
    item_type: ItemType,
    ingested_at: DateTime<Utc>,
) -> Item {
    let title = clean_opt(raw.title).unwrap_or_else(|| UNTITLED.to_string());
    let url = clean_opt(raw.url).unwrap_or_default();
    let id = clean_opt(raw.id)
        .or_else(|| (!url.is_empty()).then(|| url.clone()))
        .unwrap_or_else(|| title.clone());

    let published_at = raw
        .published
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(ingested_at);

    let summary = take_sentences(
        &strip_html(raw.body.as_deref().unwrap_or_default()),
        SUMMARY_MAX_CHARS,
    );
    let tags = rules.tags_for(&title, &summary);

    Item {
        id,
        title,
        url,
        published_at: Some(published_at),
        summary,
        source: source.trim().to_string(),
        item_type,
        tags,
    }
}

/// Re-run normalization over an existing item. A no-op for items produced by
/// `normalize_record`; a missing timestamp stays missing.
pub fn normalize_item(item: &Item) -> Item {
    let raw = RawRecord {
        id: Some(item.id.clone()),
        title: Some(item.title.clone()),
        url: Some(item.url.clone()),
        published: None,
        body: Some(item.summary.clone()),
    };
    let mut out = normalize_record(raw, &item.source, item.item_type, DateTime::UNIX_EPOCH);
    out.published_at = item.published_at;
    out
}
