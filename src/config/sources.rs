// src/config/sources.rs
//! Feed source list and fetch settings.
//!
//! Lookup order:
//! 1) `$FEED_CONFIG_PATH` (must exist)
//! 2) `config/sources.toml`
//! 3) `config/sources.json`
//! 4) built-in seed list (`FeedConfig::default_seed()`)
//!
//! `FEED_PACING_MS` and `FEED_OUTPUT_PATH` override the loaded values.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::item::ItemType;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_PACING_MS: &str = "FEED_PACING_MS";
pub const ENV_OUTPUT_PATH: &str = "FEED_OUTPUT_PATH";

/// Which adapter family handles a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Parameterized paper search (arXiv query API).
    #[serde(alias = "query_api")]
    Arxiv,
    /// RSS 2.0 / RSS 1.0 / Atom feed URL.
    #[serde(alias = "rss", alias = "atom")]
    Syndication,
}

/// One adapter invocation: what to fetch and how to stamp the resulting items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub kind: AdapterKind,
    /// Search query for `Arxiv`, feed URL for `Syndication`.
    #[serde(alias = "query", alias = "url")]
    pub target: String,
    /// Label written into `Item::source`.
    pub source: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl SourceDescriptor {
    pub fn arxiv(query: &str) -> Self {
        Self {
            kind: AdapterKind::Arxiv,
            target: query.to_string(),
            source: "arXiv".to_string(),
            item_type: ItemType::Paper,
        }
    }

    pub fn syndication(url: &str, source: &str, item_type: ItemType) -> Self {
        Self {
            kind: AdapterKind::Syndication,
            target: url.to_string(),
            source: source.to_string(),
            item_type,
        }
    }
}

fn default_user_agent() -> String {
    "robotics-daily/0.1".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_pacing_ms() -> u64 {
    500
}
fn default_arxiv_max_results() -> u32 {
    35
}
fn default_output_path() -> PathBuf {
    PathBuf::from("data/items.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay between two consecutive source fetches.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_arxiv_max_results")]
    pub arxiv_max_results: u32,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

impl FeedConfig {
    /// Load from an explicit path. Format is picked from the extension (TOML or JSON).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing JSON feed config {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing TOML feed config {}", path.display()))?
        };
        Ok(cfg)
    }

    /// Resolve config via env var + fallbacks, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = Self::resolve()?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn resolve() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/sources.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/sources.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default_seed())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(ms) = std::env::var(ENV_PACING_MS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.pacing_ms = ms;
        }
        if let Ok(p) = std::env::var(ENV_OUTPUT_PATH) {
            if !p.trim().is_empty() {
                self.output_path = PathBuf::from(p.trim());
            }
        }
    }

    /// Built-in source list: arXiv robotics query, YouTube and Bilibili keyword
    /// feeds, and robotics news blogs.
    pub fn default_seed() -> Self {
        let mut sources = vec![SourceDescriptor::arxiv(
            r#"cat:cs.RO OR (all:"autonomous driving") OR (all:robotics) OR (all:"embodied ai")"#,
        )];

        for (url, label) in [
            (
                "https://www.youtube.com/feeds/videos.xml?search_query=autonomous+driving",
                "YouTube: Autonomous Driving",
            ),
            (
                "https://www.youtube.com/feeds/videos.xml?search_query=embodied+ai",
                "YouTube: Embodied AI",
            ),
            (
                "https://www.youtube.com/feeds/videos.xml?search_query=robotics",
                "YouTube: Robotics",
            ),
            (
                "https://rsshub.app/bilibili/keyword/%E8%87%AA%E5%8A%A8%E9%A9%BE%E9%A9%B6",
                "Bilibili: 自动驾驶",
            ),
            (
                "https://rsshub.app/bilibili/keyword/%E6%9C%BA%E5%99%A8%E4%BA%BA",
                "Bilibili: 机器人",
            ),
            (
                "https://rsshub.app/bilibili/keyword/%E5%85%B7%E8%BA%AB%E6%99%BA%E8%83%BD",
                "Bilibili: 具身智能",
            ),
        ] {
            sources.push(SourceDescriptor::syndication(url, label, ItemType::Video));
        }

        for (url, label) in [
            ("https://www.therobotreport.com/feed/", "The Robot Report"),
            (
                "https://techcrunch.com/tag/robotics/feed/",
                "TechCrunch Robotics",
            ),
            (
                "https://spectrum.ieee.org/topic/robotics/fulltext/feed",
                "IEEE Spectrum Robotics",
            ),
            (
                "https://blogs.nvidia.com/blog/category/robotics/feed/",
                "NVIDIA Blog: Robotics",
            ),
            ("https://blog.waymo.com/feeds/posts/default", "Waymo Blog"),
        ] {
            sources.push(SourceDescriptor::syndication(url, label, ItemType::News));
        }

        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            pacing_ms: default_pacing_ms(),
            arxiv_max_results: default_arxiv_max_results(),
            output_path: default_output_path(),
            sources,
        }
    }
}
