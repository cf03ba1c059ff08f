// src/ingest/providers/arxiv.rs
//! arXiv query API adapter.
//!
//! The API answers with an Atom envelope: zero or more `<entry>` elements carrying
//! `id`, `title`, `summary`, `published`/`updated` and one or more `<link>`s.
//! Malformed queries come back as a single entry whose id points at `/api/errors`.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::config::SourceDescriptor;
use crate::ingest::http::FeedClient;
use crate::ingest::providers::{non_empty, resolve_link, root_element_name, LinkRef};
use crate::ingest::types::{AdapterError, RawRecord, SourceAdapter};

pub const ARXIV_QUERY_URL: &str = "http://export.arxiv.org/api/query";
const FORMAT: &str = "arxiv atom";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: Option<String>,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

pub struct ArxivProvider {
    descriptor: SourceDescriptor,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: FeedClient,
        max_results: u32,
    },
}

impl ArxivProvider {
    pub fn from_fixture(descriptor: SourceDescriptor, xml: &str) -> Self {
        Self {
            descriptor,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_http(descriptor: SourceDescriptor, client: FeedClient, max_results: u32) -> Self {
        Self {
            descriptor,
            mode: Mode::Http {
                client,
                max_results,
            },
        }
    }

    /// `search_query` is form-encoded; results ordered by last update.
    pub fn query_url(query: &str, max_results: u32) -> Result<String, AdapterError> {
        let max = max_results.to_string();
        reqwest::Url::parse_with_params(
            ARXIV_QUERY_URL,
            &[
                ("search_query", query),
                ("sortBy", "lastUpdatedDate"),
                ("max_results", max.as_str()),
            ],
        )
        .map(|u| u.to_string())
        .map_err(|e| AdapterError::parse(FORMAT, format!("building query url: {e}")))
    }

    pub fn parse_records(xml: &str) -> Result<Vec<RawRecord>, AdapterError> {
        match root_element_name(xml)? {
            Some(root) if root == "feed" => {}
            Some(other) => {
                return Err(AdapterError::parse(
                    FORMAT,
                    format!("expected <feed> root, found <{other}>"),
                ))
            }
            None => return Err(AdapterError::parse(FORMAT, "empty document")),
        }

        let feed: Feed = from_str(xml).map_err(|e| AdapterError::parse(FORMAT, e.to_string()))?;

        let mut out = Vec::with_capacity(feed.entries.len());
        for e in feed.entries {
            let id = non_empty(e.id);
            if id.as_deref().is_some_and(|s| s.contains("/api/errors")) {
                let msg = non_empty(e.summary).unwrap_or_else(|| "query rejected".to_string());
                return Err(AdapterError::parse(FORMAT, msg));
            }

            let links: Vec<LinkRef> = e
                .links
                .into_iter()
                .map(|l| LinkRef {
                    href: l.href,
                    rel: l.rel,
                })
                .collect();
            let url = resolve_link(&links).or_else(|| id.clone());
            let title = non_empty(e.title);
            let body = non_empty(e.summary).or_else(|| title.clone());

            out.push(RawRecord {
                id,
                title,
                url,
                published: non_empty(e.published).or_else(|| non_empty(e.updated)),
                body,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for ArxivProvider {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, AdapterError> {
        match &self.mode {
            Mode::Fixture(xml) => Self::parse_records(xml),
            Mode::Http {
                client,
                max_results,
            } => {
                let url = Self::query_url(&self.descriptor.target, *max_results)?;
                let body = client.fetch_text(&url).await?;
                Self::parse_records(&body)
            }
        }
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T00:00:00Z</updated>
    <published>2024-01-01T00:00:00Z</published>
    <title>Learning to Walk</title>
    <summary>We train a robot.</summary>
    <author><name>A. Person</name></author>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <arxiv:primary_category term="cs.RO" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.RO" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn prefers_alternate_link_and_published_date() {
        let recs = ArxivProvider::parse_records(ENTRY_XML).unwrap();
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.url.as_deref(), Some("http://arxiv.org/abs/2401.00001v1"));
        assert_eq!(r.published.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(r.id.as_deref(), Some("http://arxiv.org/abs/2401.00001v1"));
        assert_eq!(r.body.as_deref(), Some("We train a robot."));
    }

    #[test]
    fn links_split_by_other_elements_still_parse() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <published>2024-01-03T00:00:00Z</published>
    <title>Driving Policies at Scale</title>
    <summary>We drive.</summary>
    <arxiv:doi>10.0000/example.1</arxiv:doi>
    <link title="doi" href="http://dx.doi.org/10.0000/example.1" rel="related"/>
    <arxiv:comment>12 pages</arxiv:comment>
    <arxiv:journal_ref>Example Journal 1 (2024)</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/2401.00002v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00002v1" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;
        let recs = ArxivProvider::parse_records(xml).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].url.as_deref(), Some("http://arxiv.org/abs/2401.00002v1"));
    }

    #[test]
    fn empty_envelope_is_zero_records() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>q</title></feed>"#;
        assert!(ArxivProvider::parse_records(xml).unwrap().is_empty());
    }

    #[test]
    fn api_error_entry_is_parse_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_x</id>
    <title>Error</title>
    <summary>incorrect id format for x</summary>
  </entry>
</feed>"#;
        let err = ArxivProvider::parse_records(xml).unwrap_err();
        assert!(matches!(err, AdapterError::Parse { .. }));
    }

    #[test]
    fn non_atom_payload_is_parse_error() {
        let err = ArxivProvider::parse_records("<html><body>busy</body></html>").unwrap_err();
        assert!(matches!(err, AdapterError::Parse { .. }));
    }

    #[test]
    fn query_url_is_encoded() {
        let u = ArxivProvider::query_url(r#"all:"embodied ai""#, 5).unwrap();
        assert!(u.starts_with(ARXIV_QUERY_URL));
        assert!(u.contains("sortBy=lastUpdatedDate"));
        assert!(u.contains("max_results=5"));
        assert!(!u.contains(' '));
    }
}
