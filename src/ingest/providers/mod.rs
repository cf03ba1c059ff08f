// src/ingest/providers/mod.rs
pub mod arxiv;
pub mod syndication;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::{AdapterKind, FeedConfig, SourceDescriptor};
use crate::ingest::http::FeedClient;
use crate::ingest::types::{AdapterError, SourceAdapter};

use self::arxiv::ArxivProvider;
use self::syndication::SyndicationProvider;

/// Build the live (HTTP) adapter for one descriptor.
pub fn build_adapter(
    descriptor: &SourceDescriptor,
    client: &FeedClient,
    cfg: &FeedConfig,
) -> Box<dyn SourceAdapter> {
    match descriptor.kind {
        AdapterKind::Arxiv => Box::new(ArxivProvider::from_http(
            descriptor.clone(),
            client.clone(),
            cfg.arxiv_max_results,
        )),
        AdapterKind::Syndication => Box::new(SyndicationProvider::from_http(
            descriptor.clone(),
            client.clone(),
        )),
    }
}

pub fn build_adapters(cfg: &FeedConfig, client: &FeedClient) -> Vec<Box<dyn SourceAdapter>> {
    cfg.sources
        .iter()
        .map(|d| build_adapter(d, client, cfg))
        .collect()
}

/// `<link rel=".." href="..">` as seen by both Atom-shaped adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRef {
    pub href: Option<String>,
    pub rel: Option<String>,
}

/// Prefer `rel="alternate"` (or a link without rel, which means alternate in Atom),
/// else the first link carrying an href.
pub(crate) fn resolve_link(links: &[LinkRef]) -> Option<String> {
    let usable = || links.iter().filter(|l| l.href.as_deref().is_some_and(|h| !h.trim().is_empty()));
    usable()
        .find(|l| {
            l.rel
                .as_deref()
                .map_or(true, |r| r.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| usable().next())
        .and_then(|l| l.href.as_deref())
        .map(|h| h.trim().to_string())
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Local name of the document's first element (`rss`, `feed`, `RDF`, ...).
pub(crate) fn root_element_name(xml: &str) -> Result<Option<String>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(Some(
                    String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => continue,
            Err(e) => return Err(AdapterError::parse("xml", e.to_string())),
        }
    }
}
