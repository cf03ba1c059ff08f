// src/ingest/providers/syndication.rs
//! RSS / Atom adapter.
//!
//! The dialect is picked once from the document root (`<rss>`/`<rdf:RDF>` vs
//! `<feed>`), each record is read into its dialect struct, and both dialects go
//! through `map_entry` so id/link/body fallbacks live in one place.
//!
//! Element names are matched as written (`content:encoded`, `media:description`).

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::config::SourceDescriptor;
use crate::ingest::http::FeedClient;
use crate::ingest::providers::{non_empty, resolve_link, root_element_name, LinkRef};
use crate::ingest::types::{AdapterError, RawRecord, SourceAdapter};

const FORMAT: &str = "syndication";

/// `<item>` of RSS 2.0 / RSS 1.0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub description: Option<String>,
    pub content_encoded: Option<String>,
    pub content: Option<String>,
}

/// `<entry>` of Atom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub links: Vec<LinkRef>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    /// YouTube puts the video description under `<media:group>`.
    pub media_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyndicationDoc {
    Rss(Vec<RssItem>),
    Atom(Vec<AtomEntry>),
}

impl SyndicationDoc {
    pub fn len(&self) -> usize {
        match self {
            SyndicationDoc::Rss(v) => v.len(),
            SyndicationDoc::Atom(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            SyndicationDoc::Rss(items) => items
                .into_iter()
                .map(|it| map_entry(FeedEntry::from(it)))
                .collect(),
            SyndicationDoc::Atom(entries) => entries
                .into_iter()
                .map(|e| map_entry(FeedEntry::from(e)))
                .collect(),
        }
    }
}

/// Dialect-neutral view consumed by `map_entry`.
struct FeedEntry {
    native_id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    published: Option<String>,
    /// Body candidates in preference order.
    bodies: [Option<String>; 3],
}

impl From<RssItem> for FeedEntry {
    fn from(it: RssItem) -> Self {
        Self {
            native_id: it.guid,
            title: it.title,
            url: it.link,
            published: it.pub_date,
            bodies: [it.description, it.content_encoded, it.content],
        }
    }
}

impl From<AtomEntry> for FeedEntry {
    fn from(e: AtomEntry) -> Self {
        Self {
            native_id: e.id,
            title: e.title,
            url: resolve_link(&e.links),
            published: non_empty(e.published).or(e.updated),
            bodies: [e.summary, e.content, e.media_description],
        }
    }
}

fn map_entry(e: FeedEntry) -> RawRecord {
    let title = non_empty(e.title);
    let url = non_empty(e.url);
    let id = non_empty(e.native_id)
        .or_else(|| url.clone())
        .or_else(|| title.clone());
    let body = e
        .bodies
        .into_iter()
        .find_map(non_empty)
        .or_else(|| title.clone());

    RawRecord {
        id,
        title,
        url,
        published: non_empty(e.published),
        body,
    }
}

#[derive(Clone, Copy)]
enum Dialect {
    Rss,
    Atom,
}

impl Dialect {
    fn record_tag(self) -> &'static [u8] {
        match self {
            Dialect::Rss => b"item",
            Dialect::Atom => b"entry",
        }
    }
}

struct Frame {
    name: String,
    text: String,
}

/// Children of one record, keyed by element name; first non-empty value wins.
#[derive(Default)]
struct Pending {
    fields: HashMap<String, String>,
    links: Vec<LinkRef>,
    stack: Vec<Frame>,
}

impl Pending {
    // Innermost element gets the text as-is; enclosing ones collect it space-separated.
    fn push_text(&mut self, s: &str) {
        let Some(last) = self.stack.len().checked_sub(1) else {
            return;
        };
        for (i, frame) in self.stack.iter_mut().enumerate() {
            if i != last && !frame.text.is_empty() {
                frame.text.push(' ');
            }
            frame.text.push_str(s);
        }
    }

    /// Only direct children of the record become fields, plus the children
    /// of a direct `media:group`. Anything deeper (Atom `<source>`, `<author>`)
    /// still feeds its parent's text but never shadows the record's own values.
    fn records_field(&self) -> bool {
        match self.stack.as_slice() {
            [] => true,
            [parent] => parent.name == "media:group",
            _ => false,
        }
    }

    fn close(&mut self) -> bool {
        match self.stack.pop() {
            Some(frame) => {
                let text = frame.text.trim();
                if !text.is_empty() && self.records_field() {
                    self.fields
                        .entry(frame.name)
                        .or_insert_with(|| text.to_string());
                }
                false
            }
            None => true,
        }
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    fn into_rss(mut self) -> RssItem {
        RssItem {
            guid: self.take("guid"),
            title: self.take("title"),
            link: self.take("link"),
            pub_date: self.take("pubDate").or_else(|| self.take("dc:date")),
            description: self.take("description"),
            content_encoded: self.take("content:encoded"),
            content: self.take("content"),
        }
    }

    fn into_atom(mut self) -> AtomEntry {
        let mut links = std::mem::take(&mut self.links);
        // Some Atom producers emit `<link>url</link>` text instead of href.
        if let Some(text) = self.take("link") {
            links.push(LinkRef {
                href: Some(text),
                rel: None,
            });
        }
        AtomEntry {
            id: self.take("id"),
            title: self.take("title"),
            links,
            published: self.take("published"),
            updated: self.take("updated"),
            summary: self.take("summary"),
            content: self.take("content"),
            media_description: self.take("media:description"),
        }
    }
}

fn link_attrs(e: &BytesStart<'_>) -> LinkRef {
    let mut link = LinkRef::default();
    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        match attr.key.local_name().as_ref() {
            b"href" => link.href = Some(value),
            b"rel" => link.rel = Some(value),
            _ => {}
        }
    }
    link
}

/// Sniff the dialect and read every record of the document.
pub fn parse_document(xml: &str) -> Result<SyndicationDoc, AdapterError> {
    let dialect = match root_element_name(xml)?.as_deref() {
        Some("rss") | Some("RDF") => Dialect::Rss,
        Some("feed") => Dialect::Atom,
        Some(other) => {
            return Err(AdapterError::parse(
                FORMAT,
                format!("unrecognized root element <{other}>"),
            ))
        }
        None => return Err(AdapterError::parse(FORMAT, "empty document")),
    };

    let record_tag = dialect.record_tag();
    let mut reader = Reader::from_str(xml);
    let mut done: Vec<Pending> = Vec::new();
    let mut current: Option<Pending> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            AdapterError::parse(
                FORMAT,
                format!("at byte {}: {e}", reader.buffer_position()),
            )
        })?;

        match event {
            Event::Eof => break,
            Event::Start(e) => match current.as_mut() {
                None => {
                    if e.local_name().as_ref() == record_tag {
                        current = Some(Pending::default());
                    }
                }
                Some(p) => {
                    if p.stack.is_empty() && e.local_name().as_ref() == b"link" {
                        p.links.push(link_attrs(&e));
                    }
                    p.stack.push(Frame {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        text: String::new(),
                    });
                }
            },
            Event::Empty(e) => {
                if let Some(p) = current.as_mut() {
                    if p.stack.is_empty() && e.local_name().as_ref() == b"link" {
                        p.links.push(link_attrs(&e));
                    }
                }
            }
            Event::Text(t) => {
                if let Some(p) = current.as_mut() {
                    let s = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    p.push_text(&s);
                }
            }
            Event::CData(c) => {
                if let Some(p) = current.as_mut() {
                    p.push_text(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let record_closed = current.as_mut().is_some_and(Pending::close);
                if record_closed {
                    done.extend(current.take());
                }
            }
            _ => {}
        }
    }

    Ok(match dialect {
        Dialect::Rss => SyndicationDoc::Rss(done.into_iter().map(Pending::into_rss).collect()),
        Dialect::Atom => {
            SyndicationDoc::Atom(done.into_iter().map(Pending::into_atom).collect())
        }
    })
}

pub struct SyndicationProvider {
    descriptor: SourceDescriptor,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: FeedClient },
}

impl SyndicationProvider {
    pub fn from_fixture(descriptor: SourceDescriptor, xml: &str) -> Self {
        Self {
            descriptor,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_http(descriptor: SourceDescriptor, client: FeedClient) -> Self {
        Self {
            descriptor,
            mode: Mode::Http { client },
        }
    }

    pub fn parse_records(xml: &str) -> Result<Vec<RawRecord>, AdapterError> {
        Ok(parse_document(xml)?.into_records())
    }
}

#[async_trait]
impl SourceAdapter for SyndicationProvider {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, AdapterError> {
        match &self.mode {
            Mode::Fixture(xml) => Self::parse_records(xml),
            Mode::Http { client } => {
                let body = client.fetch_text(&self.descriptor.target).await?;
                Self::parse_records(&body)
            }
        }
    }

    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}
