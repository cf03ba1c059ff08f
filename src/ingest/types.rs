// src/ingest/types.rs
use crate::config::SourceDescriptor;

/// Format-neutral record produced by every adapter before normalization.
/// All fields are raw feed text; the normalizer supplies defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Native identifier (arXiv id URL, RSS guid, Atom id).
    pub id: Option<String>,
    pub title: Option<String>,
    /// Already-resolved link to the original resource.
    pub url: Option<String>,
    /// Published (or updated) timestamp as written in the feed.
    pub published: Option<String>,
    /// Free-text body, possibly HTML.
    pub body: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Remote answered with a non-success status.
    #[error("fetch failed with HTTP {status} for {url}")]
    Fetch { url: String, status: u16 },

    /// Request never produced a response (DNS, TLS, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Payload does not match the schema expected by the adapter.
    #[error("malformed {format} payload: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl AdapterError {
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        AdapterError::Parse {
            format,
            message: message.into(),
        }
    }

    /// True for both non-2xx answers and transport failures.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            AdapterError::Fetch { .. } | AdapterError::Transport { .. }
        )
    }
}

/// One network retrieval per call, no retries.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, AdapterError>;
    fn descriptor(&self) -> &SourceDescriptor;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_retrieval_errors_count_as_fetch_failures() {
        let fetch = AdapterError::Fetch {
            url: "https://x.test/rss".into(),
            status: 503,
        };
        assert!(fetch.is_fetch());
        assert!(!AdapterError::parse("rss", "no channel").is_fetch());
    }
}
