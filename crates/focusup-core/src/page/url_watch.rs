//! Detection of in-document navigation.
//!
//! Single-page sites change the URL without a reload. Three observers feed
//! this watcher (DOM mutations, history calls and a fallback poll); only a
//! URL that differs from the last one seen counts as a change.

/// Where a URL observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    DomMutation,
    /// pushState, replaceState or popstate.
    HistoryCall,
    Poll,
}

/// A detected URL change and how long to wait before re-checking the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChange {
    pub url: String,
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct UrlWatcher {
    last_url: String,
    recheck_delay_ms: u64,
    history_delay_ms: u64,
}

impl UrlWatcher {
    pub fn new(initial_url: impl Into<String>, recheck_delay_ms: u64, history_delay_ms: u64) -> Self {
        Self {
            last_url: initial_url.into(),
            recheck_delay_ms,
            history_delay_ms,
        }
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    /// Record an observation. Returns the change when `url` is new.
    pub fn observe(&mut self, source: UrlSource, url: &str) -> Option<UrlChange> {
        if url == self.last_url {
            return None;
        }
        self.last_url = url.to_string();
        Some(UrlChange {
            url: url.to_string(),
            delay_ms: self.delay_for(source),
        })
    }

    fn delay_for(&self, source: UrlSource) -> u64 {
        match source {
            // The history API updates the URL before the page renders.
            UrlSource::HistoryCall => self.history_delay_ms + self.recheck_delay_ms,
            UrlSource::DomMutation | UrlSource::Poll => self.recheck_delay_ms,
        }
    }
}
