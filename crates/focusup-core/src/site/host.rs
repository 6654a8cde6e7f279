//! Host normalization and block-list matching.
//!
//! Matching is deliberately approximate: a host is distracting when it
//! contains a block-list entry or is contained in one. Subdomains and
//! partial entries match; so do unrelated hosts that share a substring.

use serde::{Deserialize, Serialize};
use url::Url;

/// Sites that are always on the block list.
pub const BUILTIN_SITES: &[&str] = &[
    "youtube.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "reddit.com",
    "tiktok.com",
    "netflix.com",
    "twitch.tv",
    "pinterest.com",
    "linkedin.com",
    "snapchat.com",
    "discord.com",
    "whatsapp.com",
    "telegram.org",
];

/// Lower-case a host name and strip one leading `www.`.
pub fn normalize_host(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Extract the normalized host of a URL. `None` for URLs without a host
/// (`about:blank`, `data:` URLs) or unparsable input.
pub fn host_from_url(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?;
    let host = normalize_host(host);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Effective block list: built-ins plus the user's custom sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockList {
    builtin: Vec<String>,
    custom: Vec<String>,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new(BUILTIN_SITES.iter().copied())
    }
}

impl BlockList {
    pub fn new<I, S>(builtin: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            builtin: clean_entries(builtin),
            custom: Vec::new(),
        }
    }

    /// Replace the custom part of the list.
    pub fn set_custom<I, S>(&mut self, custom: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.custom = clean_entries(custom);
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.builtin.iter().chain(self.custom.iter()).map(String::as_str)
    }

    /// Bidirectional substring match against every entry.
    pub fn is_distracting(&self, host: &str) -> bool {
        let host = normalize_host(host);
        if host.is_empty() {
            return false;
        }
        self.entries()
            .any(|entry| host.contains(entry) || entry.contains(host.as_str()))
    }

    /// Classify a URL; returns the normalized host when it is distracting.
    pub fn classify_url(&self, raw_url: &str) -> Option<String> {
        host_from_url(raw_url).filter(|host| self.is_distracting(host))
    }
}

fn clean_entries<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for entry in entries {
        let entry = normalize_host(entry.as_ref());
        if !entry.is_empty() && !cleaned.contains(&entry) {
            cleaned.push(entry);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_www_and_case() {
        assert_eq!(normalize_host("WWW.YouTube.com"), "youtube.com");
        assert_eq!(normalize_host("youtube.com"), "youtube.com");
        assert_eq!(normalize_host("m.youtube.com"), "m.youtube.com");
        assert_eq!(normalize_host("www.www.example.com"), "www.example.com");
    }

    #[test]
    fn host_from_url_handles_common_shapes() {
        assert_eq!(
            host_from_url("https://www.youtube.com/watch?v=x").as_deref(),
            Some("youtube.com")
        );
        assert_eq!(
            host_from_url("https://WWW.Reddit.COM/r/rust").as_deref(),
            Some("reddit.com")
        );
        assert_eq!(host_from_url("about:blank"), None);
        assert_eq!(host_from_url("not a url"), None);
    }

    #[test]
    fn matching_tolerates_subdomains_and_partials() {
        let list = BlockList::default();
        assert!(list.is_distracting("youtube.com"));
        assert!(list.is_distracting("m.youtube.com"));
        assert!(list.is_distracting("old.reddit.com"));
        // Partial host contained in an entry.
        assert!(list.is_distracting("tube.com"));
        assert!(!list.is_distracting("docs.rs"));
        assert!(!list.is_distracting(""));
    }

    #[test]
    fn substring_false_positive_is_accepted() {
        let list = BlockList::default();
        // "x.com" is contained in many unrelated hosts.
        assert!(list.is_distracting("dropbox.com"));
    }

    #[test]
    fn custom_sites_extend_the_list() {
        let mut list = BlockList::default();
        assert!(!list.is_distracting("news.ycombinator.com"));
        list.set_custom(["WWW.news.ycombinator.com", "", "  "]);
        assert_eq!(list.custom(), &["news.ycombinator.com".to_string()]);
        assert!(list.is_distracting("news.ycombinator.com"));
    }

    #[test]
    fn classify_url_returns_normalized_host() {
        let list = BlockList::default();
        assert_eq!(
            list.classify_url("https://www.youtube.com/watch?v=x").as_deref(),
            Some("youtube.com")
        );
        assert_eq!(list.classify_url("https://crates.io/"), None);
    }
}
