//! Library documentation lookup with a local cache and lookup history

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::local_storage::{keys, LocalStorage, LocalStorageError};

pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("documentation service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("no library matches '{0}'")]
    NoMatch(String),

    #[error(transparent)]
    LocalStorage(#[from] LocalStorageError),
}

/// A search hit, best match first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryMatch {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_snippets: Option<u32>,
    #[serde(default)]
    pub trust_score: Option<f64>,
}

pub trait DocsService {
    fn search(&self, library: &str) -> Result<Vec<LibraryMatch>, DocsError>;
    fn fetch_docs(&self, library_id: &str, topic: Option<&str>) -> Result<String, DocsError>;
}

pub struct HttpDocsService {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<LibraryMatch>,
}

impl HttpDocsService {
    pub fn from_config(config: &Config) -> Result<Self, DocsError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("murp/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.docs_base_url().trim_end_matches('/').to_string(),
            api_key: config.docs.api_key.clone(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, DocsError> {
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DocsError::Api {
                status: status.as_u16(),
                message: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp)
    }
}

impl DocsService for HttpDocsService {
    fn search(&self, library: &str) -> Result<Vec<LibraryMatch>, DocsError> {
        let url = format!("{}/search?query={}", self.base_url, urlencoding::encode(library));
        tracing::info!(library, "searching documentation libraries");
        let body: SearchResponse = self
            .get(&url)?
            .json()
            .map_err(|e| DocsError::Decode(e.to_string()))?;
        Ok(body.results)
    }

    fn fetch_docs(&self, library_id: &str, topic: Option<&str>) -> Result<String, DocsError> {
        let mut url = format!(
            "{}/{}?type=txt",
            self.base_url,
            library_id.trim_start_matches('/')
        );
        if let Some(topic) = topic {
            url.push_str(&format!("&topic={}", urlencoding::encode(topic)));
        }
        tracing::info!(library_id, ?topic, "fetching documentation");
        Ok(self.get(&url)?.text()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    content: String,
    fetched_at: DateTime<Utc>,
}

/// One past lookup, newest first in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub library: String,
    pub library_id: String,
    pub topic: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub library_id: String,
    pub content: String,
    pub from_cache: bool,
}

fn cache_key(library_id: &str, topic: Option<&str>) -> String {
    format!("{}#{}", library_id, topic.unwrap_or(""))
}

/// Wraps a [`DocsService`] with a TTL cache and history kept in local storage
pub struct CachedDocs<'a, D: DocsService + ?Sized> {
    service: &'a D,
    storage: &'a mut LocalStorage,
    ttl: Duration,
}

impl<'a, D: DocsService + ?Sized> CachedDocs<'a, D> {
    pub fn new(service: &'a D, storage: &'a mut LocalStorage, ttl_hours: u32) -> Self {
        Self {
            service,
            storage,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    fn cache(&self) -> BTreeMap<String, CacheEntry> {
        self.storage.get(keys::DOCS_CACHE).unwrap_or_default()
    }

    pub fn search(&self, library: &str) -> Result<Vec<LibraryMatch>, DocsError> {
        self.service.search(library)
    }

    /// Resolve `library` to its best match and fetch its docs, using the cache
    /// while the entry is younger than the TTL
    pub fn lookup(&mut self, library: &str, topic: Option<&str>) -> Result<Lookup, DocsError> {
        let library_id = if library.starts_with('/') {
            library.to_string()
        } else {
            self.service
                .search(library)?
                .into_iter()
                .next()
                .map(|m| m.id)
                .ok_or_else(|| DocsError::NoMatch(library.to_string()))?
        };

        let now = Utc::now();
        let key = cache_key(&library_id, topic);
        let mut cache = self.cache();

        let (content, from_cache) = match cache.get(&key) {
            Some(entry) if now - entry.fetched_at < self.ttl => {
                tracing::debug!(%key, "documentation cache hit");
                (entry.content.clone(), true)
            }
            _ => {
                let content = self.service.fetch_docs(&library_id, topic)?;
                cache.insert(
                    key,
                    CacheEntry {
                        content: content.clone(),
                        fetched_at: now,
                    },
                );
                self.storage.set(keys::DOCS_CACHE, &cache)?;
                (content, false)
            }
        };

        self.record_history(HistoryEntry {
            library: library.to_string(),
            library_id: library_id.clone(),
            topic: topic.map(str::to_string),
            at: now,
        })?;

        Ok(Lookup {
            library_id,
            content,
            from_cache,
        })
    }

    fn record_history(&mut self, entry: HistoryEntry) -> Result<(), DocsError> {
        let mut history = history(self.storage);
        history.retain(|h| !(h.library_id == entry.library_id && h.topic == entry.topic));
        history.insert(0, entry);
        history.truncate(HISTORY_LIMIT);
        self.storage.set(keys::DOCS_HISTORY, &history)?;
        Ok(())
    }
}

pub fn history(storage: &LocalStorage) -> Vec<HistoryEntry> {
    storage.get(keys::DOCS_HISTORY).unwrap_or_default()
}

pub fn clear_cache(storage: &mut LocalStorage) -> Result<(), LocalStorageError> {
    storage.remove(keys::DOCS_CACHE)
}

pub fn clear_history(storage: &mut LocalStorage) -> Result<(), LocalStorageError> {
    storage.remove(keys::DOCS_HISTORY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct FakeDocs {
        fetches: Cell<usize>,
    }

    impl FakeDocs {
        fn new() -> Self {
            Self { fetches: Cell::new(0) }
        }
    }

    impl DocsService for FakeDocs {
        fn search(&self, library: &str) -> Result<Vec<LibraryMatch>, DocsError> {
            if library == "nothing" {
                return Ok(Vec::new());
            }
            Ok(vec![LibraryMatch {
                id: format!("/org/{}", library),
                title: library.to_string(),
                description: None,
                total_snippets: Some(10),
                trust_score: Some(9.0),
            }])
        }

        fn fetch_docs(&self, library_id: &str, topic: Option<&str>) -> Result<String, DocsError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(format!("# {} {}", library_id, topic.unwrap_or("")))
        }
    }

    #[test]
    fn test_second_lookup_hits_cache() {
        let tmp = tempdir().unwrap();
        let mut storage = LocalStorage::load(&tmp.path().join("ls.json"));
        let fake = FakeDocs::new();
        let mut docs = CachedDocs::new(&fake, &mut storage, 24);

        let first = docs.lookup("serde", Some("derive")).unwrap();
        let second = docs.lookup("serde", Some("derive")).unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.content, second.content);
        assert_eq!(fake.fetches.get(), 1);
    }

    #[test]
    fn test_zero_ttl_always_fetches() {
        let tmp = tempdir().unwrap();
        let mut storage = LocalStorage::load(&tmp.path().join("ls.json"));
        let fake = FakeDocs::new();
        let mut docs = CachedDocs::new(&fake, &mut storage, 0);

        docs.lookup("/org/tokio", None).unwrap();
        docs.lookup("/org/tokio", None).unwrap();
        assert_eq!(fake.fetches.get(), 2);
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        let mut storage = LocalStorage::load(&path);
        let fake = FakeDocs::new();
        {
            let mut docs = CachedDocs::new(&fake, &mut storage, 24);
            for i in 0..25 {
                docs.lookup(&format!("lib{}", i), None).unwrap();
            }
            docs.lookup("lib3", None).unwrap();
        }

        let entries = history(&LocalStorage::load(&path));
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0].library, "lib3");
        assert_eq!(entries[1].library, "lib24");
        assert_eq!(entries.iter().filter(|h| h.library == "lib3").count(), 1);
    }

    #[test]
    fn test_no_match_and_clear_cache() {
        let tmp = tempdir().unwrap();
        let mut storage = LocalStorage::load(&tmp.path().join("ls.json"));
        let fake = FakeDocs::new();
        {
            let mut docs = CachedDocs::new(&fake, &mut storage, 24);
            assert!(matches!(docs.lookup("nothing", None), Err(DocsError::NoMatch(_))));
            docs.lookup("serde", None).unwrap();
        }
        clear_cache(&mut storage).unwrap();
        assert!(!storage.contains(keys::DOCS_CACHE));
        assert_eq!(history(&storage).len(), 1);
    }
}
