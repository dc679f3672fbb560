use anyhow::{Context, Result};
use async_trait::async_trait;
use dl_api_types::DeferredDeepLink;
use rocksdb::{DB, Options};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const DEFERRED_DEEP_LINK_COOKIE_NAME: &str = "deferred_deeplink";
pub const DEFERRED_DEEP_LINK_COOKIE_URL: &str = "https://link.metamask.io";
pub const DEFAULT_COOKIE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieQuery {
    pub url: String,
    pub name: String,
}

impl CookieQuery {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }

    pub fn deferred_deep_link() -> Self {
        Self::new(DEFERRED_DEEP_LINK_COOKIE_URL, DEFERRED_DEEP_LINK_COOKIE_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Read side of a browser-style cookie jar.
#[async_trait]
pub trait CookieStore: Send + Sync {
    async fn get(&self, query: &CookieQuery) -> Result<Option<Cookie>>;
}

#[derive(Default)]
pub struct InMemoryCookieStore {
    cookies: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryCookieStore {
    pub async fn set_cookie(&self, query: &CookieQuery, value: impl Into<String>) {
        let mut guard = self.cookies.write().await;
        guard.insert((query.url.clone(), query.name.clone()), value.into());
    }

    pub async fn remove_cookie(&self, query: &CookieQuery) {
        let mut guard = self.cookies.write().await;
        guard.remove(&(query.url.clone(), query.name.clone()));
    }
}

#[async_trait]
impl CookieStore for InMemoryCookieStore {
    async fn get(&self, query: &CookieQuery) -> Result<Option<Cookie>> {
        let guard = self.cookies.read().await;
        Ok(guard
            .get(&(query.url.clone(), query.name.clone()))
            .map(|value| Cookie {
                name: query.name.clone(),
                value: value.clone(),
            }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieRecord {
    pub url: String,
    pub name: String,
    pub value: String,
    pub stored_at_epoch_ms: u128,
}

/// Cookie jar persisted in RocksDB, shared with whatever process captures
/// deferred links.
pub struct RocksDbCookieStore {
    db: Arc<DB>,
}

impl RocksDbCookieStore {
    pub fn open_default(path: &str) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path).with_context(|| format!("open cookie db at {path}"))?;
        Ok(Self { db: Arc::new(db) })
    }

    fn key_for_cookie(query: &CookieQuery) -> String {
        format!("cookie:{}:{}", query.url, query.name)
    }

    pub fn set_cookie(&self, query: &CookieQuery, value: &str) -> Result<()> {
        let record = CookieRecord {
            url: query.url.clone(),
            name: query.name.clone(),
            value: value.to_owned(),
            stored_at_epoch_ms: SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis(),
        };
        let key = Self::key_for_cookie(query);
        self.db.put(key.as_bytes(), serde_json::to_vec(&record)?)?;
        Ok(())
    }

    pub fn remove_cookie(&self, query: &CookieQuery) -> Result<()> {
        let key = Self::key_for_cookie(query);
        self.db.delete(key.as_bytes())?;
        Ok(())
    }

    pub fn load_record(&self, query: &CookieQuery) -> Result<Option<CookieRecord>> {
        let key = Self::key_for_cookie(query);
        match self.db.get(key.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice::<CookieRecord>(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CookieStore for RocksDbCookieStore {
    async fn get(&self, query: &CookieQuery) -> Result<Option<Cookie>> {
        Ok(self.load_record(query)?.map(|record| Cookie {
            name: record.name,
            value: record.value,
        }))
    }
}

/// Reads and decodes the `deferred_deeplink` cookie.
///
/// Store errors, a store that does not answer within `timeout`, and cookie
/// values that are not the expected JSON all yield `None`.
pub async fn read_deferred_deep_link(
    store: &dyn CookieStore,
    timeout: Duration,
) -> Option<DeferredDeepLink> {
    let query = CookieQuery::deferred_deep_link();

    let cookie = match tokio::time::timeout(timeout, store.get(&query)).await {
        Ok(Ok(Some(cookie))) => cookie,
        Ok(Ok(None)) => {
            debug!("no {} cookie present", query.name);
            return None;
        }
        Ok(Err(err)) => {
            warn!("failed to read {} cookie: {err:#}", query.name);
            return None;
        }
        Err(_) => {
            warn!("timed out after {timeout:?} reading {} cookie", query.name);
            return None;
        }
    };

    match serde_json::from_str::<DeferredDeepLink>(&cookie.value) {
        Ok(link) => Some(link),
        Err(err) => {
            warn!("malformed {} cookie: {err}", query.name);
            None
        }
    }
}
