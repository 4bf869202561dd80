//! Durable session cache.
//!
//! Persists exactly one session's cookies plus the account DNI to a fixed
//! file under the per-user cache directory, so repeated invocations skip
//! the interactive login. The file is overwritten wholesale on each fresh
//! login and read wholesale on each hit; there is no expiry tracking and
//! no locking. A stale session simply fails at the next API call.

use std::io::ErrorKind;
use std::path::PathBuf;

use cookie_store::Cookie;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum CacheError {
    /// No cache file yet. The only error callers branch on: it means
    /// "fall back to interactive login".
    #[error("no cached session")]
    NotFound,

    #[error("failed to access session cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed session cache: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The one record the cache holds.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedSession {
    pub cookies: Vec<Cookie<'static>>,
    pub dni: String,
}

pub struct SessionCache {
    cache_dir: PathBuf,
}

impl SessionCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Replace whatever was cached with `session`, creating the cache
    /// directory if needed.
    pub fn store(&self, session: &CachedSession) -> Result<(), CacheError> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, contents)?;
        debug!(path = %path.display(), "Session cached");
        Ok(())
    }

    /// Load the cached session. `CacheError::NotFound` when no file exists;
    /// a corrupt file is not special-cased and surfaces as `Corrupt`.
    pub fn load(&self) -> Result<CachedSession, CacheError> {
        let path = self.session_path();
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CacheError::NotFound
            } else {
                CacheError::Io(e)
            }
        })?;
        let session: CachedSession = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Session restored from cache");
        Ok(session)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cookie_store::{CookieStore, RawCookie};
    use reqwest::Url;

    fn cookie_fixture() -> Vec<Cookie<'static>> {
        let mut store = CookieStore::default();
        let url = Url::parse("https://domain.com/cookies").unwrap();
        let raw = RawCookie::parse("foo=bar; Domain=domain.com; Path=/cookies").unwrap();
        store.insert_raw(&raw, &url).unwrap();
        store.iter_unexpired().cloned().collect()
    }

    #[test]
    fn test_store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());

        let session = CachedSession {
            cookies: cookie_fixture(),
            dni: "123456789".to_string(),
        };
        cache.store(&session).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.dni, "123456789");
        assert_eq!(loaded.cookies.len(), 1);
        assert_eq!(loaded.cookies[0].name(), "foo");
        assert_eq!(loaded.cookies[0].value(), "bar");
    }

    #[test]
    fn test_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("nested").join("deeper"));
        let session = CachedSession {
            cookies: Vec::new(),
            dni: "123456789".to_string(),
        };
        cache.store(&session).unwrap();
        assert_eq!(cache.load().unwrap().dni, "123456789");
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());
        assert!(matches!(cache.load(), Err(CacheError::NotFound)));
    }

    #[test]
    fn test_load_corrupt_file_is_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());
        assert!(matches!(cache.load(), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_store_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());

        for dni in ["111111111", "222222222"] {
            cache
                .store(&CachedSession {
                    cookies: Vec::new(),
                    dni: dni.to_string(),
                })
                .unwrap();
        }
        assert_eq!(cache.load().unwrap().dni, "222222222");
    }
}
