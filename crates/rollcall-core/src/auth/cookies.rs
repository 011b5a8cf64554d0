//! Cookie storage for the long-lived session credential.
//!
//! The server hands out its refresh session as an HTTP cookie. A browser
//! keeps that cookie across reloads; `CookieJar` does the same for a
//! command-line process by mirroring every change into `session.json`.
//! Matching (domain, path, secure, expiry) is left to `cookie_store`, and
//! cookie values are never inspected.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Context, Result};
use cookie_store::CookieStore as Store;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use reqwest_cookie_store::CookieStoreRwLock;
use tracing::{debug, warn};

/// Session file name in the per-server cache directory
const SESSION_FILE: &str = "session.json";

fn read_store(path: &Path) -> Result<Store> {
    let file = File::open(path).context("Failed to read session file")?;
    cookie_store::serde::json::load(BufReader::new(file))
        .map_err(|e| anyhow!(e))
        .context("Failed to parse session file")
}

pub struct CookieJar {
    path: Option<PathBuf>,
    store: CookieStoreRwLock,
}

impl CookieJar {
    /// A jar that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: CookieStoreRwLock::new(Store::default()),
        }
    }

    /// Load the jar persisted in `dir`, starting empty if there is none yet.
    /// Cookies that expired while the jar was on disk are dropped.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSION_FILE);
        let store = if path.exists() {
            read_store(&path)?
        } else {
            Store::default()
        };

        Ok(Self {
            path: Some(path),
            store: CookieStoreRwLock::new(store),
        })
    }

    /// Like `load`, but an unreadable session file counts as no session.
    /// The file is overwritten the next time the server sets a cookie.
    pub fn load_or_empty(dir: &Path) -> Self {
        match Self::load(dir) {
            Ok(jar) => jar,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                Self {
                    path: Some(dir.join(SESSION_FILE)),
                    store: CookieStoreRwLock::new(Store::default()),
                }
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when no unexpired cookie is held for any server.
    pub fn is_empty(&self) -> bool {
        self.read().iter_unexpired().next().is_none()
    }

    /// Path of the backing file, if this jar is persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save session cookies to disk
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).context("Failed to write session file")?;
        let mut writer = BufWriter::new(file);
        // Cookies without Max-Age/Expires are kept too: one CLI invocation
        // is one page load of the same browsing session.
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.read(), &mut writer)
            .map_err(|e| anyhow!(e))
            .context("Failed to write session file")?;
        writer.flush().context("Failed to write session file")?;
        Ok(())
    }

    /// Drop every cookie and remove the session file
    pub fn clear(&self) -> Result<()> {
        *self.write() = Store::default();
        if let Some(ref path) = self.path {
            if path.exists() {
                std::fs::remove_file(path).context("Failed to remove session file")?;
            }
        }
        Ok(())
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.store.set_cookies(cookie_headers, url);
        debug!(host = url.host_str().unwrap_or_default(), path = url.path(), "Session cookies updated");

        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to persist session cookies");
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.store.cookies(url)
    }
}
