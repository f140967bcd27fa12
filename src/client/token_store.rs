use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

/// Key the session token is stored under.
pub const TOKEN_KEY: &str = "authToken";

/// Client-side storage for the session token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> anyhow::Result<Option<String>>;
    fn set(&self, token: &str) -> anyhow::Result<()>;
    fn remove(&self) -> anyhow::Result<()>;
}

/// Persists entries as a flat JSON object, e.g. `{"authToken": "..."}`.
/// Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("parse token file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("read token file {}", self.path.display())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create token directory {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write token file {}", self.path.display()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.remove(TOKEN_KEY))
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    fn remove(&self) -> anyhow::Result<()> {
        // An unreadable file holds nothing worth keeping.
        let mut entries = self.load().unwrap_or_default();
        entries.remove(TOKEN_KEY);
        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).with_context(|| format!("remove token file {}", self.path.display())),
            }
        } else {
            self.save(&entries)
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        let guard = self.token.lock().map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        let mut guard = self.token.lock().map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        let mut guard = self.token.lock().map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *guard = None;
        Ok(())
    }
}
