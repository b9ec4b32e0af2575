//! Local registry of scaffolded apps and cached org credentials.
//!
//! One JSON document:
//!
//! ```json
//! {
//!   "apps": [{ "name": "my-app", "dir": "/home/me/my-app", "orgs": ["https://eu1.my.salesforce.com"] }],
//!   "creds-https://eu1.my.salesforce.com": { "access_token": "...", "refresh_token": "", "id": "...", "instance_url": "..." }
//! }
//! ```
//!
//! The whole document is read, changed in memory and rewritten atomically.

use crate::error::{McError, Result};
use crate::io;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CREDS_PREFIX: &str = "creds-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub name: String,
    pub dir: PathBuf,
    /// Instance URLs this app has been deployed to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orgs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCreds {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub id: String,
    pub instance_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub apps: Vec<AppEntry>,
    /// `creds-<instanceUrl>` records and any keys written by other tools.
    #[serde(flatten)]
    records: BTreeMap<String, serde_json::Value>,
}

impl Registry {
    /// A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        io::atomic_write(path, data.as_bytes())
    }

    /// Load, apply `f`, and write back only if `f` succeeds.
    pub fn update<T>(path: &Path, f: impl FnOnce(&mut Registry) -> Result<T>) -> Result<T> {
        let mut registry = Self::load(path)?;
        let out = f(&mut registry)?;
        registry.save(path)?;
        Ok(out)
    }

    // ---------------------------------------------------------------------------
    // Apps
    // ---------------------------------------------------------------------------

    /// Add an app, replacing any existing entry with the same name.
    pub fn add_app(&mut self, name: &str, dir: &Path) {
        let orgs = self
            .find_app(name)
            .map(|a| a.orgs.clone())
            .unwrap_or_default();
        self.apps.retain(|a| a.name != name);
        self.apps.push(AppEntry {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            orgs,
        });
    }

    pub fn find_app(&self, name: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|a| a.name == name)
    }

    pub fn app(&self, name: &str) -> Result<&AppEntry> {
        self.find_app(name)
            .ok_or_else(|| McError::AppNotFound(name.to_string()))
    }

    /// Note that the app in `dir` was deployed to `org`. Unregistered
    /// directories are ignored. Returns true if the registry changed.
    pub fn record_org(&mut self, dir: &Path, org: &str) -> bool {
        let Some(app) = self.apps.iter_mut().find(|a| a.dir == dir) else {
            return false;
        };
        if app.orgs.iter().any(|o| o == org) {
            return false;
        }
        app.orgs.push(org.to_string());
        true
    }

    // ---------------------------------------------------------------------------
    // Credentials
    // ---------------------------------------------------------------------------

    pub fn set_creds(&mut self, creds: &StoredCreds) -> Result<()> {
        let key = format!("{CREDS_PREFIX}{}", creds.instance_url);
        self.records.insert(key, serde_json::to_value(creds)?);
        Ok(())
    }

    pub fn creds(&self, instance_url: &str) -> Option<StoredCreds> {
        self.records
            .get(&format!("{CREDS_PREFIX}{instance_url}"))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn all_creds(&self) -> Vec<StoredCreds> {
        self.records
            .iter()
            .filter(|(k, _)| k.starts_with(CREDS_PREFIX))
            .filter_map(|(_, v)| serde_json::from_value(v.clone()).ok())
            .collect()
    }
}
