//! Offline cache in front of the data source.
//!
//! The data resource is network-first: a successful fetch refreshes the cached
//! copy and a failed one falls back to it. Every other resource is
//! cache-first and is fetched without being stored when it is not cached.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the current cache generation.
pub const CACHE_VERSION: &str = "pension-app-v1";

/// Source of resources behind the cache.
pub trait Fetch {
    fn fetch(&self, resource: &str) -> Result<String>;
}

/// Lookup order for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    NetworkFirst,
    CacheFirst,
}

/// A resource body and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub from_cache: bool,
}

/// Serialized cache contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheSnapshot {
    name: String,
    entries: BTreeMap<String, String>,
}

/// Versioned resource cache keyed by resource name.
#[derive(Debug)]
pub struct OfflineCache<F> {
    fetcher: F,
    data_resource: String,
    entries: BTreeMap<String, String>,
}

impl<F: Fetch> OfflineCache<F> {
    pub fn new(fetcher: F, data_resource: impl Into<String>) -> Self {
        Self {
            fetcher,
            data_resource: data_resource.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        CACHE_VERSION
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.entries.contains_key(resource)
    }

    /// Any resource naming the data resource is network-first.
    pub fn policy(&self, resource: &str) -> FetchPolicy {
        if resource.contains(&self.data_resource) {
            FetchPolicy::NetworkFirst
        } else {
            FetchPolicy::CacheFirst
        }
    }

    /// Fetch a resource according to its policy.
    pub fn get(&mut self, resource: &str) -> Result<Fetched> {
        match self.policy(resource) {
            FetchPolicy::NetworkFirst => match self.fetcher.fetch(resource) {
                Ok(body) => {
                    self.entries.insert(resource.to_string(), body.clone());
                    Ok(Fetched {
                        body,
                        from_cache: false,
                    })
                }
                Err(err) => {
                    let Some(body) = self.entries.get(resource) else {
                        return Err(Error::Fetch(format!("{resource}: {err}")));
                    };
                    warn!(%resource, error = %err, "fetch failed, serving cached copy");
                    Ok(Fetched {
                        body: body.clone(),
                        from_cache: true,
                    })
                }
            },
            FetchPolicy::CacheFirst => {
                if let Some(body) = self.entries.get(resource) {
                    return Ok(Fetched {
                        body: body.clone(),
                        from_cache: true,
                    });
                }
                let body = self.fetcher.fetch(resource)?;
                Ok(Fetched {
                    body,
                    from_cache: false,
                })
            }
        }
    }

    /// Install a set of static assets. Nothing is stored unless every fetch succeeds.
    pub fn precache(&mut self, assets: &[&str]) -> Result<()> {
        let mut fetched = Vec::with_capacity(assets.len());
        for asset in assets {
            fetched.push((asset.to_string(), self.fetcher.fetch(asset)?));
        }
        debug!(count = fetched.len(), "precached assets");
        self.entries.extend(fetched);
        Ok(())
    }

    pub fn insert(&mut self, resource: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(resource.into(), body.into());
    }

    /// Drop one cached entry. Returns whether it was present.
    pub fn invalidate(&mut self, resource: &str) -> bool {
        self.entries.remove(resource).is_some()
    }

    /// Cache names that do not belong to the current generation.
    pub fn stale_caches<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        names
            .iter()
            .copied()
            .filter(|name| *name != CACHE_VERSION)
            .collect()
    }

    /// Restore entries saved by [`save_snapshot`](Self::save_snapshot).
    ///
    /// A missing file is ignored. A snapshot from another cache generation is
    /// stale and is discarded.
    pub fn load_snapshot(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: CacheSnapshot = serde_json::from_str(&content)?;
        if self.stale_caches(&[snapshot.name.as_str()]).is_empty() {
            self.entries = snapshot.entries;
        } else {
            debug!(name = %snapshot.name, "discarding stale cache snapshot");
        }
        Ok(())
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let snapshot = CacheSnapshot {
            name: CACHE_VERSION.to_string(),
            entries: self.entries.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }
}

/// Reads resources from files under a root directory.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Fetch for FileFetcher {
    fn fetch(&self, resource: &str) -> Result<String> {
        let relative = resource.trim_start_matches('/');
        let path = if relative.is_empty() {
            self.root.join("index.html")
        } else {
            self.root.join(relative)
        };
        fs::read_to_string(&path).map_err(|e| Error::Fetch(format!("{}: {e}", path.display())))
    }
}
