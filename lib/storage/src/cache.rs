// On-disk JSON memoization keyed by function name and positional arguments
use std::fmt::Display;
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atomicwrites::{AllowOverwrite, AtomicFile};
use chessgraph_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_DIR: &str = "data_cache";

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// When false every lookup computes the value and nothing touches disk.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
            enabled: true,
        }
    }
}

/// Identifies one memoized call: `{function}/{arg1}_{arg2}.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    function: String,
    args: Vec<String>,
}

impl CacheKey {
    pub fn new(function: &str, args: &[&dyn Display]) -> Self {
        Self {
            function: sanitize(function),
            args: args.iter().map(|arg| sanitize(&arg.to_string())).collect(),
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.function).join(format!("{}.json", self.args.join("_")))
    }
}

// Keep keys inside the cache directory.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect::<String>()
        .replace("..", "-")
}

/// `null`, empty objects, arrays and strings are returned but never stored.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub struct JsonCache {
    config: CacheConfig,
}

impl JsonCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        if config.enabled {
            fs::create_dir_all(&config.dir)?;
        }
        Ok(Self { config })
    }

    /// A cache that never reads or writes files.
    pub fn disabled() -> Self {
        Self {
            config: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.config.dir.join(key.relative_path())
    }

    /// Return the cached value for `key`, or run `compute` and persist its
    /// result. Unreadable entries are recomputed and overwritten; errors from
    /// `compute` are returned and never cached.
    pub async fn get_or_insert_with<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.config.enabled {
            return compute().await;
        }

        let path = self.entry_path(key);
        if path.exists() {
            match load_json::<T>(&path) {
                Ok(value) => {
                    debug!(path = %path.display(), "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt cache entry, recomputing");
                }
            }
        }

        let value = compute().await?;
        let json = serde_json::to_value(&value)?;
        if is_empty_value(&json) {
            debug!(path = %path.display(), "empty result, not cached");
            return Ok(value);
        }

        save_json(&json, &path).map_err(|e| Error::Cache(format!("{:#}", e)))?;
        debug!(path = %path.display(), "cache stored");
        Ok(value)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.config.enabled && self.entry_path(key).exists()
    }

    /// Remove every cached entry. Returns the number of files deleted.
    pub fn clear(&self) -> Result<usize> {
        if !self.config.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.config.dir)? {
            let path = entry?.path();
            if path.is_dir() {
                removed += fs::read_dir(&path)?
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
                    .count();
                fs::remove_dir_all(&path)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn save_json(value: &Value, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let data = serde_json::to_vec(value)?;
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(&data))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
