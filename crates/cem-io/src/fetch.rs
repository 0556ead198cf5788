//! Input locations: local files or `http(s)` URLs downloaded into a cache.

use std::fmt;
use std::fs::{self, File};
use std::io::copy;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "CEM_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, DataSource::Url(_))
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("empty data source");
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// Hex SHA-256 of a URL, used as the cache file stem.
pub fn url_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Download cache for remote sources.
#[derive(Debug, Clone)]
pub struct SourceCache {
    dir: PathBuf,
}

impl SourceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$CEM_CACHE_DIR`, else the platform cache directory plus `cem`.
    pub fn default_location() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
            return Ok(Self::new(dir));
        }
        let base = dirs::cache_dir().ok_or_else(|| anyhow!("no cache directory on this platform"))?;
        Ok(Self::new(base.join("cem")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a URL is (or will be) stored. The file extension of the URL
    /// path is kept so readers can sniff formats.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.len() <= 8);
        let key = url_key(url);
        match ext {
            Some(ext) => self.dir.join(format!("{}.{}", key, ext)),
            None => self.dir.join(key),
        }
    }

    /// Local path for a source, downloading URLs on first use.
    pub fn resolve(&self, source: &DataSource) -> Result<PathBuf> {
        match source {
            DataSource::Path(path) => {
                if !path.exists() {
                    bail!("input file {} does not exist", path.display());
                }
                Ok(path.clone())
            }
            DataSource::Url(url) => {
                let dest = self.cache_path(url);
                if dest.exists() {
                    debug!(url = %url, path = %dest.display(), "using cached download");
                    return Ok(dest);
                }
                fs::create_dir_all(&self.dir)
                    .with_context(|| format!("creating cache directory {}", self.dir.display()))?;
                let partial = dest.with_extension("part");
                download_to_path(url, &partial)?;
                fs::rename(&partial, &dest)
                    .with_context(|| format!("moving download into {}", dest.display()))?;
                info!(url = %url, path = %dest.display(), "downloaded");
                Ok(dest)
            }
        }
    }
}

/// Perform a simple HTTP GET and stream the response into `dest`.
fn download_to_path(url: &str, dest: &Path) -> Result<()> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("requesting {}", url))?;
    if response.status() >= 400 {
        bail!("failed to download {}: HTTP {}", url, response.status());
    }
    let mut reader = response.into_reader();
    let mut file = File::create(dest)
        .with_context(|| format!("creating download target {}", dest.display()))?;
    copy(&mut reader, &mut file).with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_urls_and_paths() {
        let url: DataSource = "https://example.org/costs_2030.csv".parse().unwrap();
        assert!(url.is_remote());
        let path: DataSource = "test_data/costs_2030.csv".parse().unwrap();
        assert_eq!(path, DataSource::Path(PathBuf::from("test_data/costs_2030.csv")));
        assert!("  ".parse::<DataSource>().is_err());
    }

    #[test]
    fn cache_path_is_stable_and_keeps_extension() {
        let cache = SourceCache::new("/tmp/cem-cache");
        let a = cache.cache_path("https://example.org/data/costs_2030.csv?raw=1");
        let b = cache.cache_path("https://example.org/data/costs_2030.csv?raw=1");
        assert_eq!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("csv"));
        let c = cache.cache_path("https://tubcloud.example/s/abc/download");
        assert!(c.extension().is_none());
        assert_eq!(url_key("x").len(), 64);
    }

    #[test]
    fn cached_url_is_not_downloaded_again() {
        let dir = tempdir().unwrap();
        let cache = SourceCache::new(dir.path());
        let url = "https://example.invalid/ts.csv";
        fs::write(cache.cache_path(url), "time,load\n").unwrap();
        let resolved = cache.resolve(&DataSource::Url(url.into())).unwrap();
        assert_eq!(resolved, cache.cache_path(url));
    }

    #[test]
    fn missing_local_file_is_an_error() {
        let cache = SourceCache::new("/nonexistent");
        let err = cache
            .resolve(&DataSource::Path(PathBuf::from("/nonexistent/costs.csv")))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
