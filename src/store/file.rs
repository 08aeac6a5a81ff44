use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncReadExt;

use crate::app::{Result, ScraperError};
use crate::store::CacheStore;

/// Newline-separated identifiers in `<cache_dir>/<source_name>`.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    path: PathBuf,
}

impl FileCache {
    pub fn new(cache_dir: impl AsRef<Path>, source_name: &str) -> Self {
        let dir = cache_dir.as_ref().to_path_buf();
        let path = dir.join(source_name);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache_error(&self, source: std::io::Error) -> ScraperError {
        ScraperError::Cache {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn parse(content: &str) -> Vec<String> {
        content
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn read(&self) -> Result<Vec<String>> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.cache_error(e))?;

        // append mode creates the file without truncating an existing one
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| self.cache_error(e))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .await
            .map_err(|e| self.cache_error(e))?;

        Ok(Self::parse(&content))
    }

    async fn write(&self, ids: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.cache_error(e))?;
        fs::write(&self.path, ids.join("\n"))
            .await
            .map_err(|e| self.cache_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_read_creates_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"), "events");

        assert!(cache.read().await.unwrap().is_empty());
        assert!(cache.path().exists());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), "events");

        cache.write(&ids(&["x", "y", "z"])).await.unwrap();
        assert_eq!(cache.read().await.unwrap(), ids(&["x", "y", "z"]));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), "jobs");

        cache.write(&ids(&["a", "b", "c", "d"])).await.unwrap();
        cache.write(&ids(&["e"])).await.unwrap();

        assert_eq!(cache.read().await.unwrap(), ids(&["e"]));
        assert_eq!(std::fs::read_to_string(cache.path()).unwrap(), "e");
    }

    #[tokio::test]
    async fn test_blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), "partners");
        std::fs::write(cache.path(), "\nA1\n\n  \nTelekom\n").unwrap();

        assert_eq!(cache.read().await.unwrap(), ids(&["A1", "Telekom"]));
    }

    #[tokio::test]
    async fn test_sources_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let events = FileCache::new(dir.path(), "events");
        let jobs = FileCache::new(dir.path(), "jobs");

        events.write(&ids(&["1"])).await.unwrap();
        assert!(jobs.read().await.unwrap().is_empty());
    }
}
