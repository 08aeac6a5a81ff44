pub mod file;

use async_trait::async_trait;

use crate::app::Result;

pub use file::FileCache;

/// Identifiers seen during the last cycle of one source.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the cached identifiers, creating an empty cache when none exists.
    async fn read(&self) -> Result<Vec<String>>;

    /// Replace the cached identifiers.
    async fn write(&self, ids: &[String]) -> Result<()>;
}
