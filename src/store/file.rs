use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{Store, StoreResult, Table};

/// Directory-backed store holding one `<table>.json` file per table.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// table on disk is always either the old or the new version.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.json", table.key()))
    }

    fn temp_path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", table.key()))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn read(&self, table: Table) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path(table)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, table: Table, blob: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let temp = self.temp_path(table);
        tokio::fs::write(&temp, blob).await?;
        tokio::fs::rename(&temp, self.path(table)).await?;
        debug!(%table, bytes = blob.len(), "Table file replaced");
        Ok(())
    }

    async fn remove(&self, table: Table) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path(table)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
