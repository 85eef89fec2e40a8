//! On-disk cache of generated page content
//!
//! One HTML snippet per page path, stored as `<name>_content.html` in a flat
//! directory. Writes go through a temp file and a rename so a concurrent
//! reader sees either the old snippet or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tracing::{debug, info};

use crate::menu::build_menu;
use crate::paths::{cache_file_name, path_from_cache_file_name};
use crate::types::MenuItem;
use crate::Result;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Flat directory of cached content snippets
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    /// Open the cache at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !fs::try_exists(&root).await? {
            fs::create_dir_all(&root).await?;
            info!("Created content cache directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the snippet for `page_path`
    pub fn entry_path(&self, page_path: &str) -> PathBuf {
        self.root.join(cache_file_name(page_path))
    }

    /// Cached snippet for `page_path`, or `None` when missing or empty
    pub async fn get(&self, page_path: &str) -> Result<Option<String>> {
        let path = self.entry_path(page_path);
        match fs::read_to_string(&path).await {
            Ok(content) if content.is_empty() => {
                debug!("Cached content for '{}' is empty", page_path);
                Ok(None)
            }
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the snippet for `page_path` and return the file it landed in
    pub async fn put(&self, page_path: &str, html: &str) -> Result<PathBuf> {
        let path = self.entry_path(page_path);
        let tmp_path = self.root.join(format!(
            ".{}.{}.{}.tmp",
            cache_file_name(page_path),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp_path, html).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("Cached content for '{}' ({} bytes)", page_path, html.len());
        Ok(path)
    }

    /// Page paths that currently have a cached snippet, in directory order
    pub async fn cached_paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if let Some(path) = file_name.to_str().and_then(path_from_cache_file_name) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Menu for `current_path` built from the cache as it is right now
    pub async fn menu(&self, current_path: &str) -> Result<Vec<MenuItem>> {
        Ok(build_menu(current_path, self.cached_paths().await?))
    }
}
