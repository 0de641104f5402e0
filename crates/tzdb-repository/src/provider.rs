//! Sources of raw rule resources
//!
//! The store asks a [`ResourceProvider`] for the bytes behind a relative
//! resource path such as `tzdb/Europe/Paris.dat`. Two implementations ship
//! with the crate:
//!
//! - [`FileSystemProvider`]: reads resources below a root directory
//! - [`MemoryProvider`]: serves an in-memory bundle, for embedded data and
//!   tests

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use path_absolutize::Absolutize;
use tokio::fs;

use crate::error::FetchError;

/// Fetches raw resource bytes by relative path
///
/// Implementations must be `Send + Sync`; the store calls `fetch`
/// concurrently from many tasks.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Read the resource at `path`.
    ///
    /// # Errors
    ///
    /// [`FetchError::NotFound`] when nothing exists at the path, which the
    /// store reports as a missing resource. Any other failure is reported
    /// as unreadable.
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<P> ResourceProvider for Arc<P>
where
    P: ResourceProvider + ?Sized,
{
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(path).await
    }
}

// ============================================================================
// File system
// ============================================================================

/// Reads resources from a directory tree
///
/// # Example
/// ```no_run
/// use tzdb_repository::FileSystemProvider;
///
/// // Resolves `tzdb/Europe/Paris.dat` to `data/tzdb/Europe/Paris.dat`
/// let provider = FileSystemProvider::new("data").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    root_path: PathBuf,
}

impl FileSystemProvider {
    /// Create a provider rooted at an existing directory
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self, FetchError> {
        let path = root_path.as_ref();

        if !path.is_dir() {
            return Err(FetchError::InvalidPath {
                path: path.display().to_string(),
            });
        }

        let abs_path = path
            .absolutize()
            .map_err(|source| FetchError::Io {
                path: path.display().to_string(),
                source,
            })?
            .to_path_buf();

        Ok(Self {
            root_path: abs_path,
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Join a resource path onto the root, refusing anything that could
    /// leave it
    fn resolve_path(&self, resource: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(resource);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if resource.is_empty() || !plain {
            return Err(FetchError::InvalidPath {
                path: resource.to_string(),
            });
        }
        Ok(self.root_path.join(relative))
    }
}

#[async_trait]
impl ResourceProvider for FileSystemProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        let full_path = self.resolve_path(path)?;

        match fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                path: path.to_string(),
            }),
            Err(source) => Err(FetchError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Serves resources from an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    resources: HashMap<String, Bytes>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, builder style
    pub fn with_resource(mut self, path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    /// Add or replace a resource
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.resources.insert(path.into(), data.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resources.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceProvider for MemoryProvider {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}
