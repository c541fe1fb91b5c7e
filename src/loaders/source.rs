use futures::future::BoxFuture;
use futures::FutureExt;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AssetLoadError;

/// Where named assets come from. Names are relative, `/`-separated paths.
pub trait AssetSource: Send + Sync {
    /// Fetches the raw bytes of `name`. Called exactly once per load.
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetLoadError>>;
}

/// Reads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }
}

impl AssetSource for FileSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetLoadError>> {
        async move {
            let path = self.resolve(name);
            log::debug!("Reading {:?}", path);
            std::fs::read(&path).map_err(|source| AssetLoadError::Fetch {
                name: name.to_string(),
                source,
            })
        }
        .boxed()
    }
}

/// In-memory assets, counting how often each name is fetched
#[derive(Debug, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(name.to_string(), bytes.into());
        self
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .map(|fetches| fetches.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl AssetSource for MemorySource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetLoadError>> {
        async move {
            if let Ok(mut fetches) = self.fetches.lock() {
                *fetches.entry(name.to_string()).or_insert(0) += 1;
            }
            self.assets.get(name).cloned().ok_or_else(|| AssetLoadError::Fetch {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such asset"),
            })
        }
        .boxed()
    }
}

/// Resolves `reference` relative to the directory holding `name`,
/// decoding `%XX` escapes the way URIs in glTF files use them.
pub fn sibling(name: &str, reference: &str) -> String {
    let reference = percent_decode_str(reference).decode_utf8_lossy().into_owned();
    match name.rfind('/') {
        Some(slash) => format!("{}/{}", &name[..slash], reference),
        None => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_counts_fetches() {
        let source = MemorySource::new().with_asset("a.bin", vec![1, 2, 3]);
        assert_eq!(pollster::block_on(source.fetch("a.bin")).unwrap(), vec![1, 2, 3]);
        assert!(pollster::block_on(source.fetch("missing.bin")).is_err());
        assert_eq!(source.fetch_count("a.bin"), 1);
        assert_eq!(source.fetch_count("missing.bin"), 1);
    }

    #[test]
    fn test_file_source_reads_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("background.png"), b"png").unwrap();
        let source = FileSource::new(dir.path());
        assert_eq!(pollster::block_on(source.fetch("/background.png")).unwrap(), b"png");
        let err = pollster::block_on(source.fetch("nope.png")).unwrap_err();
        assert!(matches!(err, AssetLoadError::Fetch { .. }));
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(sibling("scene.gltf", "scene.bin"), "scene.bin");
        assert_eq!(sibling("models/tree/scene.gltf", "scene.bin"), "models/tree/scene.bin");
        assert_eq!(sibling("cake.gltf", "Cake%20Birthday.bin"), "Cake Birthday.bin");
        assert_eq!(sibling("a.gltf", "100%"), "100%");
        assert_eq!(sibling("a.gltf", "bad%FF.bin"), "bad\u{FFFD}.bin");
    }
}
