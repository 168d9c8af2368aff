//! Turning bare level file names into paths on disk

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File list shipped with game installations, one CSV row per file
pub const FILENAME_CACHE_FILE: &str = "FILENAMECACHE.txt";

/// Looks up files by name or relative path
pub trait FileResolver: Send + Sync {
    /// Return an existing path for `name`, if one can be found
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Resolves file names anywhere below a root directory
#[derive(Debug, Clone, Default)]
pub struct FilesystemResolver {
    root: PathBuf,
    cache: HashMap<String, PathBuf>,
}

impl FilesystemResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn valid_root(&self) -> bool {
        self.root.is_dir()
    }

    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Rebuild the file name cache by walking the whole root directory.
    ///
    /// Directories that cannot be read are skipped. Returns the number of files found.
    pub fn update_cache(&mut self) -> usize {
        self.cache.clear();
        if !self.valid_root() {
            tracing::warn!("Search root {:?} is not a directory", self.root);
            return 0;
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {:?}: {}", dir, e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Some(name) = path.file_name() {
                    self.cache
                        .insert(name.to_string_lossy().into_owned(), path);
                }
            }
        }

        tracing::debug!(
            "Cached {} file names below {:?}",
            self.cache.len(),
            self.root
        );
        self.cache.len()
    }

    /// Seed the cache from the root's `FILENAMECACHE.txt`.
    ///
    /// Returns false when the file is missing or unreadable.
    pub fn import_filename_cache(&mut self) -> bool {
        let cache_file = self.root.join(FILENAME_CACHE_FILE);
        let content = match std::fs::read_to_string(&cache_file) {
            Ok(content) => content,
            Err(_) => return false,
        };

        for line in content.lines() {
            let Some(relative) = crate::source::split_csv_row(line).into_iter().next() else {
                continue;
            };
            if relative.is_empty() {
                continue;
            }
            let relative = PathBuf::from(relative);
            if let Some(name) = relative.file_name() {
                self.cache.insert(
                    name.to_string_lossy().into_owned(),
                    self.root.join(&relative),
                );
            }
        }
        true
    }
}

impl FileResolver for FilesystemResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.has_root() && path.exists() {
            return Some(path.to_path_buf());
        }

        if !self.valid_root() {
            return None;
        }

        let under_root = self.root.join(path);
        if under_root.is_file() {
            return Some(under_root);
        }

        let file_name = path.file_name()?.to_string_lossy();
        self.cache.get(file_name.as_ref()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("gmap_resolver_{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(dir.join("levels/town")).unwrap();
        std::fs::write(dir.join("levels/town/shop.nw"), "GLEVNW01\n").unwrap();
        std::fs::write(dir.join("top.nw"), "GLEVNW01\n").unwrap();
        dir
    }

    #[test]
    fn test_resolves_through_cache() {
        let root = temp_root();
        let mut resolver = FilesystemResolver::new(&root);
        assert!(resolver.resolve("shop.nw").is_none());

        assert_eq!(resolver.update_cache(), 2);
        assert_eq!(
            resolver.resolve("shop.nw"),
            Some(root.join("levels/town/shop.nw"))
        );
        assert!(resolver.resolve("missing.nw").is_none());

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_resolves_relative_and_absolute_paths() {
        let root = temp_root();
        let resolver = FilesystemResolver::new(&root);
        assert_eq!(resolver.resolve("top.nw"), Some(root.join("top.nw")));
        assert_eq!(
            resolver.resolve("levels/town/shop.nw"),
            Some(root.join("levels/town/shop.nw"))
        );

        let absolute = root.join("top.nw");
        let elsewhere = FilesystemResolver::new("/definitely/not/here");
        assert_eq!(
            elsewhere.resolve(&absolute.to_string_lossy()),
            Some(absolute)
        );
        assert!(elsewhere.resolve("top.nw").is_none());

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_import_filename_cache() {
        let root = temp_root();
        std::fs::write(
            root.join(FILENAME_CACHE_FILE),
            "levels/town/shop.nw,1024,1700000000\n\"levels/cave 1.nw\",10,0\n",
        )
        .unwrap();

        let mut resolver = FilesystemResolver::new(&root);
        assert!(resolver.import_filename_cache());
        assert_eq!(resolver.cached_files(), 2);
        assert_eq!(
            resolver.resolve("cave 1.nw"),
            Some(root.join("levels/cave 1.nw"))
        );

        let mut empty = FilesystemResolver::new(root.join("levels"));
        assert!(!empty.import_filename_cache());

        std::fs::remove_dir_all(root).unwrap();
    }
}
