/// Default include handler - resolves relative to the includer, then search paths

use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::{IncludeHandler, IncludedSource, ShaderBlob};
use crate::error::{Error, Result};

/// Include handler backed by the file system
///
/// Lookup order: absolute paths as given; otherwise the including file's
/// directory, then each search path in order.
#[derive(Debug, Default)]
pub struct SearchPathIncludeHandler {
    search_paths: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
}

impl SearchPathIncludeHandler {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            loaded: Vec::new(),
        }
    }

    /// Every file this handler loaded, in load order
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    fn candidates(&self, requested: &str, includer: &Path) -> Vec<PathBuf> {
        let requested_path = Path::new(requested);
        if requested_path.is_absolute() {
            return vec![requested_path.to_path_buf()];
        }

        let mut candidates = Vec::with_capacity(self.search_paths.len() + 1);
        if let Some(dir) = includer.parent() {
            candidates.push(dir.join(requested_path));
        }
        candidates.extend(self.search_paths.iter().map(|dir| dir.join(requested_path)));
        candidates
    }
}

impl IncludeHandler for SearchPathIncludeHandler {
    fn load_source(&mut self, requested: &str, includer: &Path) -> Result<IncludedSource> {
        for candidate in self.candidates(requested, includer) {
            if !candidate.is_file() {
                continue;
            }
            let bytes = fs::read(&candidate).map_err(|e| {
                Error::SourceLoadFailed(format!("{}: {}", candidate.display(), e))
            })?;
            self.loaded.push(candidate.clone());
            return Ok(IncludedSource {
                path: candidate,
                blob: ShaderBlob::detect(bytes),
            });
        }

        Err(Error::SourceLoadFailed(format!(
            "cannot open include file '{}' (included from {})",
            requested,
            includer.display()
        )))
    }
}

#[cfg(test)]
#[path = "include_tests.rs"]
mod tests;
