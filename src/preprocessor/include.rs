//! Include resolution: the `IncludeHandler` interface (`spec.md` §6) and a
//! default filesystem-backed implementation.

use std::path::{Path, PathBuf};

/// Outcome of resolving one `#include` directive.
pub struct ResolvedInclude {
    pub canonical_name: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct IncludeNotFound {
    pub path: String,
}

impl std::fmt::Display for IncludeNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "include file not found: {}", self.path)
    }
}

impl std::error::Error for IncludeNotFound {}

/// Resolves `#include` directives to source text. Implementations decide how
/// `is_system` (angle-bracket vs. quoted form) affects the search order; the
/// preprocessor itself is agnostic to filesystem layout, per `spec.md` §6.
pub trait IncludeHandler {
    fn resolve(
        &mut self,
        path: &str,
        is_system: bool,
        search_paths: &[PathBuf],
    ) -> Result<ResolvedInclude, IncludeNotFound>;
}

/// Reads includes from disk: quoted includes are resolved relative to the
/// including file's directory first, then the search path list; angle
/// includes search only the search path list.
pub struct FsIncludeHandler {
    pub including_file_dir: Option<PathBuf>,
}

impl FsIncludeHandler {
    pub fn new(including_file_dir: Option<PathBuf>) -> Self {
        Self { including_file_dir }
    }

    fn try_read(path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

impl IncludeHandler for FsIncludeHandler {
    fn resolve(
        &mut self,
        path: &str,
        is_system: bool,
        search_paths: &[PathBuf],
    ) -> Result<ResolvedInclude, IncludeNotFound> {
        if !is_system {
            if let Some(dir) = &self.including_file_dir {
                let candidate = dir.join(path);
                if let Some(text) = Self::try_read(&candidate) {
                    return Ok(ResolvedInclude {
                        canonical_name: candidate.to_string_lossy().into_owned(),
                        source: text,
                    });
                }
            }
        }
        for dir in search_paths {
            let candidate = dir.join(path);
            if let Some(text) = Self::try_read(&candidate) {
                return Ok(ResolvedInclude {
                    canonical_name: candidate.to_string_lossy().into_owned(),
                    source: text,
                });
            }
        }
        Err(IncludeNotFound {
            path: path.to_string(),
        })
    }
}

/// Resolves includes purely from an in-memory map; used by tests and by
/// embedders that do not want filesystem access (`spec.md` §6's
/// "IncludeHandler: callback" makes this substitutable by design).
#[derive(Debug, Default)]
pub struct MemoryIncludeHandler {
    pub files: std::collections::HashMap<String, String>,
}

impl MemoryIncludeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }
}

impl IncludeHandler for MemoryIncludeHandler {
    fn resolve(
        &mut self,
        path: &str,
        _is_system: bool,
        _search_paths: &[PathBuf],
    ) -> Result<ResolvedInclude, IncludeNotFound> {
        self.files
            .get(path)
            .map(|source| ResolvedInclude {
                canonical_name: path.to_string(),
                source: source.clone(),
            })
            .ok_or_else(|| IncludeNotFound {
                path: path.to_string(),
            })
    }
}
