use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Project-relative file identity, canonicalised once at ingestion
///
/// Always `/`-separated, never empty, never escapes the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Canonicalise `raw` (relative to `root`, or absolute beneath it)
    ///
    /// Purely lexical: the file does not have to exist.
    pub fn new(root: &Path, raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace('\\', "/");
        if normalized.is_empty() {
            return Err(EngineError::invalid_path("empty path"));
        }

        let candidate = Path::new(&normalized);
        let relative: PathBuf = if candidate.is_absolute() {
            let root = lexical_normalize(root)
                .ok_or_else(|| EngineError::invalid_path(format!("bad project root {}", root.display())))?;
            let absolute = lexical_normalize(candidate)
                .ok_or_else(|| EngineError::invalid_path(format!("{raw} escapes the filesystem root")))?;
            absolute
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .map_err(|_| EngineError::invalid_path(format!("{raw} is outside {}", root.display())))?
        } else {
            lexical_normalize(candidate)
                .ok_or_else(|| EngineError::invalid_path(format!("{raw} escapes the project root")))?
        };

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return Err(EngineError::invalid_path(format!("{raw} does not name a file")));
        }
        Ok(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location on disk under `root`
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Resolve `.` and `..` without touching the filesystem; `None` if `..` climbs past the start
fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    Some(out)
}
