use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::DecodeError;

/// Opaque locator for an animation resource, supplied by the host to `play`.
///
/// Handles are immutable; cloning shares the underlying bytes.
#[derive(Clone, Debug)]
pub enum ResourceHandle {
    /// In-memory document. Relative asset paths resolve against `base_dir` when set.
    Bytes {
        /// Encoded sprite document.
        bytes: Arc<[u8]>,
        /// Directory used to resolve file-backed assets.
        base_dir: Option<PathBuf>,
    },
    /// Document on disk. Relative asset paths resolve against the file's directory.
    Path(PathBuf),
}

impl ResourceHandle {
    /// Wrap in-memory bytes with no asset directory.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            bytes: bytes.into(),
            base_dir: None,
        }
    }

    /// Wrap in-memory bytes whose file-backed assets live under `base_dir`.
    pub fn from_bytes_in(bytes: impl Into<Arc<[u8]>>, base_dir: impl Into<PathBuf>) -> Self {
        Self::Bytes {
            bytes: bytes.into(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Reference a document on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Short human-readable description used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes { bytes, .. } => format!("<{} bytes>", bytes.len()),
            Self::Path(p) => p.display().to_string(),
        }
    }

    /// Load the document bytes and the directory that relative assets resolve against.
    pub(crate) fn load(&self) -> Result<(Arc<[u8]>, Option<PathBuf>), DecodeError> {
        let (bytes, base) = match self {
            Self::Bytes { bytes, base_dir } => (bytes.clone(), base_dir.clone()),
            Self::Path(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    DecodeError::Io(format!("read resource '{}': {e}", path.display()))
                })?;
                let base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (Arc::from(bytes), Some(base))
            }
        };
        if bytes.is_empty() {
            return Err(DecodeError::EmptySource);
        }
        Ok((bytes, base))
    }
}

/// Resolve an asset path relative to the resource directory into `/`-separated segments.
///
/// Empty and `.` segments are dropped. Absolute paths and `..` are rejected so assets cannot
/// escape the resource directory.
pub(crate) fn normalize_rel_path(source: &str) -> Result<String, DecodeError> {
    let unified = source.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(DecodeError::malformed(format!(
            "asset path '{source}' must be relative"
        )));
    }

    let segments = unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .map(|seg| match seg {
            ".." => Err(DecodeError::malformed(format!(
                "asset path '{source}' leaves the resource directory"
            ))),
            _ => Ok(seg),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if segments.is_empty() {
        return Err(DecodeError::malformed(format!(
            "asset path '{source}' names no file"
        )));
    }
    Ok(segments.join("/"))
}
