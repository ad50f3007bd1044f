use std::path::{Component, Path};

use crate::TransferError;

/// Derives the file name sent to the server from a local path.
///
/// Only the final component is used. Rejects:
/// - Empty paths
/// - Paths ending in `..` or a root/prefix (no file name)
/// - Names that are not valid UTF-8
pub fn upload_file_name(path: &Path) -> Result<String, TransferError> {
    if path.as_os_str().is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    match path.components().next_back() {
        Some(Component::Normal(name)) => name.to_str().map(str::to_owned).ok_or_else(|| {
            TransferError::InvalidPath(format!(
                "file name is not valid UTF-8: {}",
                path.display()
            ))
        }),
        _ => Err(TransferError::InvalidPath(format!(
            "no file name in path: {}",
            path.display()
        ))),
    }
}
