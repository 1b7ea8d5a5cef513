// ABOUTME: Idempotent destroy-then-create of the runtime metrics workspace.
// ABOUTME: Handles absent paths, populated trees, regular files and symlinks.

use crate::error::{FilesystemError, FsOp};
use std::io;
use std::path::Path;

/// Leave `path` as an existing, empty directory.
///
/// Whatever occupies the path is removed first: a directory tree is deleted
/// recursively, a regular file or symlink is unlinked. Symlinks are never
/// followed, so a link pointing elsewhere only loses the link itself. Missing
/// parent directories are created.
///
/// # Errors
/// Returns a [`FilesystemError`] naming the failing operation if the path
/// cannot be inspected, removed or created.
pub fn reset_directory(path: &Path) -> Result<(), FilesystemError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => {
            let file_type = meta.file_type();
            if file_type.is_dir() {
                tracing::debug!(path = %path.display(), "Removing stale workspace tree");
                std::fs::remove_dir_all(path).map_err(fs_err(FsOp::Remove, path))?;
            } else {
                tracing::debug!(path = %path.display(), "Removing non-directory at workspace path");
                std::fs::remove_file(path).map_err(fs_err(FsOp::Remove, path))?;
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(fs_err(FsOp::Inspect, path)(e)),
    }

    std::fs::create_dir_all(path).map_err(fs_err(FsOp::Create, path))?;
    Ok(())
}

fn fs_err(op: FsOp, path: &Path) -> impl FnOnce(io::Error) -> FilesystemError + '_ {
    move |source| FilesystemError {
        op,
        path: path.to_path_buf(),
        source,
    }
}
