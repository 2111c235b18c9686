//! File system utilities for the working tree.
//!
//! Directory operations here are idempotent: creating an existing directory
//! or removing a missing one succeeds.

use crate::watcher::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing directory".into(),
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        crate::bail!("{:?} does not exist", from);
    }
    if !from.is_file() {
        crate::bail!("{:?} is not a file", from);
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir, false).await?;
    }
    fs::copy(from, to).await.fs_context("copying file to", to)?;
    Ok(())
}

/// Writes `contents` to `path`, creating parent directories first.
pub async fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent, false).await?;
    }
    fs::write(path, contents)
        .await
        .fs_context("writing", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        remove_dir_all(&missing).await.unwrap();
        remove_dir_all(&missing).await.unwrap();
    }

    #[tokio::test]
    async fn create_with_erase_clears_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("work");
        write_text(&target.join("stale.txt"), "old").await.unwrap();

        create_dir_all(&target, true).await.unwrap();

        assert!(target.is_dir());
        assert!(!target.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn copy_file_creates_parents_and_rejects_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        tokio::fs::write(&src, b"payload").await.unwrap();

        let dest = dir.path().join("x/y/b.bin");
        copy_file(&src, &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"payload");

        assert!(copy_file(dir.path(), &dest).await.is_err());
        assert!(copy_file(&dir.path().join("missing"), &dest).await.is_err());
    }
}
