//! File handling for the command-line front end.
//!
//! The library itself only sees async byte streams. This module turns paths
//! into those streams, derives default output names, supplies size hints for
//! progress, and removes partial output after a failed or cancelled run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use tokio::fs;

use crate::config::{DECRYPTED_EXTENSION, FILE_EXTENSION};
use crate::types::Processing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default output location for `processing`.
    ///
    /// Encryption appends [`FILE_EXTENSION`]. Decryption strips it, or appends
    /// [`DECRYPTED_EXTENSION`] when the input does not carry it.
    pub fn output_path(&self, processing: Processing) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();

        match processing {
            Processing::Encryption => {
                name.push(FILE_EXTENSION);
                PathBuf::from(name)
            }
            Processing::Decryption => match self.path.to_string_lossy().strip_suffix(FILE_EXTENSION) {
                Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
                _ => {
                    name.push(DECRYPTED_EXTENSION);
                    PathBuf::from(name)
                }
            },
        }
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.path.to_string_lossy().ends_with(FILE_EXTENSION)
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Length on disk, used as the progress size hint.
    pub async fn size(&self) -> Result<u64> {
        let meta = fs::metadata(&self.path).await.with_context(|| format!("failed to get metadata: {}", self.path.display()))?;
        Ok(meta.len())
    }

    /// Checks that this path is usable as input.
    pub async fn validate_input(&self) -> Result<()> {
        let meta = fs::metadata(&self.path).await.with_context(|| format!("file not found: {}", self.path.display()))?;
        ensure!(meta.is_file(), "not a regular file: {}", self.path.display());
        Ok(())
    }

    /// Checks that writing here would not clobber an existing file.
    pub fn validate_output(&self) -> Result<()> {
        ensure!(!self.exists(), "output file already exists: {}", self.path.display());
        Ok(())
    }

    pub async fn open(&self) -> Result<fs::File> {
        fs::File::open(&self.path).await.with_context(|| format!("failed to open file: {}", self.path.display()))
    }

    /// Creates the file, and any missing parent directories, truncating existing content.
    pub async fn create(&self) -> Result<fs::File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        fs::File::create(&self.path).await.with_context(|| format!("failed to create file: {}", self.path.display()))
    }

    pub async fn delete(&self) -> Result<()> {
        ensure!(self.exists(), "file not found: {}", self.path.display());
        fs::remove_file(&self.path).await.with_context(|| format!("failed to delete file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let plain = File::new("report.txt");
        assert_eq!(plain.output_path(Processing::Encryption), PathBuf::from("report.txt.pcx"));
        assert!(!plain.is_encrypted());

        let sealed = File::new("report.txt.pcx");
        assert!(sealed.is_encrypted());
        assert_eq!(sealed.output_path(Processing::Decryption), PathBuf::from("report.txt"));

        assert_eq!(File::new("blob.bin").output_path(Processing::Decryption), PathBuf::from("blob.bin.out"));
        assert_eq!(File::new(".pcx").output_path(Processing::Decryption), PathBuf::from(".pcx.out"));
    }

    #[tokio::test]
    async fn test_create_size_delete() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::new(dir.path().join("nested").join("data.bin"));

        file.validate_output().unwrap();
        let mut handle = file.create().await.unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut handle, b"12345").await.unwrap();
        tokio::io::AsyncWriteExt::flush(&mut handle).await.unwrap();
        drop(handle);

        assert_eq!(file.size().await.unwrap(), 5);
        file.validate_input().await.unwrap();
        assert!(file.validate_output().is_err());

        file.delete().await.unwrap();
        assert!(!file.exists());
        assert!(file.delete().await.is_err());
    }

    #[tokio::test]
    async fn test_directory_is_not_valid_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(File::new(dir.path()).validate_input().await.is_err());
        assert!(File::new(dir.path().join("missing")).validate_input().await.is_err());
    }
}
