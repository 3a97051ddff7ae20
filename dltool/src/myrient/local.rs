//! A Myrient client which reads from a local copy of the server tree instead of over HTTP.

use super::{DownloadError, Failure, Fetched, Myrient};
use crate::listing::Entry;
use anyhow::Error;
use async_std::fs::{self, File, OpenOptions};
use async_std::io::{self, SeekExt, SeekFrom, WriteExt};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// A Myrient client which reads from the local file system.
///
/// The directory layout mirrors the server: the root holds one directory per catalog, each
/// catalog one directory per collection, and each collection the files themselves.
pub struct LocalClient {
    root: PathBuf,
}

impl LocalClient {
    /// Open a local mirror rooted at `root`.
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a server path to the local file system.
    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let segment = urlencoding::decode(segment)?;
            let mut components = Path::new(segment.as_ref()).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => resolved.push(name),
                _ => return Err(Error::msg(format!("invalid path segment {segment:?}"))),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Myrient for LocalClient {
    async fn list(&self, path: &str) -> Result<Vec<Entry>, Error> {
        let dir = self.resolve(path)?;
        let dirents = dir.read_dir().map_err(|err| {
            Error::msg(format!("unable to read directory {}: {err}", dir.display()))
        })?;
        let mut entries = vec![];
        for dirent in dirents {
            let dirent = match dirent {
                Ok(dirent) => dirent,
                Err(err) => {
                    tracing::error!("unable to read directory {}: {err}", dir.display());
                    continue;
                }
            };
            let Some(name) = dirent.file_name().to_str().map(String::from) else {
                tracing::warn!("{} is not valid UTF-8, skipping", dirent.path().display());
                continue;
            };
            let mut href = urlencoding::encode(&name).into_owned();
            if dirent.path().is_dir() {
                href.push('/');
            }
            entries.push(Entry::new(name, href));
        }
        entries.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(entries)
    }

    async fn download(
        &self,
        path: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
    ) -> Result<Fetched, DownloadError> {
        let src = self
            .resolve(path)
            .map_err(|err| DownloadError::new(Failure::Protocol, err))?;
        let size = match fs::metadata(&src).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                return Err(DownloadError::new(
                    Failure::Protocol,
                    format!("{} is not a file", src.display()),
                ))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(DownloadError::new(
                    Failure::Protocol,
                    format!("{} not found", src.display()),
                ))
            }
            Err(err) => return Err(DownloadError::new(Failure::Io, err)),
        };
        let offset = match fs::metadata(dest).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };
        if offset == size && offset > 0 {
            return Ok(Fetched::AlreadyComplete { size });
        }

        let io_error = |err: io::Error| DownloadError::new(Failure::Io, err);
        let mut reader = File::open(&src).await.map_err(io_error)?;
        let mut writer = if offset > 0 && offset < size {
            reader
                .seek(SeekFrom::Start(offset))
                .await
                .map_err(io_error)?;
            OpenOptions::new()
                .append(true)
                .open(dest)
                .await
                .map_err(io_error)?
        } else {
            File::create(dest).await.map_err(io_error)?
        };
        let bytes = io::copy(&mut reader, &mut writer).await.map_err(io_error)?;
        writer.flush().await.map_err(io_error)?;
        progress(size, Some(size));

        Ok(Fetched::Downloaded { bytes, size })
    }
}
