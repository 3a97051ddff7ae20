//! A Myrient client speaking HTTP.

use super::{DownloadError, Failure, Fetched, Myrient, Options};
use crate::listing::{self, Entry};
use anyhow::Error;
use async_std::fs::{self, OpenOptions};
use async_std::future;
use async_std::io::{self, ReadExt, WriteExt};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use surf::{StatusCode, Url};

/// The public Myrient file server.
pub const MYRIENT_URL: &str = "https://myrient.erista.me/files/";

/// Browser-like headers sent when navigating listings.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

const CHUNK_SIZE: usize = 64 * 1024;

/// A Myrient client.
pub struct Client {
    base: String,
    listing: surf::Client,
    files: surf::Client,
    /// How long a download may go without hearing from the server.
    idle: Duration,
    tries: u32,
}

impl Client {
    /// Connect to the Myrient server at `opt.base_url`.
    pub fn new(opt: &Options) -> Result<Self, Error> {
        let mut base = opt.base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let listing: surf::Client = surf::Config::new()
            .set_timeout(Some(Duration::from_secs(opt.timeout)))
            .add_header("User-Agent", USER_AGENT)
            .map_err(Error::msg)?
            .add_header("Accept", ACCEPT)
            .map_err(Error::msg)?
            .try_into()?;
        // A file may take arbitrarily long to transfer, so downloads are bounded by `idle`
        // instead of an overall deadline.
        let files: surf::Client = surf::Config::new().set_timeout(None).try_into()?;

        Ok(Self {
            base,
            listing,
            files,
            idle: Duration::from_secs(opt.download_timeout),
            tries: opt.tries.max(1),
        })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(format!("{}{path}", self.base).parse()?)
    }

    /// Make a single attempt at downloading `url`, resuming from whatever is already in `dest`.
    ///
    /// Every byte written to `dest` is added to `received`, even if the attempt later fails.
    async fn fetch(
        &self,
        url: &Url,
        dest: &Path,
        received: &mut u64,
        progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
    ) -> Result<Fetched, DownloadError> {
        let offset = match fs::metadata(dest).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };

        let mut req = self.files.get(url.clone());
        if offset > 0 {
            req = req.header("Range", format!("bytes={offset}-"));
        }
        let mut res = future::timeout(self.idle, req)
            .await
            .map_err(|_| DownloadError::new(Failure::Network, "timed out waiting for a response"))?
            .map_err(transport_error)?;

        let append = match res.status() {
            StatusCode::PartialContent => true,
            StatusCode::Ok => false,
            StatusCode::RequestedRangeNotSatisfiable if offset > 0 => {
                return Ok(Fetched::AlreadyComplete { size: offset });
            }
            status => return Err(status_error(status)),
        };
        let mut size = if append { offset } else { 0 };
        let total = res.len().map(|len| size + len as u64);
        tracing::debug!(%url, offset, append, ?total, "receiving file");

        let mut file = if append {
            OpenOptions::new().append(true).open(dest).await
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(dest)
                .await
        }
        .map_err(|err| DownloadError::new(Failure::Io, err))?;

        let mut buf = vec![0; CHUNK_SIZE];
        loop {
            let n = io::timeout(self.idle, res.read(&mut buf))
                .await
                .map_err(|err| DownloadError::new(Failure::Network, err))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .await
                .map_err(|err| DownloadError::new(Failure::Io, err))?;
            size += n as u64;
            *received += n as u64;
            progress(size, total);
        }
        file.flush()
            .await
            .map_err(|err| DownloadError::new(Failure::Io, err))?;

        Ok(Fetched::Downloaded {
            bytes: *received,
            size,
        })
    }
}

#[async_trait]
impl Myrient for Client {
    async fn list(&self, path: &str) -> Result<Vec<Entry>, Error> {
        let url = self.url(path)?;
        tracing::debug!(%url, "listing directory");
        let mut res = self.listing.get(url.clone()).await.map_err(Error::msg)?;
        if !res.status().is_success() {
            return Err(Error::msg(format!(
                "{url} responded with status {}",
                res.status()
            )));
        }
        let html = res.body_string().await.map_err(Error::msg)?;
        listing::parse(&html).map_err(|err| Error::msg(format!("{url}: {err}")))
    }

    async fn download(
        &self,
        path: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
    ) -> Result<Fetched, DownloadError> {
        let url = self
            .url(path)
            .map_err(|err| DownloadError::new(Failure::Protocol, err))?;
        let mut received = 0;
        let mut attempt = 1;
        loop {
            match self.fetch(&url, dest, &mut received, &mut *progress).await {
                Err(err) if err.failure.is_transient() && attempt < self.tries => {
                    tracing::warn!(
                        "attempt {attempt}/{} for {url} failed ({err}), retrying",
                        self.tries
                    );
                    attempt += 1;
                }
                res => return res,
            }
        }
    }
}

/// Classify an error that prevented any response from arriving.
fn transport_error(err: surf::Error) -> DownloadError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("certificate") || lower.contains("ssl") || lower.contains("tls") {
        DownloadError::new(Failure::Tls, message)
    } else {
        DownloadError::new(Failure::Network, message)
    }
}

/// Classify an unexpected response status.
fn status_error(status: StatusCode) -> DownloadError {
    let message = format!("server responded with status {status}");
    match status {
        StatusCode::Unauthorized | StatusCode::Forbidden => {
            DownloadError::new(Failure::Authentication, message)
        }
        status if status.is_server_error() => DownloadError::new(Failure::Server, message),
        _ => DownloadError::new(Failure::Protocol, message),
    }
}
