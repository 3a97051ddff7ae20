//! Facilities for browsing and downloading from Myrient.

use crate::listing::Entry;
use anyhow::Error;
use async_trait::async_trait;
use clap::Args;
use std::path::{Path, PathBuf};
use strum::Display;
use surf::Url;

mod client;
mod local;

pub use client::{Client, MYRIENT_URL};
pub use local::LocalClient;

/// A Myrient client.
///
/// Paths are relative to the root of the file server and are built by concatenating the `href`s
/// of the listing entries leading to a directory or file, e.g. `No-Intro/` followed by
/// `Nintendo%20-%20Game%20Boy/`. The empty path is the root itself.
#[async_trait]
pub trait Myrient: Sync {
    /// List the entries of the directory at `path`.
    async fn list(&self, path: &str) -> Result<Vec<Entry>, Error>;

    /// Download the file at `path` to `dest`.
    ///
    /// If `dest` already exists, it is assumed to hold the beginning of the file and only the
    /// remainder is transferred. `progress` is called as data arrives with the size of `dest` so
    /// far and the full size of the file, if known.
    async fn download(
        &self,
        path: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
    ) -> Result<Fetched, DownloadError>;
}

/// The result of a successful download.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// `bytes` were transferred, leaving a complete file of `size` bytes.
    Downloaded { bytes: u64, size: u64 },
    /// The local file was already complete.
    AlreadyComplete { size: u64 },
}

/// Categories of download failure.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Failure {
    #[strum(serialize = "File I/O error")]
    Io,
    #[strum(serialize = "Network failure")]
    Network,
    #[strum(serialize = "SSL verification failure")]
    Tls,
    #[strum(serialize = "Authentication failure")]
    Authentication,
    #[strum(serialize = "Protocol error")]
    Protocol,
    #[strum(serialize = "Server error")]
    Server,
}

impl Failure {
    /// Whether a failure of this kind may go away if the download is retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}

/// A failed download.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "{}: {}", failure, message)]
pub struct DownloadError {
    pub failure: Failure,
    pub message: String,
}

impl DownloadError {
    pub fn new(failure: Failure, message: impl ToString) -> Self {
        Self {
            failure,
            message: message.to_string(),
        }
    }
}

impl std::error::Error for DownloadError {}

/// Options for connecting to Myrient.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// Root URL of the Myrient file server.
    #[clap(long, env = "DLTOOL_BASE_URL", default_value = MYRIENT_URL)]
    pub base_url: Url,

    /// Browse and download from a local copy of the server tree at DIR instead of over HTTP.
    #[clap(long, env = "DLTOOL_MIRROR", value_name = "DIR")]
    pub mirror: Option<PathBuf>,

    /// Timeout for directory listing requests, in seconds.
    #[clap(long, env = "DLTOOL_TIMEOUT", value_name = "SECS", default_value = "60")]
    pub timeout: u64,

    /// How long a file download may wait for the server to respond or send more data, in
    /// seconds.
    #[clap(
        long,
        env = "DLTOOL_DOWNLOAD_TIMEOUT",
        value_name = "SECS",
        default_value = "600"
    )]
    pub download_timeout: u64,

    /// How many times to try each download before giving up on network or server errors.
    #[clap(long, env = "DLTOOL_TRIES", value_name = "N", default_value = "3")]
    pub tries: u32,
}

impl Options {
    /// Connect to the Myrient server over HTTP.
    pub fn connect(&self) -> Result<Client, Error> {
        Client::new(self)
    }
}
