//! Downloading the planned files into the output directory.

use crate::myrient::{DownloadError, Failure, Fetched, Myrient};
use crate::plan::RemoteFile;
use crate::text::scale1024;
use futures::stream::{self, StreamExt};
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, Instant};

/// How often a running download logs its progress.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// How to download.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Leave files which already exist in the output directory alone, whatever their size.
    pub skip_existing: bool,
    /// The maximum number of simultaneous downloads.
    pub jobs: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            skip_existing: false,
            jobs: 1,
        }
    }
}

/// What happened to a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Downloaded { bytes: u64, size: u64 },
    AlreadyComplete { size: u64 },
    Skipped,
    Failed(DownloadError),
}

/// Totals over a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub downloaded: usize,
    pub already_complete: usize,
    pub skipped: usize,
    /// Names of the files that could not be downloaded, in plan order.
    pub failed: Vec<String>,
    /// Bytes transferred.
    pub bytes: u64,
}

/// Download every file in `files` into `out`.
///
/// Failures are logged and counted, but never stop the remaining downloads.
pub async fn run<M: Myrient>(
    client: &M,
    files: &[RemoteFile],
    out: &Path,
    opt: &Options,
) -> Summary {
    let total = files.len();
    if total == 0 {
        tracing::info!("No files needed downloading.");
        return Summary::default();
    }
    tracing::info!("Starting download of {total} files...");

    let mut outcomes = stream::iter(files.iter().enumerate())
        .map(|(i, file)| async move {
            let prefix = counter(i + 1, total);
            (i, download_one(client, file, out, opt, &prefix).await)
        })
        .buffer_unordered(opt.jobs.max(1))
        .collect::<Vec<_>>()
        .await;
    outcomes.sort_by_key(|(i, _)| *i);

    let mut summary = Summary::default();
    for (i, outcome) in outcomes {
        match outcome {
            Outcome::Downloaded { bytes, .. } => {
                summary.downloaded += 1;
                summary.bytes += bytes;
            }
            Outcome::AlreadyComplete { .. } => summary.already_complete += 1,
            Outcome::Skipped => summary.skipped += 1,
            Outcome::Failed(_) => summary.failed.push(files[i].name.clone()),
        }
    }

    tracing::info!("Downloading complete!");
    if !summary.failed.is_empty() {
        tracing::warn!("{} of {total} files could not be downloaded", summary.failed.len());
    }
    summary
}

/// Download a single file, logging its progress with `prefix`.
pub async fn download_one<M: Myrient>(
    client: &M,
    file: &RemoteFile,
    out: &Path,
    opt: &Options,
    prefix: &str,
) -> Outcome {
    // The file name comes from the server; it must not escape the output directory.
    if Path::new(&file.file).file_name() != Some(OsStr::new(&file.file)) {
        let err =
            DownloadError::new(Failure::Protocol, format!("invalid file name {:?}", file.file));
        tracing::error!("{prefix} Error downloading {}: {err}", file.name);
        return Outcome::Failed(err);
    }
    let dest = out.join(&file.file);

    if opt.skip_existing && dest.is_file() {
        tracing::info!("{prefix} Skipping: {} already exists.", file.name);
        return Outcome::Skipped;
    }

    tracing::info!("{prefix} Downloading: {}", file.name);
    let mut log = ProgressLog::new(prefix, &file.name, PROGRESS_INTERVAL);
    let mut progress = |size: u64, total: Option<u64>| {
        if let Some(line) = log.update(size, total) {
            tracing::info!("{line}");
        }
    };
    match client.download(&file.path, &dest, &mut progress).await {
        Ok(Fetched::Downloaded { bytes, size }) => {
            tracing::info!("{prefix} Downloaded: {} ({})", file.name, scale1024(size));
            Outcome::Downloaded { bytes, size }
        }
        Ok(Fetched::AlreadyComplete { size }) => {
            tracing::info!("{prefix} Already complete: {} ({})", file.name, scale1024(size));
            Outcome::AlreadyComplete { size }
        }
        Err(err) => {
            tracing::error!("{prefix} Error downloading {}: {err}", file.name);
            Outcome::Failed(err)
        }
    }
}

/// Progress lines for a single file, at most one per interval.
struct ProgressLog<'a> {
    prefix: &'a str,
    name: &'a str,
    interval: Duration,
    next: Instant,
}

impl<'a> ProgressLog<'a> {
    fn new(prefix: &'a str, name: &'a str, interval: Duration) -> Self {
        Self {
            prefix,
            name,
            interval,
            next: Instant::now() + interval,
        }
    }

    /// The line to log for a file which has reached `size` bytes, if one is due.
    fn update(&mut self, size: u64, total: Option<u64>) -> Option<String> {
        let now = Instant::now();
        if now < self.next {
            return None;
        }
        self.next = now + self.interval;
        Some(match total {
            Some(total) if total > 0 => format!(
                "{} {}: {} / {} ({}%)",
                self.prefix,
                self.name,
                scale1024(size),
                scale1024(total),
                size * 100 / total
            ),
            _ => format!("{} {}: {}", self.prefix, self.name, scale1024(size)),
        })
    }
}

/// The `[007/123]` progress prefix, padded to the width of the total.
pub fn counter(n: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{n:0width$}/{total}]")
}
