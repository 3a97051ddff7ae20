//! A complete run: from a parsed DAT to files on disk and a report of what is missing.

use crate::dat::Dat;
use crate::download::{self, Summary};
use crate::myrient::Myrient;
use crate::plan::{self, Plan};
use crate::select::{self, Prompt};
use crate::text::sanitize_filename;
use anyhow::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a run needs to know besides the client and the prompt.
#[derive(Clone, Debug)]
pub struct Job {
    pub dat: Dat,
    /// Output directory. Relative paths are taken relative to the working directory.
    pub out: Option<PathBuf>,
    /// Ask for the catalog even if it can be found automatically.
    pub choose_catalog: bool,
    /// Ask for the collection even if it can be found automatically.
    pub choose_system: bool,
    /// Report what is missing without downloading anything.
    pub list_only: bool,
    pub download: download::Options,
}

/// The result of a run.
#[derive(Clone, Debug)]
pub struct Report {
    /// Title of the collection that was compared against.
    pub collection: String,
    /// Where files were downloaded to.
    pub out: PathBuf,
    pub plan: Plan,
    /// Download totals, or [`None`] in list-only mode.
    pub summary: Option<Summary>,
}

impl Job {
    /// Run the job against `client`, resolving relative output paths against `cwd`.
    pub async fn execute<M: Myrient>(
        &self,
        client: &M,
        prompt: &mut impl Prompt,
        cwd: &Path,
    ) -> Result<Report, Error> {
        let dat = &self.dat;
        match (dat.catalog(), &dat.url) {
            (Some(catalog), _) => tracing::info!("Processing {catalog}: {}...", dat.system),
            (None, Some(url)) => tracing::info!(
                "Processing {} (Catalog URL not recognized: {url})...",
                dat.system
            ),
            (None, None) => tracing::info!("Processing {} (No URL in DAT header)...", dat.system),
        }

        tracing::info!("Fetching Myrient main directory...");
        let root = client
            .list("")
            .await
            .map_err(|err| Error::msg(format!("Error fetching Myrient main directory: {err}")))?;
        let catalog = select::choose_catalog(&root, dat.catalog(), self.choose_catalog, prompt)?;

        tracing::info!("Fetching directory for catalog: {}...", catalog.title);
        let collections = client.list(&catalog.href).await.map_err(|err| {
            Error::msg(format!(
                "Error fetching catalog directory {}: {err}",
                catalog.title
            ))
        })?;
        let collection =
            select::choose_collection(&collections, &dat.system, self.choose_system, prompt)?;
        let collection_path = format!("{}{}", catalog.href, collection.href);

        let out = self.output_dir(&collection.title, cwd)?;

        tracing::info!("Fetching contents for collection: {}...", collection.title);
        let files = client.list(&collection_path).await.map_err(|err| {
            Error::msg(format!(
                "Error fetching collection directory {}: {err}",
                collection.title
            ))
        })?;
        if files.is_empty() {
            tracing::warn!(
                "No files found in the selected collection directory on Myrient: {}",
                collection.title
            );
        }

        let plan = Plan::build(&dat.games, &plan::available(&files, &collection_path));
        tracing::info!("Amount of wanted ROMs in DAT-file   : {}", dat.games.len());
        tracing::info!("Amount of found ROMs at server      : {}", plan.wanted.len());
        if !plan.missing.is_empty() {
            tracing::warn!("Amount of missing ROMs at server    : {}", plan.missing.len());
        }

        let summary = if self.list_only {
            tracing::info!("Listing mode enabled (-l). No files will be downloaded.");
            None
        } else {
            Some(download::run(client, &plan.wanted, &out, &self.download).await)
        };

        if plan.missing.is_empty() {
            tracing::info!("All ROMs in DAT found in the selected Myrient collection!");
        } else {
            tracing::warn!("--- Missing ROMs ---");
            tracing::error!(
                "Following {} ROMs in DAT were not found in Myrient collection \"{}\":",
                plan.missing.len(),
                collection.title
            );
            for name in &plan.missing {
                tracing::warn!("{name}");
            }
        }

        Ok(Report {
            collection: collection.title,
            out,
            plan,
            summary,
        })
    }

    /// Resolve the output directory and make sure it exists.
    fn output_dir(&self, collection: &str, cwd: &Path) -> Result<PathBuf, Error> {
        let out = match &self.out {
            Some(out) => cwd.join(out),
            None => {
                let out = cwd.join(sanitize_filename(collection));
                tracing::info!(
                    "Output directory not specified (-o). Using automatically generated path: {}",
                    out.display()
                );
                out
            }
        };
        if !out.is_dir() {
            tracing::warn!("Attempting to create output directory: {}", out.display());
            fs::create_dir_all(&out).map_err(|err| {
                Error::msg(format!(
                    "Error creating output directory: {} - {err}",
                    out.display()
                ))
            })?;
            tracing::info!("Output directory created successfully.");
        }
        tracing::info!("Using output directory: {}", out.display());
        Ok(out)
    }
}
