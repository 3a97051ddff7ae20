use anyhow::Error;
use clap::Parser;
use dltool::{
    console::{exit_on_interrupt, StdinPrompt},
    dat::Dat,
    download, init_logging,
    job::Job,
    myrient::{self, LocalClient, Myrient},
};
use std::env;
use std::path::PathBuf;

/// Download the ROMs of a DAT file from Myrient.
///
/// Generate a DAT file with the tool of your choice to include the ROMs that you want from a
/// No-Intro, Redump or similar catalog, then use this tool to download the matching files from
/// Myrient.
#[derive(Parser)]
#[clap(version)]
struct Options {
    /// Input DAT file containing the wanted ROMs.
    #[clap(short = 'i', env = "DLTOOL_INPUT", value_name = "nointro.dat")]
    input: PathBuf,

    /// Output path for the downloaded ROM files.
    ///
    /// If omitted, a directory named after the system collection is created in the current
    /// directory.
    #[clap(short = 'o', env = "DLTOOL_OUT", value_name = "DIR")]
    out: Option<PathBuf>,

    /// Choose the catalog manually, even if it is found automatically.
    #[clap(short = 'c')]
    choose_catalog: bool,

    /// Choose the system collection manually, even if it is found automatically.
    #[clap(short = 's')]
    choose_system: bool,

    /// Only list the ROMs that are not found on the server; don't download anything.
    #[clap(short = 'l')]
    list: bool,

    /// Skip a download if the file already exists in the output directory, regardless of size.
    #[clap(long)]
    skip_existing: bool,

    /// Number of files to download at the same time.
    #[clap(short = 'j', long, env = "DLTOOL_JOBS", value_name = "N", default_value = "1")]
    jobs: usize,

    #[clap(flatten)]
    myrient: myrient::Options,
}

#[async_std::main]
async fn main() {
    init_logging();
    let opt = Options::parse();
    if let Err(err) = exit_on_interrupt() {
        tracing::warn!("unable to handle Ctrl+C: {err:#}");
    }

    let res = match &opt.myrient.mirror {
        Some(dir) => run(&LocalClient::open(dir.clone()), &opt).await,
        None => match opt.myrient.connect() {
            Ok(client) => run(&client, &opt).await,
            Err(err) => Err(err),
        },
    };
    if let Err(err) = res {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run<M: Myrient>(client: &M, opt: &Options) -> Result<(), Error> {
    if !opt.input.is_file() {
        return Err(Error::msg(format!(
            "Invalid input DAT-file: {}",
            opt.input.display()
        )));
    }

    tracing::info!("Opening and parsing input DAT-file...");
    let job = Job {
        dat: Dat::open(&opt.input)?,
        out: opt.out.clone(),
        choose_catalog: opt.choose_catalog,
        choose_system: opt.choose_system,
        list_only: opt.list,
        download: download::Options {
            skip_existing: opt.skip_existing,
            jobs: opt.jobs,
        },
    };
    job.execute(client, &mut StdinPrompt::default(), &env::current_dir()?)
        .await?;
    Ok(())
}
