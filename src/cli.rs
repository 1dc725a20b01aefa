use crate::checkpoint::{CheckpointStore, FileCheckpoint, CHECKPOINT_FILE};
use crate::engine::{Pipeline, PipelineOptions};
use crate::services::export::CsvExporter;
use crate::services::fetch::HttpSession;
use crate::types::ApiResponse;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cagestats", version, about = "Incremental MMA event + fighter scraper (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every completed event newer than the checkpoint
    Run(RunArgs),
    #[command(subcommand)]
    Checkpoint(CheckpointCmd),
}

#[derive(Args)]
struct RunArgs {
    /// Directory for fights.csv, fighters.csv and the checkpoint
    /// (default: platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Ignore the checkpoint and backfill every completed event
    #[arg(long)]
    full: bool,
    /// Stop after this many events
    #[arg(long)]
    limit: Option<usize>,
    /// Alternate completed-events listing URL
    #[arg(long)]
    listing_url: Option<String>,
}

#[derive(Subcommand)]
enum CheckpointCmd {
    /// Print the stored checkpoint, if any
    Show {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Forget progress; the next run backfills everything
    Reset {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long = "yes")]
        yes: bool,
    },
}

/// Entry point; the returned code is the process exit status.
pub fn run() -> i32 {
    run_from(std::env::args_os())
}

fn run_from<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    // clap's own exit would use status 2 for usage errors, colliding with
    // the fetch/timeout code; usage errors map to 1 here instead.
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { 1 } else { 0 };
        }
    };
    match cli.cmd {
        Command::Run(args) => finish(run_cmd(args)),
        Command::Checkpoint(CheckpointCmd::Show { data_dir }) => finish(show_cmd(data_dir)),
        Command::Checkpoint(CheckpointCmd::Reset { data_dir, yes }) => {
            if !yes {
                print_json(ApiResponse::<()>::err("refusing to reset without --yes"));
                return 1;
            }
            finish(reset_cmd(data_dir))
        }
    }
}

fn run_cmd(args: RunArgs) -> crate::Result<crate::types::RunSummary> {
    let dir = data_dir(args.data_dir)?;
    let session = HttpSession::new()?;
    let checkpoint = FileCheckpoint::new(dir.join(CHECKPOINT_FILE));
    let exporter = CsvExporter::new(&dir)?;

    let mut options = PipelineOptions {
        ignore_checkpoint: args.full,
        event_limit: args.limit,
        ..Default::default()
    };
    if let Some(url) = args.listing_url {
        options.listing_url = url;
    }
    Pipeline::new(session, checkpoint, exporter, options).run()
}

fn show_cmd(data_dir: Option<PathBuf>) -> crate::Result<serde_json::Value> {
    let dir = data_dir_existing(data_dir)?;
    let checkpoint = FileCheckpoint::new(dir.join(CHECKPOINT_FILE)).load()?;
    Ok(serde_json::json!({ "checkpoint": checkpoint }))
}

fn reset_cmd(data_dir: Option<PathBuf>) -> crate::Result<serde_json::Value> {
    let dir = data_dir_existing(data_dir)?;
    FileCheckpoint::new(dir.join(CHECKPOINT_FILE)).clear()?;
    Ok(serde_json::json!({ "reset": true }))
}

fn data_dir(explicit: Option<PathBuf>) -> crate::Result<PathBuf> {
    let dir = data_dir_existing(explicit)?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn data_dir_existing(explicit: Option<PathBuf>) -> crate::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    directories::ProjectDirs::from("io", "cagestats", "cagestats")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .ok_or_else(|| {
            crate::ScrapeError::Storage("could not determine data directory".to_string())
        })
}

fn finish<T: serde::Serialize>(res: crate::Result<T>) -> i32 {
    match res {
        Ok(v) => {
            print_json(ApiResponse::ok(v));
            0
        }
        Err(e) => {
            let code = e.exit_code();
            print_json(ApiResponse::<()>::err(e.to_string()));
            code
        }
    }
}

fn print_json<T: serde::Serialize>(val: T) {
    // pretty JSON output
    println!("{}", serde_json::to_string_pretty(&val).unwrap());
}
