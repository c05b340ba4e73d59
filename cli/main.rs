use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use werender_upload::{
    config, key_manager::Credentials, models::CreateMode, transport::HttpTransport,
    upload::FileUploader, UploadError,
};

/// werender-upload - Upload files to WeRender storage
#[derive(Parser)]
#[command(name = "werender-upload")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Path to werender.config (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Path to werender.key (overrides config)
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a file from a local path to a remote directory
    UploadFile {
        /// Local file to upload
        local_file: PathBuf,

        /// Remote directory to upload into
        remote_dir: String,

        /// How the server treats an existing file at the same path
        #[arg(short, long, value_enum, default_value_t = ModeArg::Unique)]
        mode: ModeArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Unique,
    Strict,
}

impl From<ModeArg> for CreateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Unique => CreateMode::Unique,
            ModeArg::Strict => CreateMode::Strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Use RUST_LOG to control log level (e.g., RUST_LOG=debug,reqwest=info)
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(command = ?cli.command, "werender-upload starting");

    match cli.command {
        Commands::UploadFile {
            local_file,
            remote_dir,
            mode,
        } => {
            cmd_upload_file(
                cli.config.as_deref(),
                cli.key.as_deref(),
                &local_file,
                &remote_dir,
                mode.into(),
            )
            .await
        }
    }
}

/// Create a styled progress bar for chunk uploads
fn create_progress_bar(total: u64, message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                 {bytes}/{total_bytes} ({percent}%) {msg}",
            )?
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}

/// Upload a single file
async fn cmd_upload_file(
    config_path: Option<&str>,
    key_path: Option<&str>,
    local_file: &Path,
    remote_dir: &str,
    mode: CreateMode,
) -> Result<()> {
    let mut cfg = config::Config::load_with_env(config_path)?;
    if let Some(key_path) = key_path {
        cfg = cfg.with_key_path(key_path);
    }
    info!(server = %cfg.server_address, "using server");

    let credentials = Credentials::load(&cfg.key_path).await?;
    let transport = HttpTransport::new(&cfg, credentials)?;

    let size = tokio::fs::metadata(local_file)
        .await
        .with_context(|| format!("reading metadata for {:?}", local_file))?
        .len();
    let pb = create_progress_bar(size, "Uploading")?;

    let progress = pb.clone();
    let result = FileUploader::new(&transport)
        .with_mode(mode)
        .with_progress(move |p| {
            progress.set_position(p.bytes_sent);
            progress.set_message(format!("chunk {}/{}", p.index + 1, p.total));
        })
        .upload(local_file, remote_dir)
        .await;

    match result {
        Ok(file) => {
            pb.finish_with_message("done");
            println!(
                "Uploaded {} -> {} (id {})",
                local_file.display(),
                file.path.as_deref().unwrap_or(remote_dir),
                file.id
            );
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            if e.is_retryable() {
                eprintln!(
                    "The upload can be retried; the remote file stays unfinalized until then."
                );
            }
            Err(report(e, local_file))
        }
    }
}

fn report(err: UploadError, local_file: &Path) -> anyhow::Error {
    anyhow::Error::new(err).context(format!("uploading {}", local_file.display()))
}
