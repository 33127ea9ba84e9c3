//! Presign Uploadr - upload a file through a pre-signed PUT URL
//!
//! Streams a local file straight to object storage and reports progress.

use clap::Parser;
use presign_uploadr::config::Config;
use presign_uploadr::upload::DropZone;
use presign_uploadr::view::{self, ProgressRenderer};
use presign_uploadr::{logging, metrics, HttpTransport, Phase, SelectedFile, UploadSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Presign Uploadr - upload a file to object storage through a pre-signed URL
#[derive(Parser, Debug)]
#[command(name = "presign-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pre-signed PUT URL (overrides upload.url from the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Files to upload; only the first one is taken
    files: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the final state as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Write Prometheus metrics to this file when done
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    logging::init_subscriber(&config.logging, args.log_level.as_deref())?;
    info!("Starting presign-uploadr v{}", presign_uploadr::VERSION);
    if let Some(path) = &args.config {
        info!("Loaded configuration from {:?}", path);
    }

    let transport = HttpTransport::new(&config.transport)?;
    let mut session = UploadSession::new(transport);

    if let Some(url) = args.url.clone().or_else(|| config.upload.url.clone()) {
        session.controller_mut().set_target(url);
    }

    if let Some((first, rest)) = args.files.split_first() {
        if !rest.is_empty() {
            warn!(ignored = rest.len(), "Only the first file is uploaded");
        }

        let mut drop_zone = DropZone::default();
        drop_zone.drag_over();
        match SelectedFile::from_path(first).await {
            Ok(file) => {
                drop_zone.drop(session.controller_mut(), [file]);
            }
            Err(e) => {
                drop_zone.drag_leave();
                warn!(path = ?first, error = %e, "Could not read file");
            }
        }
    }

    let initial = session.controller().snapshot();
    if let Some(line) = view::file_line(&initial) {
        eprintln!("{}", line);
    }

    session.controller_mut().submit();

    let mut renderer = ProgressRenderer::new(std::io::stderr());
    renderer.render(&session.controller().snapshot());
    let snapshot = session
        .run_until_settled(shutdown_signal(), |s| {
            renderer.render(s);
        })
        .await;
    renderer.render(&snapshot);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    if let Some(path) = &args.metrics_out {
        std::fs::write(path, metrics::gather_text()?)?;
        info!("Wrote metrics to {:?}", path);
    }

    Ok(match snapshot.state.phase {
        Phase::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
