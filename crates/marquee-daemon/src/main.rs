mod controller;
mod display;
mod errlog;
mod frame;
mod http;
mod memory;
mod scheduler;
mod status;
mod thumbnail;
mod tokens;
mod transit;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use embedded_graphics::prelude::IntoStorage;
use marquee_proto::config::{Config, SourceKind};
use marquee_proto::platform;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::controller::Controller;
use crate::display::{Framebuffer, Palette};
use crate::errlog::ErrorLogLayer;
use crate::memory::ProcMeminfo;
use crate::scheduler::Scheduler;
use crate::status::{StatusPoller, StatusSource};
use crate::thumbnail::{Corner, Thumbnail, ThumbnailPipeline};
use crate::tokens::{Anonymous, Credentials, TokenStore};
use crate::transit::TransitPoller;

#[derive(Parser, Debug)]
#[command(name = "marquee", version, about = "Now-playing marquee for a 64x32 LED panel")]
struct Args {
    /// Config file (default: <config dir>/marquee/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(long, short)]
    verbose: bool,

    /// Run one refresh cycle, print the status as JSON and exit
    #[arg(long)]
    once: bool,
}

fn init_logging(config: &Config, verbose: bool) -> anyhow::Result<PathBuf> {
    let log_path = platform::daemon_log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,marquee_daemon=debug"))
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ErrorLogLayer::open(&config.paths.error_log)?)
        .with(filter)
        .init();

    Ok(log_path)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let (config, config_path) = match &args.config {
        Some(path) => (Config::load_from(path)?, path.clone()),
        None => (Config::load()?, Config::config_path()),
    };

    let log_path = init_logging(&config, args.verbose)?;
    info!("Log file: {:?}", log_path);
    info!("Config loaded from: {:?}", config_path);

    let http = http::build_client(config.timing.http_timeout())?;

    match config.source {
        SourceKind::Playback => {
            let (client_id, client_secret) = config.credentials.resolve();
            if client_id.is_empty() || client_secret.is_empty() {
                tracing::warn!("client credentials are empty; token refresh will be rejected");
            }

            let credentials = TokenStore::new(
                config.paths.token_file.clone(),
                config.endpoints.token_url.clone(),
                client_id,
                client_secret,
                http.clone(),
            );
            let status = StatusPoller::new(
                http.clone(),
                config.endpoints.status_url.clone(),
                config.endpoints.image_size,
            );
            info!("Token file: {:?}", credentials.path());
            drive(&args, &config, http, credentials, status).await
        }
        SourceKind::Transit => {
            info!("Departures from {}", config.transit.stop_url);
            let status = TransitPoller::new(http.clone(), &config.transit);
            drive(&args, &config, http, Anonymous, status).await
        }
    }
}

async fn drive<C, S>(
    args: &Args,
    config: &Config,
    http: reqwest::Client,
    credentials: C,
    status: S,
) -> anyhow::Result<ExitCode>
where
    C: Credentials,
    S: StatusSource,
{
    if args.once {
        let playing = controller::fetch_status(&credentials, &status).await?;
        println!("{}", serde_json::to_string_pretty(&playing)?);
        return Ok(ExitCode::SUCCESS);
    }

    let [cx, cy] = config.display.corner;
    let corner = Corner::new(cx, cy)
        .ok_or_else(|| anyhow::anyhow!("invalid display.corner {:?}", config.display.corner))?;
    let palette = Palette::from_rgb888(config.display.text_color, config.display.background_color);
    let placeholder = Thumbnail::placeholder(
        config.paths.placeholder_image.as_deref(),
        palette.background.into_storage(),
    );

    let mut controller = Controller::new(
        credentials,
        status,
        ThumbnailPipeline::new(http, corner),
        Framebuffer::new(config.paths.framebuffer.clone()),
        ProcMeminfo,
        placeholder,
        config.display.spacer,
        palette,
        config.memory.floor_kib,
    );

    info!("Controller initialised, driving {:?}", config.paths.framebuffer);
    controller.run(&Scheduler::from_config(&config.timing)).await;

    // Dropping the controller closes the HTTP client and its pooled connections.
    drop(controller);
    info!("exiting for restart (code {})", platform::RESTART_EXIT_CODE);
    Ok(ExitCode::from(platform::RESTART_EXIT_CODE))
}
