use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    handler::AppState,
    media::{capture::FfmpegOpener, source::FrameSource},
};

mod api;
mod config;
mod devices;
mod handler;
mod media;

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("ffmpeg_capture", level)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = config::Args::parse();
    init_logging(args.debug);
    if args.debug {
        log::debug!("Debug logging enabled");
    }
    ffmpeg_capture::init()?;

    if args.list_devices {
        return devices::list_devices();
    }

    args.log_banner();

    let config = Arc::new(args.stream_config());
    let source = Arc::new(FrameSource::new(config.device.clone(), FfmpegOpener));
    let cancel = CancellationToken::new();

    let listener = TcpListener::bind(args.bind_addr()).await?;
    let state = AppState::new(Arc::clone(&config), Arc::clone(&source), cancel.clone());
    let server = api::start_api_server(listener, state, cancel.clone());

    tokio::select! {
        _ = cancel.cancelled() => {},
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down...");
            cancel.cancel();
        },
    }

    if let Err(e) = server.await {
        log::error!("API server task failed: {}", e);
    }
    source.release();

    Ok(())
}
