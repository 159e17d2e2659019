//! Camera feed orchestration: loopback setup, network ingest, remote capture, web server.
//!
//! ```bash
//! camfeed-relay setup                                  # create /dev/video2
//! camfeed-relay listen -p 5000                         # tcp://0.0.0.0:5000 -> /dev/video2
//! camfeed-relay stream -r mac.local -l 192.168.1.20    # remote camera -> this host
//! camfeed-relay all -w 8080                            # listen + web server
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};

mod cmd;

use cmd::Cmd;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Setup,
    Listen,
    Stream,
    Web,
    All,
}

/// Camera feed streaming - listen, stream, or serve web.
#[derive(Parser, Debug)]
#[command(name = "camfeed-relay", version, about)]
struct Cli {
    #[arg(value_enum)]
    mode: Mode,

    /// Remote host for stream mode
    #[arg(short, long)]
    remote: Option<String>,

    /// Local IP for stream mode
    #[arg(short, long)]
    local: Option<String>,

    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Use UDP instead of TCP
    #[arg(short, long)]
    udp: bool,

    #[arg(short, long, default_value_t = 8080)]
    web_port: u16,

    #[arg(short, long, default_value = "/dev/video2")]
    device: String,
}

async fn run(cmd: &Cmd) -> anyhow::Result<()> {
    log::info!("running: {}", cmd);
    let status = cmd
        .command()
        .status()
        .await
        .with_context(|| format!("failed to start {}", cmd.program))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", cmd.program, status);
    }
    Ok(())
}

async fn stream(cli: &Cli) -> anyhow::Result<()> {
    let (Some(remote), Some(local)) = (&cli.remote, &cli.local) else {
        anyhow::bail!("stream mode requires --remote and --local");
    };
    let destination = cmd::stream_destination(local, cli.port, cli.udp);
    run(&cmd::install_remote_script(remote)).await?;
    run(&cmd::run_remote_script(remote, &destination)).await
}

async fn listen_and_serve(cli: &Cli) -> anyhow::Result<()> {
    let listen = cmd::listen(cli.port, cli.udp, &cli.device);
    log::info!("starting: {}", listen);
    let mut listener = listen
        .command()
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to start {}", listen.program))?;

    let result = run(&cmd::web(cmd::server_binary(), &cli.device, cli.web_port)).await;

    if let Err(e) = listener.kill().await {
        log::warn!("failed to stop listener: {}", e);
    }
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.mode {
        Mode::Setup => run(&cmd::setup()).await,
        Mode::Listen => run(&cmd::listen(cli.port, cli.udp, &cli.device)).await,
        Mode::Stream => stream(&cli).await,
        Mode::Web => run(&cmd::web(cmd::server_binary(), &cli.device, cli.web_port)).await,
        Mode::All => listen_and_serve(&cli).await,
    }
}
