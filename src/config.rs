use clap::Parser;

use crate::media::types::{DeviceId, StreamConfig};

/// Simple camera streaming server
#[derive(Parser, Debug, Clone)]
#[command(name = "camfeed", version, about)]
pub struct Args {
    /// Camera device (number or path like /dev/video10)
    #[arg(long, env = "CAMFEED_DEVICE", default_value = "0")]
    pub device: DeviceId,

    /// List available camera devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Port to run server on
    #[arg(long, env = "CAMFEED_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Host to bind to (0.0.0.0 for all interfaces)
    #[arg(long, env = "CAMFEED_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// JPEG quality (1-100, lower=smaller file)
    #[arg(long, env = "CAMFEED_QUALITY", default_value_t = 50,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Frame width in pixels
    #[arg(long, env = "CAMFEED_WIDTH", default_value_t = 640,
          value_parser = clap::value_parser!(u32).range(1..=65535))]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, env = "CAMFEED_HEIGHT", default_value_t = 480,
          value_parser = clap::value_parser!(u32).range(1..=65535))]
    pub height: u32,

    /// Limit FPS (e.g., 15 for lower bandwidth)
    #[arg(long, env = "CAMFEED_FPS", value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: Option<u32>,

    /// Enable debug logging
    #[arg(long, env = "CAMFEED_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            device: self.device.clone(),
            width: self.width,
            height: self.height,
            quality: self.quality,
            fps_limit: self.fps,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log_banner(&self) {
        log::info!("{}", "=".repeat(60));
        log::info!("Starting camera streaming server");
        log::info!("{}", "=".repeat(60));
        log::info!("Device: {}", self.device);
        log::info!("Resolution: {}x{}", self.width, self.height);
        log::info!("JPEG Quality: {}", self.quality);
        if let Some(fps) = self.fps {
            log::info!("FPS Limit: {}", fps);
        }
        log::info!("Host: {}", self.bind_addr());
        log::info!("URL: http://localhost:{}", self.port);
        log::info!("{}", "=".repeat(60));
    }
}
