use std::ffi::CString;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{Dictionary, Packet, format::Pixel};

use crate::{decoder::VideoDecoder, scaler::RgbConverter, stream::VideoStream};

/// FFmpeg input format plus the url handed to `-i` for one capture device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTarget {
    pub format: Option<String>,
    pub url: String,
}

impl CaptureTarget {
    /// Numeric camera index, mapped to the platform's capture device.
    pub fn index(index: u32) -> Self {
        if cfg!(target_os = "linux") {
            Self::with_format("v4l2", format!("/dev/video{}", index))
        } else if cfg!(target_os = "macos") {
            Self::with_format("avfoundation", index.to_string())
        } else if cfg!(target_os = "windows") {
            Self::with_format("dshow", format!("video={}", index))
        } else {
            Self {
                format: None,
                url: index.to_string(),
            }
        }
    }

    /// Device node or any other url FFmpeg can open (loopback devices, files, streams).
    pub fn path(path: &str) -> Self {
        if cfg!(target_os = "linux") && path.starts_with("/dev/video") {
            return Self::with_format("v4l2", path.to_string());
        }
        Self {
            format: None,
            url: path.to_string(),
        }
    }

    fn with_format(format: &str, url: String) -> Self {
        Self {
            format: Some(format.to_string()),
            url,
        }
    }
}

impl Display for CaptureTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.format {
            Some(format) => write!(f, "{} ({})", self.url, format),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Picture converted to tightly packed RGB24.
pub struct RgbPicture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

struct Converter {
    format: Pixel,
    width: u32,
    height: u32,
    inner: RgbConverter,
}

/// An opened capture device: demuxer, decoder and RGB converter for its best video stream.
pub struct VideoCapture {
    target: CaptureTarget,
    backend: String,
    input: ffmpeg_next::format::context::Input,
    stream: VideoStream,
    decoder: VideoDecoder,
    converter: Option<Converter>,
}

// Only ever driven by one thread at a time; callers serialize access.
unsafe impl Send for VideoCapture {}

impl VideoCapture {
    /// Resolve input format by name (e.g. "v4l2", "avfoundation") via FFmpeg's av_find_input_format.
    fn find_input_format(name: &str) -> anyhow::Result<ffmpeg_next::format::format::Input> {
        let cname = CString::new(name)
            .map_err(|e| anyhow::anyhow!("invalid format name {:?}: {}", name, e))?;
        let ptr = unsafe { ffmpeg_next::ffi::av_find_input_format(cname.as_ptr()) };
        if ptr.is_null() {
            return Err(anyhow::anyhow!("input format not found: {}", name));
        }
        Ok(unsafe { ffmpeg_next::format::format::Input::wrap(ptr as *mut _) })
    }

    /// Demuxer options that keep at most one picture queued inside FFmpeg.
    fn low_latency_options() -> Dictionary<'static> {
        let mut options = Dictionary::new();
        options.set("fflags", "nobuffer");
        options.set("flags", "low_delay");
        options.set("probesize", "32");
        options
    }

    pub fn open(target: &CaptureTarget) -> anyhow::Result<Self> {
        use ffmpeg_next::format::format::Format;

        let path = Path::new(&target.url);
        let options = Self::low_latency_options();
        let input = match &target.format {
            Some(fmt_name) => {
                let fmt = Self::find_input_format(fmt_name)?;
                ffmpeg_next::format::open_with(path, &Format::Input(fmt), options)?.input()
            }
            None => ffmpeg_next::format::input_with_dictionary(path, options)?,
        };

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .map(VideoStream::from)
            .ok_or_else(|| anyhow::anyhow!("{} has no video stream", target))?;
        let decoder = VideoDecoder::new(&stream)?;
        let backend = input.format().name().to_string();

        log::debug!(
            "opened {} with backend {} (stream #{})",
            target,
            backend,
            stream.index()
        );

        Ok(Self {
            target: target.clone(),
            backend,
            input,
            stream,
            decoder,
            converter: None,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn width(&self) -> u32 {
        self.stream.width()
    }

    pub fn height(&self) -> u32 {
        self.stream.height()
    }

    pub fn fps(&self) -> f64 {
        self.stream.fps()
    }

    /// Blocks until the device delivers one picture and returns it as RGB24.
    pub fn read_rgb(&mut self) -> anyhow::Result<RgbPicture> {
        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    anyhow::bail!("end of stream on {}", self.target);
                }
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::util::error::EAGAIN =>
                {
                    std::thread::sleep(Duration::from_millis(5));
                    continue;
                }
                Err(err) => {
                    return Err(anyhow::anyhow!("read {} failed: {}", self.target, err));
                }
            }

            if packet.stream() != self.stream.index() {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            if let Some(frame) = self.decoder.receive_frame()? {
                return self.convert(&frame);
            }
        }
    }

    fn convert(&mut self, frame: &ffmpeg_next::frame::Video) -> anyhow::Result<RgbPicture> {
        let (format, width, height) = (frame.format(), frame.width(), frame.height());
        let stale = self
            .converter
            .as_ref()
            .is_none_or(|c| c.format != format || c.width != width || c.height != height);
        if stale {
            self.converter = Some(Converter {
                format,
                width,
                height,
                inner: RgbConverter::new(format, width, height)?,
            });
        }

        let converter = self
            .converter
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("rgb converter missing"))?;
        let data = converter.inner.run(frame)?;
        Ok(RgbPicture {
            data,
            width,
            height,
        })
    }
}
