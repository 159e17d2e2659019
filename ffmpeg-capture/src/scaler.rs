use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context, flag::Flags};

/// Converts decoded pictures to packed RGB24 at their native size.
pub struct RgbConverter {
    context: Context,
    dst: ffmpeg_next::frame::Video,
}

impl RgbConverter {
    pub fn new(format: Pixel, width: u32, height: u32) -> anyhow::Result<Self> {
        let context = Context::get(
            format,
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )?;
        Ok(Self {
            context,
            dst: ffmpeg_next::frame::Video::empty(),
        })
    }

    /// Converts `frame` and returns its pixels with the row padding stripped.
    pub fn run(&mut self, frame: &ffmpeg_next::frame::Video) -> anyhow::Result<Vec<u8>> {
        self.context.run(frame, &mut self.dst)?;
        packed_rgb(&self.dst)
    }
}

unsafe impl Send for RgbConverter {}

fn packed_rgb(frame: &ffmpeg_next::frame::Video) -> anyhow::Result<Vec<u8>> {
    let height = frame.height() as usize;
    let row_bytes = frame.width() as usize * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        return data
            .get(..row_bytes * height)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| anyhow::anyhow!("rgb frame shorter than {} bytes", row_bytes * height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * stride;
        let line = data
            .get(start..start + row_bytes)
            .ok_or_else(|| anyhow::anyhow!("rgb frame row {} out of bounds", row))?;
        pixels.extend_from_slice(line);
    }
    Ok(pixels)
}
