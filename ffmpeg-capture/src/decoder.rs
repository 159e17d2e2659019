use ffmpeg_next::Packet;

use crate::stream::VideoStream;

pub struct VideoDecoder {
    inner: ffmpeg_next::codec::decoder::Video,
}

impl VideoDecoder {
    pub fn new(stream: &VideoStream) -> anyhow::Result<Self> {
        let mut decoder_ctx = ffmpeg_next::codec::Context::new();
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = stream.time_base().into();
        }
        decoder_ctx.set_parameters(stream.parameters().clone())?;

        let inner = decoder_ctx.decoder().video()?;
        if inner.width() == 0 || inner.height() == 0 {
            return Err(anyhow::anyhow!("missing codec parameters"));
        }

        Ok(Self { inner })
    }

    pub fn send_packet(&mut self, packet: &Packet) -> anyhow::Result<()> {
        self.inner.send_packet(packet)?;
        Ok(())
    }

    /// Pulls one decoded picture. `Ok(None)` means the decoder needs more input.
    pub fn receive_frame(&mut self) -> anyhow::Result<Option<ffmpeg_next::frame::Video>> {
        let mut frame = ffmpeg_next::frame::Video::empty();
        match self.inner.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
