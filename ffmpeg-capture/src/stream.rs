use ffmpeg_next::{Rational, codec::Parameters, format::stream};

unsafe impl Send for VideoStream {}

/// Snapshot of the selected video stream, taken once when the input is opened.
pub struct VideoStream {
    index: usize,
    parameters: Parameters,
    time_base: Rational,
    rate: Rational,
}

impl VideoStream {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn width(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).width.max(0) as u32
        }
    }

    pub fn height(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).height.max(0) as u32
        }
    }

    /// Average frame rate reported by the demuxer, 0.0 when the device does not say.
    pub fn fps(&self) -> f64 {
        if self.rate.denominator() == 0 {
            return 0.0;
        }
        self.rate.numerator() as f64 / self.rate.denominator() as f64
    }
}

impl From<stream::Stream<'_>> for VideoStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        Self {
            index: stream.index(),
            parameters: stream.parameters(),
            time_base: stream.time_base(),
            rate: stream.avg_frame_rate(),
        }
    }
}
