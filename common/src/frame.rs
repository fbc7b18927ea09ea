use image::RgbImage;

/// A decoded video frame.
///
/// Pixels are packed RGB, 8 bits per channel, row-major with no padding,
/// which is exactly ffmpeg's `rgb24` rawvideo layout.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Zero-based decode index since the source was last opened or rewound.
    pub seq: u64,
}

const CHANNELS: usize = 3;

impl Frame {
    pub fn new(image: RgbImage, seq: u64) -> Self {
        Self { image, seq }
    }

    /// Wrap one rawvideo `rgb24` buffer read from a decoder pipe.
    pub fn from_rgb24(data: Vec<u8>, width: u32, height: u32, seq: u64) -> Result<Self, FrameError> {
        let expected = frame_len(width, height);
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                got: data.len(),
                expected,
            });
        }
        let image = RgbImage::from_raw(width, height, data).ok_or(FrameError::SizeMismatch {
            got: 0,
            expected,
        })?;
        Ok(Self { image, seq })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Number of bytes in one `rgb24` frame of the given size.
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame buffer has wrong size: got {got} bytes, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },
}
