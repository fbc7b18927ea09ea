use capscan_common::video::{EncoderError, FrameSink, FrameSource, SourceError};
use capscan_vision::{annotate, detect, DetectionParameters};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode input: {0}")]
    Source(#[from] SourceError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] EncoderError),
}

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: u64,
    pub detections: u64,
    /// Most caps seen in a single frame.
    pub peak: usize,
}

/// Detect and annotate every frame of `source` and write the results to
/// `sink` in order. Stops at end of stream; the caller finalizes the sink.
pub fn render<S, K>(source: &mut S, sink: &mut K, params: &DetectionParameters) -> Result<RenderSummary, RenderError>
where
    S: FrameSource,
    K: FrameSink,
{
    let mut summary = RenderSummary::default();

    while let Some(frame) = source.next_frame()? {
        let blobs = detect(&frame.image, params);
        let annotated = annotate(&frame.image, &blobs);
        sink.write_frame(&annotated)?;

        summary.frames += 1;
        summary.detections += blobs.len() as u64;
        summary.peak = summary.peak.max(blobs.len());
        debug!(seq = frame.seq, caps = blobs.len(), "frame rendered");

        if summary.frames % 300 == 0 {
            info!(frames = summary.frames, detections = summary.detections, "render progress");
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capscan_common::frame::Frame;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_circle_mut;

    struct FakeSource {
        frames: Vec<RgbImage>,
        pos: usize,
    }

    impl FakeSource {
        /// `count` frames of a blue cap sliding right two pixels per frame.
        fn moving_cap(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| {
                    let mut img = RgbImage::from_pixel(96, 64, Rgb([80, 80, 80]));
                    draw_filled_circle_mut(&mut img, (30 + 2 * i as i32, 32), 12, Rgb([0, 0, 255]));
                    img
                })
                .collect();
            Self { frames, pos: 0 }
        }
    }

    impl FrameSource for FakeSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            let Some(image) = self.frames.get(self.pos) else {
                return Ok(None);
            };
            let frame = Frame::new(image.clone(), self.pos as u64);
            self.pos += 1;
            Ok(Some(frame))
        }

        fn rewind(&mut self) -> Result<(), SourceError> {
            self.pos = 0;
            Ok(())
        }

        fn dimensions(&self) -> (u32, u32) {
            (96, 64)
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: Vec<RgbImage>,
        fail_after: Option<usize>,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, image: &RgbImage) -> Result<(), EncoderError> {
            if self.fail_after == Some(self.written.len()) {
                return Err(EncoderError::Write("pipe closed".into()));
            }
            self.written.push(image.clone());
            Ok(())
        }
    }

    #[test]
    fn writes_every_frame_in_order() {
        let mut source = FakeSource::moving_cap(10);
        let mut sink = MemorySink::default();

        let summary = render(&mut source, &mut sink, &DetectionParameters::default()).unwrap();

        assert_eq!(summary.frames, 10);
        assert_eq!(summary.detections, 10);
        assert_eq!(summary.peak, 1);
        assert_eq!(sink.written.len(), 10);
        assert!(sink.written.iter().all(|img| img.dimensions() == (96, 64)));
        assert_ne!(sink.written[0], sink.written[9]);
        assert_ne!(sink.written[0], source.frames[0]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut source = FakeSource::moving_cap(0);
        let mut sink = MemorySink::default();
        let summary = render(&mut source, &mut sink, &DetectionParameters::default()).unwrap();
        assert_eq!(summary, RenderSummary::default());
        assert!(sink.written.is_empty());
    }

    #[test]
    fn encoder_failure_stops_the_run() {
        let mut source = FakeSource::moving_cap(10);
        let mut sink = MemorySink {
            fail_after: Some(4),
            ..MemorySink::default()
        };
        let err = render(&mut source, &mut sink, &DetectionParameters::default()).unwrap_err();
        assert!(matches!(err, RenderError::Encode(EncoderError::Write(_))));
        assert_eq!(sink.written.len(), 4);
    }
}
