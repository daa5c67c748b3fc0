use super::{FrameSource, SourceError};
use crate::pair::ImagePair;
use image::DynamicImage;
use log::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("i/o error while decoding video: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to probe video stream: {0}")]
    Probe(String),
    #[error("decoder produced no frame")]
    NoFrame,
    #[error("cannot seek to frame {0}")]
    Seek(usize),
}

/// A sequential video decoder.
///
/// The position is the index of the frame the next [`grab`](Self::grab) will
/// decode. [`retrieve`](Self::retrieve) returns the most recently grabbed frame.
pub trait VideoCapture {
    fn position(&self) -> usize;

    /// Repositions so that the next grab decodes frame `index`.
    fn seek(&mut self, index: usize) -> Result<(), CaptureError>;

    /// Decodes the next frame. Returns `false` at the end of the stream.
    fn grab(&mut self) -> Result<bool, CaptureError>;

    fn retrieve(&mut self) -> Result<DynamicImage, CaptureError>;
}

/// Side-by-side stereo video: the left image is the left half of each frame.
///
/// Frames are reached by decoding forward from the current position. Only a
/// request for a frame that was already passed causes a seek, so increasing
/// indices (with any step) never reposition the decoder.
#[derive(Debug)]
pub struct VideoSource<C> {
    capture: C,
}

impl<C: VideoCapture> VideoSource<C> {
    pub fn new(capture: C) -> Self {
        Self { capture }
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }
}

fn end_of_sequence(frame: usize, reason: impl ToString) -> SourceError {
    SourceError::EndOfSequence {
        frame,
        reason: reason.to_string(),
    }
}

impl<C: VideoCapture> FrameSource for VideoSource<C> {
    fn get_frame(&mut self, index: usize) -> Result<ImagePair, SourceError> {
        if index < self.capture.position() {
            debug!(
                "seeking back from frame {} to frame {}",
                self.capture.position(),
                index
            );
            self.capture
                .seek(index)
                .map_err(|e| end_of_sequence(index, e))?;
        }
        while self.capture.position() <= index {
            match self.capture.grab() {
                Ok(true) => {}
                Ok(false) => return Err(end_of_sequence(index, "end of video stream")),
                Err(e) => return Err(end_of_sequence(index, e)),
            }
        }
        let frame = self
            .capture
            .retrieve()
            .map_err(|e| end_of_sequence(index, e))?;
        Ok(ImagePair::split_side_by_side(&frame))
    }
}
