use super::{FrameSource, InputKind, SourceError};
use crate::pair::ImagePair;
use image::DynamicImage;
use log::*;
use std::path::Path;

pub type ReaderError = Box<dyn std::error::Error + Send + Sync>;

/// Random access into a multiplexed recording holding several image streams.
pub trait MultiplexedReader {
    /// Indexes the recording. Must succeed before any other call.
    fn build_seek_table(&mut self) -> Result<(), ReaderError>;

    /// Positions every stream at `frame`.
    fn set_video_position(&mut self, frame: usize) -> Result<(), ReaderError>;

    /// The images of all streams at the current position, in stream order.
    fn images(&mut self) -> Result<Vec<DynamicImage>, ReaderError>;
}

/// Stereo source over a VRMS recording: stream 0 is left, stream 1 is right.
pub struct VrmsSource<R> {
    reader: R,
}

impl<R: MultiplexedReader> VrmsSource<R> {
    pub fn new(path: impl AsRef<Path>, mut reader: R) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        reader
            .build_seek_table()
            .map_err(|e| SourceError::OpenFailed {
                kind: InputKind::Vrms,
                path: path.clone(),
                reason: e.to_string(),
            })?;
        info!("built seek table for {}", path.display());
        Ok(Self { reader })
    }
}

impl<R: MultiplexedReader> FrameSource for VrmsSource<R> {
    fn get_frame(&mut self, index: usize) -> Result<ImagePair, SourceError> {
        self.reader
            .set_video_position(index)
            .map_err(|e| SourceError::EndOfSequence {
                frame: index,
                reason: e.to_string(),
            })?;
        let images = self
            .reader
            .images()
            .map_err(|source| SourceError::ReadFailed {
                frame: index,
                source,
            })?;
        let count = images.len();
        let mut streams = images.into_iter();
        match (streams.next(), streams.next()) {
            (Some(left), Some(right)) => Ok(ImagePair::new(left, right)),
            _ => Err(SourceError::ReadFailed {
                frame: index,
                source: format!("expected 2 image streams, got {}", count).into(),
            }),
        }
    }
}
