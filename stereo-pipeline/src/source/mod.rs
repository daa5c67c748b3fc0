//! Stereo frame sources.
//!
//! Every source hands out a complete [`ImagePair`] for a frame index. The three
//! variants differ in how they reach a frame:
//!
//! * [`ImageSource`] decodes one still image per side from a file name template;
//! * [`VideoSource`] walks a side-by-side video forward and only seeks backwards;
//! * [`VrmsSource`] uses the seek table of a multiplexed VRMS recording.

mod ffmpeg;
mod image;
mod video;
mod vrms;

pub use self::ffmpeg::FfmpegCapture;
pub use self::image::ImageSource;
pub use self::video::{CaptureError, VideoCapture, VideoSource};
pub use self::vrms::{MultiplexedReader, ReaderError, VrmsSource};

use crate::error::ConfigError;
use crate::pair::ImagePair;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// An image of an image sequence could not be decoded. Always fatal.
    #[error("failed to open image '{path}': {source}")]
    DecodeFailed {
        path: PathBuf,
        source: ::image::ImageError,
    },
    /// The source has no frame at this index. Ends an unbounded range gracefully.
    #[error("no frame {frame} in source: {reason}")]
    EndOfSequence { frame: usize, reason: String },
    #[error("failed to open {kind} source '{path}': {reason}")]
    OpenFailed {
        kind: InputKind,
        path: PathBuf,
        reason: String,
    },
    #[error("failed to read frame {frame}: {source}")]
    ReadFailed { frame: usize, source: ReaderError },
}

impl SourceError {
    pub fn is_end_of_sequence(&self) -> bool {
        matches!(self, SourceError::EndOfSequence { .. })
    }
}

/// Anything that can provide stereo pairs by frame index.
pub trait FrameSource {
    fn get_frame(&mut self, index: usize) -> Result<ImagePair, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn get_frame(&mut self, index: usize) -> Result<ImagePair, SourceError> {
        (**self).get_frame(index)
    }
}

/// The kind of media an input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Image,
    Video,
    Vrms,
}

impl InputKind {
    /// Guesses the kind from the file suffix of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let suffix = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match suffix {
            "jpeg" | "jpg" | "png" | "ppm" | "bmp" => Ok(InputKind::Image),
            "vrms" => Ok(InputKind::Vrms),
            "avi" | "mp4" | "mkv" | "mpg" => Ok(InputKind::Video),
            _ => Err(ConfigError::UnrecognizedSuffix(suffix.to_owned())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InputKind::Image => "image",
            InputKind::Video => "video",
            InputKind::Vrms => "vrms",
        }
    }
}

impl FromStr for InputKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "image" => Ok(InputKind::Image),
            "video" => Ok(InputKind::Video),
            "vrms" => Ok(InputKind::Vrms),
            _ => Err(ConfigError::InvalidInputType(s.to_owned())),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opens the source for `input`.
///
/// For image sequences `input` is a file name template such as
/// `left_right/%{f|04d}_%{s}.png`; for the other kinds it is a file path.
pub fn open_source(kind: InputKind, input: &str) -> crate::Result<Box<dyn FrameSource>> {
    match kind {
        InputKind::Image => Ok(Box::new(ImageSource::new(input))),
        InputKind::Video => {
            let capture = FfmpegCapture::open(input).map_err(|e| SourceError::OpenFailed {
                kind,
                path: input.into(),
                reason: e.to_string(),
            })?;
            Ok(Box::new(VideoSource::new(capture)))
        }
        // No reader for the proprietary container is built into this crate.
        InputKind::Vrms => Err(ConfigError::VrmsUnavailable.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_suffix() {
        assert_eq!(InputKind::from_path("a/%{f}_%{s}.png").unwrap(), InputKind::Image);
        assert_eq!(InputKind::from_path("rec.vrms").unwrap(), InputKind::Vrms);
        assert_eq!(InputKind::from_path("clip.mkv").unwrap(), InputKind::Video);
        assert!(matches!(
            InputKind::from_path("clip.MKV"),
            Err(ConfigError::UnrecognizedSuffix(s)) if s == "MKV"
        ));
        assert!(matches!(
            InputKind::from_path("noext"),
            Err(ConfigError::UnrecognizedSuffix(s)) if s.is_empty()
        ));
    }

    #[test]
    fn kind_from_name() {
        assert_eq!("video".parse::<InputKind>().unwrap(), InputKind::Video);
        assert!(matches!(
            "movie".parse::<InputKind>(),
            Err(ConfigError::InvalidInputType(_))
        ));
    }

    #[test]
    fn vrms_is_unavailable() {
        assert!(matches!(
            open_source(InputKind::Vrms, "rec.vrms"),
            Err(crate::Error::Config(ConfigError::VrmsUnavailable))
        ));
    }
}
