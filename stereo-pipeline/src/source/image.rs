use super::{FrameSource, SourceError};
use crate::pair::{ImagePair, Side};
use crate::template::{StringTemplate, Variables};
use image::DynamicImage;
use log::*;
use std::path::PathBuf;

/// Reads each side of each frame from its own still image.
///
/// The file name comes from rendering the template with `f` set to the frame
/// index and `s` set to `L` or `R`.
#[derive(Debug, Clone)]
pub struct ImageSource {
    template: StringTemplate,
}

impl ImageSource {
    pub fn new(template: impl Into<StringTemplate>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The file that holds `side` of frame `index`.
    pub fn path_for(&self, index: usize, side: Side) -> PathBuf {
        let mut vars = Variables::new();
        vars.insert("f".to_owned(), index.into());
        vars.insert("s".to_owned(), side.marker().into());
        PathBuf::from(self.template.render(&vars))
    }

    fn load(&self, index: usize, side: Side) -> Result<DynamicImage, SourceError> {
        let path = self.path_for(index, side);
        debug!("reading {}", path.display());
        image::open(&path).map_err(|source| SourceError::DecodeFailed { path, source })
    }
}

impl FrameSource for ImageSource {
    fn get_frame(&mut self, index: usize) -> Result<ImagePair, SourceError> {
        Ok(ImagePair::new(
            self.load(index, Side::Left)?,
            self.load(index, Side::Right)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn renders_side_and_frame() {
        let source = ImageSource::new("seq/%{f|04d}_%{s}.png");
        assert_eq!(source.path_for(7, Side::Right), PathBuf::from("seq/0007_R.png"));
    }

    #[test]
    fn loads_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        for (side, value) in [("L", 10), ("R", 20)] {
            RgbImage::from_pixel(4, 2, Rgb([value, 0, 0]))
                .save(dir.path().join(format!("3_{}.png", side)))
                .unwrap();
        }
        let template = format!("{}/%{{f}}_%{{s}}.png", dir.path().display());
        let pair = ImageSource::new(template.as_str()).get_frame(3).unwrap();
        assert_eq!(pair.left.to_rgb8().get_pixel(0, 0)[0], 10);
        assert_eq!(pair.right.to_rgb8().get_pixel(3, 1)[0], 20);
    }

    #[test]
    fn missing_file_is_not_end_of_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let template = format!("{}/%{{f}}_%{{s}}.png", dir.path().display());
        let err = ImageSource::new(template.as_str()).get_frame(0).unwrap_err();
        assert!(matches!(err, SourceError::DecodeFailed { .. }));
        assert!(!err.is_end_of_sequence());
    }
}
