use super::{Rectifier, StereoCalibration};
use crate::error::ConfigError;
use crate::pair::ImagePair;
use image::{DynamicImage, Luma, Rgb, Rgba};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use nalgebra::Matrix3;

/// Warps each side with its rectifying homography using bilinear interpolation.
///
/// Pixels that map from outside the raw image are black.
pub struct HomographyRectifier {
    left: Projection,
    right: Projection,
}

impl HomographyRectifier {
    pub fn new(left: Matrix3<f64>, right: Matrix3<f64>) -> Result<Self, ConfigError> {
        Ok(Self {
            left: projection(&left, "left")?,
            right: projection(&right, "right")?,
        })
    }

    pub fn from_calibration(calibration: &StereoCalibration) -> Result<Self, ConfigError> {
        Self::new(calibration.left.homography(), calibration.right.homography())
    }
}

fn projection(homography: &Matrix3<f64>, side: &str) -> Result<Projection, ConfigError> {
    let invalid = || ConfigError::InvalidCalibration(format!("{} rectification is singular", side));
    if homography.try_inverse().is_none() {
        return Err(invalid());
    }
    let mut row_major = [0f32; 9];
    for (ix, value) in row_major.iter_mut().enumerate() {
        *value = homography[(ix / 3, ix % 3)] as f32;
    }
    Projection::from_matrix(row_major).ok_or_else(invalid)
}

fn rectify_image(image: &DynamicImage, projection: &Projection) -> DynamicImage {
    let interpolation = Interpolation::Bilinear;
    match image {
        DynamicImage::ImageLuma8(buffer) => {
            DynamicImage::ImageLuma8(warp(buffer, projection, interpolation, Luma([0])))
        }
        DynamicImage::ImageRgba8(buffer) => {
            DynamicImage::ImageRgba8(warp(buffer, projection, interpolation, Rgba([0, 0, 0, 0])))
        }
        other => DynamicImage::ImageRgb8(warp(
            &other.to_rgb8(),
            projection,
            interpolation,
            Rgb([0, 0, 0]),
        )),
    }
}

impl Rectifier for HomographyRectifier {
    fn rectify(&self, pair: &ImagePair) -> ImagePair {
        ImagePair::new(
            rectify_image(&pair.left, &self.left),
            rectify_image(&pair.right, &self.right),
        )
    }
}
