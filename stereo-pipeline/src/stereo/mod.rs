//! Rectification, matching and reprojection behind narrow traits, with a
//! small reference implementation of each.

mod block_matching;
mod calibration;
mod method;
mod rectification;
mod reprojection;

pub use self::block_matching::{BlockMatching, INVALID_DISPARITY};
pub use self::calibration::{CameraRectification, StereoCalibration};
pub use self::method::{create_stereo_method, load_stereo_method, METHOD_NAMES};
pub use self::rectification::HomographyRectifier;
pub use self::reprojection::QReprojector;

use crate::matrix::{NumericMatrix, PointSet};
use crate::pair::ImagePair;

/// Maps a raw pair onto common epipolar geometry. Same size in and out.
pub trait Rectifier {
    fn rectify(&self, pair: &ImagePair) -> ImagePair;
}

/// Computes a disparity map from a rectified pair.
pub trait StereoMatcher {
    fn compute_disparity(&self, pair: &ImagePair) -> Disparity;
}

/// Turns a disparity map into per-pixel 3-D points.
pub trait Reprojector {
    fn reproject(&self, disparity: &NumericMatrix) -> PointSet;
}

/// Output of a [`StereoMatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct Disparity {
    /// One-channel map in the left image's pixel grid.
    pub map: NumericMatrix,
    /// Number of disparity values the matcher searched.
    pub levels: usize,
}
