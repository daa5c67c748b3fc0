use crate::error::ConfigError;
use log::*;
use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Rectification of one camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraRectification {
    /// Row-major homography from raw to rectified pixel coordinates.
    pub rectification: [f64; 9],
}

impl CameraRectification {
    pub fn homography(&self) -> Matrix3<f64> {
        Matrix3::from_row_slice(&self.rectification)
    }
}

/// A stereo calibration as stored in a JSON calibration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StereoCalibration {
    pub left: CameraRectification,
    pub right: CameraRectification,
    /// Row-major 4x4 disparity-to-depth matrix `Q`.
    pub reprojection: [f64; 16],
}

impl StereoCalibration {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            what: "calibration",
            path: path.to_path_buf(),
            source,
        })?;
        let calibration: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            what: "calibration",
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded stereo calibration from {}", path.display());
        Ok(calibration)
    }

    pub fn reprojection_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_row_slice(&self.reprojection)
    }

    /// Calibration of an already rectified rig with focal length `f`, principal
    /// point `(cx, cy)` and baseline `baseline`.
    pub fn rectified(f: f64, cx: f64, cy: f64, baseline: f64) -> Self {
        let identity = CameraRectification {
            rectification: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        #[rustfmt::skip]
        let reprojection = [
            1.0, 0.0, 0.0, -cx,
            0.0, 1.0, 0.0, -cy,
            0.0, 0.0, 0.0, f,
            0.0, 0.0, 1.0 / baseline, 0.0,
        ];
        Self {
            left: identity.clone(),
            right: identity,
            reprojection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "left": {{ "rectification": [1, 0, 2, 0, 1, 0, 0, 0, 1] }},
                "right": {{ "rectification": [1, 0, -2, 0, 1, 0, 0, 0, 1] }},
                "reprojection": [1, 0, 0, -320, 0, 1, 0, -240, 0, 0, 0, 500, 0, 0, 10, 0]
            }}"#
        )
        .unwrap();
        let calibration = StereoCalibration::load(file.path()).unwrap();
        assert_eq!(calibration.left.homography()[(0, 2)], 2.0);
        assert_eq!(calibration.reprojection_matrix()[(2, 3)], 500.0);
        assert_eq!(calibration.reprojection_matrix()[(3, 2)], 10.0);
    }

    #[test]
    fn missing_and_malformed() {
        assert!(matches!(
            StereoCalibration::load("/nonexistent/calibration.json"),
            Err(ConfigError::Read { .. })
        ));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "left": {{ "rectification": [1, 0] }} }}"#).unwrap();
        assert!(matches!(
            StereoCalibration::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
