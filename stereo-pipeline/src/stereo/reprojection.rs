use super::{Reprojector, StereoCalibration};
use crate::matrix::{NumericMatrix, PointSet};
use nalgebra::{Matrix4, Vector4};
use ndarray::Array3;

/// Reprojects with a 4x4 disparity-to-depth matrix:
/// `[X Y Z W] = Q [x y d 1]`, point `(X/W, Y/W, Z/W)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QReprojector {
    pub q: Matrix4<f64>,
}

impl QReprojector {
    pub fn new(q: Matrix4<f64>) -> Self {
        Self { q }
    }

    pub fn from_calibration(calibration: &StereoCalibration) -> Self {
        Self::new(calibration.reprojection_matrix())
    }
}

impl Reprojector for QReprojector {
    fn reproject(&self, disparity: &NumericMatrix) -> PointSet {
        let (rows, cols) = (disparity.rows(), disparity.cols());
        let mut points = Array3::from_elem((rows, cols, 3), f32::NAN);
        if disparity.channels() == 0 {
            return PointSet(points);
        }
        for y in 0..rows {
            for x in 0..cols {
                let d = disparity.data()[[y, x, 0]];
                // Also rejects NaN.
                if !(d > 0.0) {
                    continue;
                }
                let v = self.q * Vector4::new(x as f64, y as f64, f64::from(d), 1.0);
                if v.w == 0.0 {
                    continue;
                }
                points[[y, x, 0]] = (v.x / v.w) as f32;
                points[[y, x, 1]] = (v.y / v.w) as f32;
                points[[y, x, 2]] = (v.z / v.w) as f32;
            }
        }
        PointSet(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Depth;
    use approx::assert_relative_eq;

    #[test]
    fn depth_from_disparity() {
        let calibration = StereoCalibration::rectified(500.0, 2.0, 1.0, 0.1);
        let reprojector = QReprojector::from_calibration(&calibration);
        let data = Array3::from_shape_vec((2, 3, 1), vec![10.0, 0.0, -1.0, 25.0, f32::NAN, 5.0])
            .unwrap();
        let points = reprojector.reproject(&NumericMatrix::new(data, Depth::F32));

        let [x, y, z] = points.point(0, 0);
        assert_relative_eq!(z, 5.0, epsilon = 1e-5);
        assert_relative_eq!(x, -2.0 * 5.0 / 500.0, epsilon = 1e-6);
        assert_relative_eq!(y, -1.0 * 5.0 / 500.0, epsilon = 1e-6);
        assert_relative_eq!(points.point(1, 0)[2], 2.0, epsilon = 1e-5);
        assert_relative_eq!(points.point(1, 2)[2], 10.0, epsilon = 1e-5);

        for (row, col) in [(0, 1), (0, 2), (1, 1)] {
            assert!(points.point(row, col).iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn zero_w_is_invalid() {
        let reprojector = QReprojector::new(Matrix4::zeros());
        let points = reprojector.reproject(&NumericMatrix::new(
            Array3::from_elem((1, 1, 1), 3.0),
            Depth::F32,
        ));
        assert!(points.point(0, 0)[0].is_nan());
    }
}
