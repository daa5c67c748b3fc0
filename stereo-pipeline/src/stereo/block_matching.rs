use super::{Disparity, StereoMatcher};
use crate::error::ConfigError;
use crate::matrix::{Depth, NumericMatrix};
use crate::pair::ImagePair;
use image::GrayImage;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Disparity value of pixels without a match.
pub const INVALID_DISPARITY: f32 = -1.0;

/// Sum-of-absolute-differences block matching on grayscale images.
///
/// For every left pixel the `block_size` square window is compared with the
/// window shifted left by each candidate disparity in the right image. Pixels
/// whose window does not fit for any candidate get [`INVALID_DISPARITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMatching {
    /// Number of disparity values searched.
    #[serde(default = "default_num_disparities")]
    pub num_disparities: usize,
    /// Side of the square matching window. Must be odd.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Smallest disparity searched.
    #[serde(default)]
    pub min_disparity: usize,
}

fn default_num_disparities() -> usize {
    64
}

fn default_block_size() -> usize {
    9
}

impl Default for BlockMatching {
    fn default() -> Self {
        Self {
            num_disparities: default_num_disparities(),
            block_size: default_block_size(),
            min_disparity: 0,
        }
    }
}

impl BlockMatching {
    pub fn validate(&self) -> Result<(), String> {
        if self.num_disparities == 0 {
            return Err("num_disparities must be positive".to_owned());
        }
        if self.block_size % 2 == 0 {
            return Err(format!("block_size must be odd, got {}", self.block_size));
        }
        if self.search_end().is_none() {
            return Err(format!(
                "disparity search {} + {} with block_size {} is out of range",
                self.min_disparity, self.num_disparities, self.block_size
            ));
        }
        Ok(())
    }

    /// One past the largest disparity searched, if the widest window
    /// (`block_size - 1` plus the disparity) stays representable.
    fn search_end(&self) -> Option<usize> {
        let end = self.min_disparity.checked_add(self.num_disparities)?;
        (self.block_size / 2).checked_mul(2)?.checked_add(end)?;
        Some(end)
    }

    pub(crate) fn from_parameters(parameters: serde_json::Value) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidMethodParameters {
            method: "block_matching".to_owned(),
            reason,
        };
        let matcher: Self = serde_json::from_value(parameters).map_err(|e| invalid(e.to_string()))?;
        matcher.validate().map_err(invalid)?;
        Ok(matcher)
    }

    /// Computes the disparity of every left pixel.
    pub fn match_images(&self, left: &GrayImage, right: &GrayImage) -> NumericMatrix {
        let (width, height) = left.dimensions();
        let (width, height) = (width as usize, height as usize);
        let mut disparity = Array3::from_elem((height, width, 1), INVALID_DISPARITY);
        let half = self.block_size / 2;
        let end = match self.search_end() {
            Some(end) if right.dimensions() == left.dimensions() && height >= self.block_size => end,
            _ => return NumericMatrix::new(disparity, Depth::F32),
        };

        let mut best = vec![u64::MAX; width * height];
        let mut integral = vec![0u64; (width + 1) * (height + 1)];
        let stride = width + 1;
        for d in self.min_disparity..end {
            // The leftmost window must still reach `d` columns into the right image.
            let first_x = half + d;
            if first_x + half >= width {
                break;
            }
            for y in 0..height {
                let mut row_sum = 0u64;
                for x in 0..width {
                    if x >= d {
                        let a = left.get_pixel(x as u32, y as u32)[0];
                        let b = right.get_pixel((x - d) as u32, y as u32)[0];
                        row_sum += u64::from(a.abs_diff(b));
                    }
                    integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
                }
            }
            for y in half..height - half {
                let (top, bottom) = (y - half, y + half + 1);
                for x in first_x..width - half {
                    let (l, r) = (x - half, x + half + 1);
                    let cost = integral[bottom * stride + r] + integral[top * stride + l]
                        - integral[top * stride + r]
                        - integral[bottom * stride + l];
                    let slot = &mut best[y * width + x];
                    if cost < *slot {
                        *slot = cost;
                        disparity[[y, x, 0]] = d as f32;
                    }
                }
            }
        }
        NumericMatrix::new(disparity, Depth::F32)
    }
}

impl StereoMatcher for BlockMatching {
    fn compute_disparity(&self, pair: &ImagePair) -> Disparity {
        Disparity {
            map: self.match_images(&pair.left.to_luma8(), &pair.right.to_luma8()),
            levels: self.num_disparities,
        }
    }
}
