use image::{DynamicImage, GenericImageView};

/// Which half of a stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first. Per-side outputs are always written in this order.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// The value of the `s` template variable for this side.
    pub fn marker(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// A left/right image pair belonging to one frame index.
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub left: DynamicImage,
    pub right: DynamicImage,
}

impl ImagePair {
    pub fn new(left: DynamicImage, right: DynamicImage) -> Self {
        Self { left, right }
    }

    /// Splits a side-by-side frame at its horizontal midpoint.
    ///
    /// Both halves get `width / 2` columns; with an odd width the last column is dropped.
    pub fn split_side_by_side(frame: &DynamicImage) -> Self {
        let (width, height) = frame.dimensions();
        let half = width / 2;
        Self {
            left: frame.crop_imm(0, 0, half, height),
            right: frame.crop_imm(half, 0, half, height),
        }
    }

    pub fn side(&self, side: Side) -> &DynamicImage {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Dimensions of the left image.
    pub fn dimensions(&self) -> (u32, u32) {
        self.left.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn split_at_midpoint() {
        let frame = RgbImage::from_fn(7, 2, |x, _| Rgb([x as u8, 0, 0]));
        let pair = ImagePair::split_side_by_side(&DynamicImage::ImageRgb8(frame));
        assert_eq!(pair.left.dimensions(), (3, 2));
        assert_eq!(pair.right.dimensions(), (3, 2));
        assert_eq!(pair.left.to_rgb8().get_pixel(0, 1)[0], 0);
        assert_eq!(pair.right.to_rgb8().get_pixel(0, 1)[0], 3);
        assert_eq!(pair.right.to_rgb8().get_pixel(2, 0)[0], 5);
    }

    #[test]
    fn side_markers() {
        assert_eq!(Side::BOTH.map(Side::marker), ["L", "R"]);
    }
}
