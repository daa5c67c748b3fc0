use derive_more::{AsRef, Deref, From, Into};
use image::{
    DynamicImage, GenericImageView, ImageBuffer, Luma, LumaA, Pixel, Primitive, Rgb, Rgba,
};
use ndarray::Array3;

/// Element type of a [`NumericMatrix`].
///
/// Values are always held as `f32`, which represents every `U8` and `U16` value exactly.
/// The depth records what the data means and how serializers lay it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    U16,
    F32,
}

impl Depth {
    /// The OpenCV depth code (`CV_8U`, `CV_16U`, `CV_32F`).
    pub fn opencv_code(self) -> i32 {
        match self {
            Depth::U8 => 0,
            Depth::U16 => 2,
            Depth::F32 => 5,
        }
    }

    pub fn from_opencv_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Depth::U8),
            2 => Some(Depth::U16),
            5 => Some(Depth::F32),
            _ => None,
        }
    }

    /// The type character OpenCV file storage uses in `dt`.
    pub fn storage_tag(self) -> char {
        match self {
            Depth::U8 => 'u',
            Depth::U16 => 'w',
            Depth::F32 => 'f',
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            Depth::U8 => 1,
            Depth::U16 => 2,
            Depth::F32 => 4,
        }
    }
}

/// A dense `rows x cols x channels` matrix, such as a disparity map.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    data: Array3<f32>,
    depth: Depth,
}

impl NumericMatrix {
    pub fn new(data: Array3<f32>, depth: Depth) -> Self {
        Self { data, depth }
    }

    pub fn zeros(rows: usize, cols: usize, channels: usize, depth: Depth) -> Self {
        Self::new(Array3::zeros((rows, cols, channels)), depth)
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Converts an image without loss; 8-bit, 16-bit and float pixels keep their depth.
    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(buffer) => from_buffer(buffer, Depth::U8),
            DynamicImage::ImageLumaA8(buffer) => from_buffer(buffer, Depth::U8),
            DynamicImage::ImageRgb8(buffer) => from_buffer(buffer, Depth::U8),
            DynamicImage::ImageRgba8(buffer) => from_buffer(buffer, Depth::U8),
            DynamicImage::ImageLuma16(buffer) => from_buffer(buffer, Depth::U16),
            DynamicImage::ImageLumaA16(buffer) => from_buffer(buffer, Depth::U16),
            DynamicImage::ImageRgb16(buffer) => from_buffer(buffer, Depth::U16),
            DynamicImage::ImageRgba16(buffer) => from_buffer(buffer, Depth::U16),
            DynamicImage::ImageRgb32F(buffer) => from_buffer(buffer, Depth::F32),
            DynamicImage::ImageRgba32F(buffer) => from_buffer(buffer, Depth::F32),
            other => from_buffer(&other.to_rgba32f(), Depth::F32),
        }
    }

    /// Converts to a displayable image.
    ///
    /// `U16` data keeps 16 bits; `F32` data saturates to 8 bits. Returns `None`
    /// when the channel count has no image equivalent.
    pub fn to_image(&self) -> Option<DynamicImage> {
        let (rows, cols, channels) = self.data.dim();
        let (width, height) = (cols as u32, rows as u32);
        match self.depth {
            Depth::U16 => {
                let raw: Vec<u16> = self
                    .data
                    .iter()
                    .map(|&v| v.round().clamp(0.0, 65535.0) as u16)
                    .collect();
                match channels {
                    1 => to_dynamic::<Luma<u16>>(width, height, raw, DynamicImage::ImageLuma16),
                    2 => to_dynamic::<LumaA<u16>>(width, height, raw, DynamicImage::ImageLumaA16),
                    3 => to_dynamic::<Rgb<u16>>(width, height, raw, DynamicImage::ImageRgb16),
                    4 => to_dynamic::<Rgba<u16>>(width, height, raw, DynamicImage::ImageRgba16),
                    _ => None,
                }
            }
            Depth::U8 | Depth::F32 => {
                let raw: Vec<u8> = self
                    .data
                    .iter()
                    .map(|&v| v.round().clamp(0.0, 255.0) as u8)
                    .collect();
                match channels {
                    1 => to_dynamic::<Luma<u8>>(width, height, raw, DynamicImage::ImageLuma8),
                    2 => to_dynamic::<LumaA<u8>>(width, height, raw, DynamicImage::ImageLumaA8),
                    3 => to_dynamic::<Rgb<u8>>(width, height, raw, DynamicImage::ImageRgb8),
                    4 => to_dynamic::<Rgba<u8>>(width, height, raw, DynamicImage::ImageRgba8),
                    _ => None,
                }
            }
        }
    }
}

fn from_buffer<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>, depth: Depth) -> NumericMatrix
where
    P: Pixel,
    P::Subpixel: Into<f32>,
{
    let (width, height) = buffer.dimensions();
    let data: Vec<f32> = buffer.as_raw().iter().map(|&v| v.into()).collect();
    let shape = (height as usize, width as usize, usize::from(P::CHANNEL_COUNT));
    // An ImageBuffer always holds exactly width * height * channels samples.
    let data = Array3::from_shape_vec(shape, data).unwrap_or_else(|_| Array3::zeros(shape));
    NumericMatrix::new(data, depth)
}

fn to_dynamic<P>(
    width: u32,
    height: u32,
    raw: Vec<P::Subpixel>,
    wrap: fn(ImageBuffer<P, Vec<P::Subpixel>>) -> DynamicImage,
) -> Option<DynamicImage>
where
    P: Pixel,
    P::Subpixel: Primitive,
{
    ImageBuffer::from_raw(width, height, raw).map(wrap)
}

/// Per-pixel 3-D coordinates, `rows x cols x 3`.
///
/// Pixels without a valid reprojection hold `NaN` in every coordinate.
#[derive(Debug, Clone, PartialEq, AsRef, Deref, From, Into)]
pub struct PointSet(pub Array3<f32>);

impl PointSet {
    pub fn rows(&self) -> usize {
        self.0.dim().0
    }

    pub fn cols(&self) -> usize {
        self.0.dim().1
    }

    pub fn point(&self, row: usize, col: usize) -> [f32; 3] {
        [
            self.0[[row, col, 0]],
            self.0[[row, col, 1]],
            self.0[[row, col, 2]],
        ]
    }

    /// Whether `image` has the same pixel grid as this point set.
    pub fn matches_image(&self, image: &DynamicImage) -> bool {
        image.dimensions() == (self.cols() as u32, self.rows() as u32)
    }

    /// Views the coordinates as a three-channel float matrix.
    pub fn to_matrix(&self) -> NumericMatrix {
        NumericMatrix::new(self.0.clone(), Depth::F32)
    }
}
