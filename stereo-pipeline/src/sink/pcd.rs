use crate::matrix::PointSet;
use image::DynamicImage;
use std::io::{self, Write};

/// Writes an organized ASCII PCD v0.7 cloud with one point per pixel.
///
/// The colour of each point is sampled from `color` at the same pixel and
/// packed as `0x00RRGGBB`. Points without a reprojection are written as `nan`.
pub fn write_pcd<W: Write>(writer: &mut W, points: &PointSet, color: &DynamicImage) -> io::Result<()> {
    let color = color.to_rgb8();
    let (rows, cols) = (points.rows(), points.cols());
    writeln!(writer, "# .PCD v0.7 - Point Cloud Data file format")?;
    writeln!(writer, "VERSION 0.7")?;
    writeln!(writer, "FIELDS x y z rgb")?;
    writeln!(writer, "SIZE 4 4 4 4")?;
    writeln!(writer, "TYPE F F F U")?;
    writeln!(writer, "COUNT 1 1 1 1")?;
    writeln!(writer, "WIDTH {}", cols)?;
    writeln!(writer, "HEIGHT {}", rows)?;
    writeln!(writer, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(writer, "POINTS {}", rows * cols)?;
    writeln!(writer, "DATA ascii")?;
    for row in 0..rows {
        for col in 0..cols {
            let [r, g, b] = color.get_pixel(col as u32, row as u32).0;
            let rgb = u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b);
            let [x, y, z] = points.point(row, col);
            if x.is_finite() && y.is_finite() && z.is_finite() {
                writeln!(writer, "{} {} {} {}", x, y, z, rgb)?;
            } else {
                writeln!(writer, "nan nan nan {}", rgb)?;
            }
        }
    }
    Ok(())
}
