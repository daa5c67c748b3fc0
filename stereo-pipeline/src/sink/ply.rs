use crate::matrix::PointSet;
use image::DynamicImage;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use std::io::{self, Write};

/// Writes the finite points of `points` as an ASCII PLY vertex list coloured from `color`.
pub fn write_ply<W: Write>(writer: &mut W, points: &PointSet, color: &DynamicImage) -> io::Result<()> {
    let color = color.to_rgb8();

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Exported by stereo-pipeline".to_string());

    // `count` is filled in by the writer.
    let mut vertex = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        let p = PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float));
        vertex.properties.add(p);
    }
    for name in ["red", "green", "blue"] {
        let p = PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::UChar));
        vertex.properties.add(p);
    }
    ply.header.elements.add(vertex);

    let mut vertices = vec![];
    for row in 0..points.rows() {
        for col in 0..points.cols() {
            let [x, y, z] = points.point(row, col);
            if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                continue;
            }
            let [r, g, b] = color.get_pixel(col as u32, row as u32).0;
            let mut point = DefaultElement::new();
            point.insert("x".to_string(), Property::Float(x));
            point.insert("y".to_string(), Property::Float(y));
            point.insert("z".to_string(), Property::Float(z));
            point.insert("red".to_string(), Property::UChar(r));
            point.insert("green".to_string(), Property::UChar(g));
            point.insert("blue".to_string(), Property::UChar(b));
            vertices.push(point);
        }
    }
    ply.payload.insert("vertex".to_string(), vertices);

    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use ndarray::Array3;

    #[test]
    fn only_finite_points() {
        let mut coords = Array3::from_elem((2, 2, 3), f32::NAN);
        coords[[1, 0, 0]] = 0.5;
        coords[[1, 0, 1]] = 1.0;
        coords[[1, 0, 2]] = 4.0;
        let color = GrayImage::from_fn(2, 2, |x, y| Luma([(10 * y + x) as u8]));

        let mut out = vec![];
        write_ply(&mut out, &PointSet(coords), &DynamicImage::ImageLuma8(color)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("ply"));
        assert!(text.contains("format ascii 1.0"));
        assert!(text.contains("element vertex 1"));
        let last: Vec<f32> = text
            .lines()
            .last()
            .unwrap()
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(last, [0.5, 1.0, 4.0, 10.0, 10.0, 10.0]);
    }
}
