//! OpenCV `FileStorage` text layouts for a single named matrix.

use crate::matrix::{Depth, NumericMatrix};
use std::io::{self, Write};

/// Values per line in the `data` block.
const VALUES_PER_LINE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageFlavor {
    Yaml,
    Xml,
}

/// Writes `matrix` as the only entry of an OpenCV file storage document.
pub fn write_storage<W: Write>(
    writer: &mut W,
    flavor: StorageFlavor,
    key: &str,
    matrix: &NumericMatrix,
) -> io::Result<()> {
    let values: Vec<String> = matrix
        .data()
        .iter()
        .map(|&v| format_value(v, matrix.depth()))
        .collect();
    let dt = data_type(matrix);
    match flavor {
        StorageFlavor::Yaml => {
            writeln!(writer, "%YAML:1.0")?;
            writeln!(writer, "---")?;
            writeln!(writer, "{}: !!opencv-matrix", key)?;
            writeln!(writer, "   rows: {}", matrix.rows())?;
            writeln!(writer, "   cols: {}", matrix.cols())?;
            if matrix.channels() == 1 {
                writeln!(writer, "   dt: {}", dt)?;
            } else {
                writeln!(writer, "   dt: \"{}\"", dt)?;
            }
            write!(writer, "   data: [")?;
            for (ix, chunk) in values.chunks(VALUES_PER_LINE).enumerate() {
                if ix > 0 {
                    write!(writer, ",\n       ")?;
                }
                write!(writer, " {}", chunk.join(", "))?;
            }
            writeln!(writer, " ]")?;
        }
        StorageFlavor::Xml => {
            writeln!(writer, "<?xml version=\"1.0\"?>")?;
            writeln!(writer, "<opencv_storage>")?;
            writeln!(writer, "<{} type_id=\"opencv-matrix\">", key)?;
            writeln!(writer, "  <rows>{}</rows>", matrix.rows())?;
            writeln!(writer, "  <cols>{}</cols>", matrix.cols())?;
            writeln!(writer, "  <dt>{}</dt>", dt)?;
            write!(writer, "  <data>")?;
            for chunk in values.chunks(VALUES_PER_LINE) {
                write!(writer, "\n    {}", chunk.join(" "))?;
            }
            writeln!(writer, "</data></{}>", key)?;
            writeln!(writer, "</opencv_storage>")?;
        }
    }
    Ok(())
}

/// `dt` entry: the element tag, prefixed by the channel count when above one.
fn data_type(matrix: &NumericMatrix) -> String {
    let tag = matrix.depth().storage_tag();
    match matrix.channels() {
        1 => tag.to_string(),
        n => format!("{}{}", n, tag),
    }
}

fn format_value(value: f32, depth: Depth) -> String {
    match depth {
        Depth::U8 | Depth::U16 => format!("{}", value as i64),
        Depth::F32 => format_float(value),
    }
}

fn format_float(value: f32) -> String {
    if value.is_nan() {
        ".Nan".to_owned()
    } else if value == f32::INFINITY {
        ".Inf".to_owned()
    } else if value == f32::NEG_INFINITY {
        "-.Inf".to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{}.", value as i64)
    } else {
        let text = format!("{:.8e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or_default();
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => text,
        }
    }
}
