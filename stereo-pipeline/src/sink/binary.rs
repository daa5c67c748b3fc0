//! Raw little-endian matrix dumps.
//!
//! Layout: `rows`, `cols` and the OpenCV type code as `i32` each, followed by
//! `rows * cols * channels` elements in row-major, channel-interleaved order.
//! The type code is `depth + ((channels - 1) << 3)`.

use crate::matrix::{Depth, NumericMatrix};
use ndarray::Array3;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

const MAX_CHANNELS: usize = 512;

pub fn encode_matrix<W: Write>(writer: &mut W, matrix: &NumericMatrix) -> io::Result<()> {
    let channels = matrix.channels();
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(invalid_data(format!("cannot encode {} channels", channels)));
    }
    let type_code = matrix.depth().opencv_code() + (((channels - 1) as i32) << 3);
    for header in [to_i32(matrix.rows())?, to_i32(matrix.cols())?, type_code] {
        writer.write_all(&header.to_le_bytes())?;
    }
    for &value in matrix.data().iter() {
        match matrix.depth() {
            Depth::U8 => writer.write_all(&[value.round().clamp(0.0, 255.0) as u8])?,
            Depth::U16 => {
                writer.write_all(&(value.round().clamp(0.0, 65535.0) as u16).to_le_bytes())?
            }
            Depth::F32 => writer.write_all(&value.to_le_bytes())?,
        }
    }
    Ok(())
}

pub fn decode_matrix<R: Read>(reader: &mut R) -> io::Result<NumericMatrix> {
    let rows = read_i32(reader)?;
    let cols = read_i32(reader)?;
    let type_code = read_i32(reader)?;
    if rows < 0 || cols < 0 || type_code < 0 {
        return Err(invalid_data(format!(
            "bad matrix header {}x{} type {}",
            rows, cols, type_code
        )));
    }
    let depth = Depth::from_opencv_code(type_code & 7)
        .ok_or_else(|| invalid_data(format!("unsupported element type {}", type_code & 7)))?;
    let channels = (type_code >> 3) as usize + 1;
    let (rows, cols) = (rows as usize, cols as usize);
    let byte_len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(channels))
        .and_then(|n| n.checked_mul(depth.byte_size()))
        .ok_or_else(|| invalid_data(format!("matrix {}x{}x{} is too large", rows, cols, channels)))?;

    let mut raw = vec![];
    reader.by_ref().take(byte_len as u64).read_to_end(&mut raw)?;
    if raw.len() != byte_len {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {} payload bytes, found {}", byte_len, raw.len()),
        ));
    }
    let values: Vec<f32> = match depth {
        Depth::U8 => raw.iter().map(|&b| f32::from(b)).collect(),
        Depth::U16 => raw
            .chunks_exact(2)
            .map(|b| f32::from(u16::from_le_bytes([b[0], b[1]])))
            .collect(),
        Depth::F32 => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    };
    let data = Array3::from_shape_vec((rows, cols, channels), values)
        .map_err(|e| invalid_data(e.to_string()))?;
    Ok(NumericMatrix::new(data, depth))
}

/// Writes `matrix` to a new file at `path`.
pub fn write_matrix_bin(path: impl AsRef<Path>, matrix: &NumericMatrix) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_matrix(&mut writer, matrix)?;
    writer.flush()
}

/// Reads a matrix written by [`write_matrix_bin`].
pub fn read_matrix_bin(path: impl AsRef<Path>) -> io::Result<NumericMatrix> {
    decode_matrix(&mut BufReader::new(File::open(path)?))
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut bytes = [0; 4];
    reader.read_exact(&mut bytes)?;
    Ok(i32::from_le_bytes(bytes))
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| invalid_data(format!("dimension {} too large", value)))
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, message)
}
