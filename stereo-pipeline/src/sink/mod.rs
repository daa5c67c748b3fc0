//! Output dispatch.
//!
//! An [`OutputSpec`] pairs a path template with the pipeline stage it belongs
//! to. [`OutputSink::write`] renders the path, makes sure its directory exists
//! and picks a serializer from the file extension:
//!
//! | extension            | written as                                  |
//! |----------------------|---------------------------------------------|
//! | `yml`, `yaml`, `xml` | OpenCV file storage matrix under a stage key |
//! | `bin`                | raw matrix dump, see [`write_matrix_bin`]    |
//! | `pcd`, `ply`         | coloured point cloud (points stage only)     |
//! | anything else        | image, encoder chosen by the extension       |

mod binary;
mod pcd;
mod ply;
mod storage;

pub use self::binary::{decode_matrix, encode_matrix, read_matrix_bin, write_matrix_bin};
pub use self::pcd::write_pcd;
pub use self::ply::write_ply;
pub use self::storage::{write_storage, StorageFlavor};

use crate::matrix::{NumericMatrix, PointSet};
use crate::template::{StringTemplate, Variables};
use image::{DynamicImage, GenericImageView, ImageFormat};
use log::*;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The pipeline stage an output belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Frames,
    Rectified,
    Disparity,
    Points,
}

impl Stage {
    /// Top-level key used by the structured matrix formats.
    pub fn storage_key(self) -> &'static str {
        match self {
            Stage::Frames => "frame",
            Stage::Rectified => "rectified",
            Stage::Disparity => "disparity",
            Stage::Points => "points",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Frames => "frames",
            Stage::Rectified => "rectified",
            Stage::Disparity => "disparity",
            Stage::Points => "points",
        })
    }
}

/// Something produced by the pipeline that can be written out.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    Image(&'a DynamicImage),
    Matrix(&'a NumericMatrix),
    Points(&'a PointSet),
}

impl<'a> Artifact<'a> {
    fn to_matrix(self) -> NumericMatrix {
        match self {
            Artifact::Image(image) => NumericMatrix::from_image(image),
            Artifact::Matrix(matrix) => matrix.clone(),
            Artifact::Points(points) => points.to_matrix(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Unrepresentable(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write point cloud '{path}' without a color reference image")]
    MissingColorReference { path: PathBuf },
    #[error("unsupported output format '{extension}' for {stage} output '{path}'")]
    UnsupportedFormatForStage {
        path: PathBuf,
        extension: String,
        stage: Stage,
    },
    #[error("failed to write '{path}': {source}")]
    EncodeFailed { path: PathBuf, source: EncodeError },
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreateFailed { path: PathBuf, source: io::Error },
    #[error(
        "color reference for '{path}' is {}x{} but the point set is {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    ColorReferenceMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// A path template for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub template: StringTemplate,
    pub stage: Stage,
}

impl OutputSpec {
    pub fn new(template: impl Into<StringTemplate>, stage: Stage) -> Self {
        Self {
            template: template.into(),
            stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format<'a> {
    Storage(StorageFlavor),
    Binary,
    Pcd,
    Ply,
    Image(&'a str),
}

impl<'a> Format<'a> {
    fn from_path(path: &'a Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).unwrap_or_default() {
            "yml" | "yaml" => Format::Storage(StorageFlavor::Yaml),
            "xml" => Format::Storage(StorageFlavor::Xml),
            "bin" => Format::Binary,
            "pcd" => Format::Pcd,
            "ply" => Format::Ply,
            other => Format::Image(other),
        }
    }
}

/// Writes artifacts to templated paths.
#[derive(Debug, Default)]
pub struct OutputSink {
    written: usize,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Renders the path of `spec` with `vars` and writes `artifact` there.
    ///
    /// `color` is only used by point cloud formats. Returns the written path.
    pub fn write(
        &mut self,
        spec: &OutputSpec,
        vars: &Variables,
        artifact: Artifact<'_>,
        color: Option<&DynamicImage>,
    ) -> Result<PathBuf, SinkError> {
        let path = PathBuf::from(spec.template.render(vars));
        ensure_parent_dir(&path)?;
        let format = Format::from_path(&path);
        trace!("writing {} output {} as {:?}", spec.stage, path.display(), format);
        match format {
            Format::Storage(flavor) => {
                let matrix = artifact.to_matrix();
                create(&path, |w| write_storage(w, flavor, spec.stage.storage_key(), &matrix))?;
            }
            Format::Binary => {
                let matrix = artifact.to_matrix();
                create(&path, |w| encode_matrix(w, &matrix))?;
            }
            Format::Pcd | Format::Ply => {
                let points = match artifact {
                    Artifact::Points(points) => points,
                    _ => return Err(unsupported(&path, spec.stage)),
                };
                let color = color.ok_or_else(|| SinkError::MissingColorReference {
                    path: path.clone(),
                })?;
                if !points.matches_image(color) {
                    return Err(SinkError::ColorReferenceMismatch {
                        path: path.clone(),
                        expected: (points.cols() as u32, points.rows() as u32),
                        actual: color.dimensions(),
                    });
                }
                if format == Format::Pcd {
                    create(&path, |w| write_pcd(w, points, color))?;
                } else {
                    create(&path, |w| write_ply(w, points, color))?;
                }
            }
            Format::Image(extension) => {
                let image = match artifact {
                    Artifact::Image(image) => image.clone(),
                    Artifact::Matrix(matrix) => matrix.to_image().ok_or_else(|| {
                        encode_failed(
                            &path,
                            EncodeError::Unrepresentable(format!(
                                "a {}-channel matrix has no image equivalent",
                                matrix.channels()
                            )),
                        )
                    })?,
                    Artifact::Points(_) => return Err(unsupported(&path, spec.stage)),
                };
                let format = ImageFormat::from_extension(extension).ok_or_else(|| {
                    encode_failed(
                        &path,
                        EncodeError::Unrepresentable(format!(
                            "no image encoder for extension '{}'",
                            extension
                        )),
                    )
                })?;
                image
                    .save_with_format(&path, format)
                    .map_err(|e| encode_failed(&path, e.into()))?;
            }
        }
        self.written += 1;
        Ok(path)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), SinkError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| SinkError::DirectoryCreateFailed {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn create(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), SinkError> {
    let result = File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()
    });
    result.map_err(|e| encode_failed(path, e.into()))
}

fn encode_failed(path: &Path, source: EncodeError) -> SinkError {
    SinkError::EncodeFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn unsupported(path: &Path, stage: Stage) -> SinkError {
    SinkError::UnsupportedFormatForStage {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_owned(),
        stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_last_suffix() {
        assert_eq!(
            Format::from_path(Path::new("out/d.tar.yml")),
            Format::Storage(StorageFlavor::Yaml)
        );
        assert_eq!(Format::from_path(Path::new("a.xml")), Format::Storage(StorageFlavor::Xml));
        assert_eq!(Format::from_path(Path::new("a.bin")), Format::Binary);
        assert_eq!(Format::from_path(Path::new("a.PCD")), Format::Image("PCD"));
        assert_eq!(Format::from_path(Path::new("noext")), Format::Image(""));
    }
}
