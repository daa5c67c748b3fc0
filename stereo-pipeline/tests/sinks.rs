use image::{DynamicImage, GrayImage, Luma, RgbImage};
use ndarray::Array3;
use std::fs;
use std::path::Path;
use stereo_pipeline::sink::{read_matrix_bin, EncodeError};
use stereo_pipeline::{
    Artifact, Depth, NumericMatrix, OutputSink, OutputSpec, PointSet, SinkError, Stage, Variables,
};

fn spec(dir: &Path, template: &str, stage: Stage) -> OutputSpec {
    OutputSpec::new(format!("{}/{}", dir.display(), template).as_str(), stage)
}

fn vars(frame: usize) -> Variables {
    let mut vars = Variables::new();
    vars.insert("f".to_owned(), frame.into());
    vars
}

fn disparity() -> NumericMatrix {
    let data = Array3::from_shape_vec((2, 2, 1), vec![-1.0, 3.0, 0.5, 7.0]).unwrap();
    NumericMatrix::new(data, Depth::F32)
}

fn points(rows: usize, cols: usize) -> PointSet {
    PointSet(Array3::from_elem((rows, cols, 3), 1.0))
}

#[test]
fn storage_and_binary_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = OutputSink::new();
    let matrix = disparity();

    let yml = spec(dir.path(), "a/b/%{f}.yml", Stage::Disparity);
    let path = sink.write(&yml, &vars(3), Artifact::Matrix(&matrix), None).unwrap();
    assert_eq!(path, dir.path().join("a/b/3.yml"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("disparity: !!opencv-matrix"));
    assert!(text.contains("data: [ -1., 3., 5.00000000e-01, 7. ]"));

    let bin = spec(dir.path(), "%{f}.bin", Stage::Disparity);
    let path = sink.write(&bin, &vars(3), Artifact::Matrix(&matrix), None).unwrap();
    assert_eq!(read_matrix_bin(&path).unwrap(), matrix);
    assert_eq!(sink.written(), 2);
}

#[test]
fn frame_images_as_matrices() {
    let dir = tempfile::tempdir().unwrap();
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([9])));
    let output = spec(dir.path(), "frame.xml", Stage::Frames);
    let path = OutputSink::new()
        .write(&output, &Variables::new(), Artifact::Image(&image), None)
        .unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("<frame type_id=\"opencv-matrix\">"));
    assert!(text.contains("<dt>u</dt>"));
}

#[test]
fn point_cloud_needs_points_and_color() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = OutputSink::new();
    let pcd = spec(dir.path(), "out.pcd", Stage::Points);

    let matrix = disparity();
    assert!(matches!(
        sink.write(&pcd, &Variables::new(), Artifact::Matrix(&matrix), None),
        Err(SinkError::UnsupportedFormatForStage { extension, .. }) if extension == "pcd"
    ));

    let cloud = points(2, 2);
    assert!(matches!(
        sink.write(&pcd, &Variables::new(), Artifact::Points(&cloud), None),
        Err(SinkError::MissingColorReference { .. })
    ));

    let small = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
    assert!(matches!(
        sink.write(&pcd, &Variables::new(), Artifact::Points(&cloud), Some(&small)),
        Err(SinkError::ColorReferenceMismatch { expected: (2, 2), actual: (1, 1), .. })
    ));

    let color = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
    sink.write(&pcd, &Variables::new(), Artifact::Points(&cloud), Some(&color))
        .unwrap();
    assert_eq!(sink.written(), 1);
    assert!(dir.path().join("out.pcd").metadata().unwrap().len() > 0);
}

#[test]
fn points_are_not_images() {
    let dir = tempfile::tempdir().unwrap();
    let output = spec(dir.path(), "points.png", Stage::Points);
    let cloud = points(1, 1);
    assert!(matches!(
        OutputSink::new().write(&output, &Variables::new(), Artifact::Points(&cloud), None),
        Err(SinkError::UnsupportedFormatForStage { .. })
    ));
}

#[test]
fn unknown_image_extension() {
    let dir = tempfile::tempdir().unwrap();
    let output = spec(dir.path(), "disparity", Stage::Disparity);
    let matrix = disparity();
    assert!(matches!(
        OutputSink::new().write(&output, &Variables::new(), Artifact::Matrix(&matrix), None),
        Err(SinkError::EncodeFailed {
            source: EncodeError::Unrepresentable(_),
            ..
        })
    ));
}

#[test]
fn directory_creation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();
    let output = spec(&blocker, "sub/out.png", Stage::Frames);
    let image = DynamicImage::ImageLuma8(GrayImage::new(1, 1));
    assert!(matches!(
        OutputSink::new().write(&output, &Variables::new(), Artifact::Image(&image), None),
        Err(SinkError::DirectoryCreateFailed { .. })
    ));
}
