use super::{BlockMatching, StereoMatcher};
use crate::error::ConfigError;
use log::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Names accepted in the `MethodName` entry of a stereo method file.
pub const METHOD_NAMES: &[&str] = &["block_matching", "BM"];

/// Loads the stereo method described by a JSON method file.
///
/// The file is an object holding a `MethodName` and the method's parameters,
/// e.g. `{"MethodName": "block_matching", "num_disparities": 32}`.
pub fn load_stereo_method(path: impl AsRef<Path>) -> Result<Box<dyn StereoMatcher>, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        what: "stereo method",
        path: path.to_path_buf(),
        source,
    })?;
    let config: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        what: "stereo method",
        path: path.to_path_buf(),
        source,
    })?;
    create_stereo_method(config)
}

/// Builds a matcher from an already parsed method description.
pub fn create_stereo_method(config: Value) -> Result<Box<dyn StereoMatcher>, ConfigError> {
    let mut parameters = match config {
        Value::Object(map) => map,
        other => {
            return Err(ConfigError::InvalidMethodParameters {
                method: String::new(),
                reason: format!("expected an object, found {}", other),
            })
        }
    };
    let name = match parameters.remove("MethodName") {
        Some(Value::String(name)) => name,
        _ => {
            return Err(ConfigError::InvalidMethodParameters {
                method: String::new(),
                reason: "missing string entry \"MethodName\"".to_owned(),
            })
        }
    };
    match name.as_str() {
        "block_matching" | "BM" => {
            let matcher = BlockMatching::from_parameters(Value::Object(parameters))?;
            info!("using stereo method {} with {:?}", name, matcher);
            Ok(Box::new(matcher))
        }
        _ => Err(ConfigError::UnknownMethod(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::ImagePair;
    use image::{DynamicImage, GrayImage};
    use serde_json::json;

    #[test]
    fn registry_lookup() {
        for name in METHOD_NAMES {
            let matcher = create_stereo_method(json!({ "MethodName": name, "num_disparities": 16 }))
                .unwrap();
            let image = DynamicImage::ImageLuma8(GrayImage::new(32, 16));
            let disparity = matcher.compute_disparity(&ImagePair::new(image.clone(), image));
            assert_eq!(disparity.levels, 16);
        }
    }

    #[test]
    fn unknown_or_missing_name() {
        assert!(matches!(
            create_stereo_method(json!({ "MethodName": "semi_global" })),
            Err(ConfigError::UnknownMethod(name)) if name == "semi_global"
        ));
        assert!(matches!(
            create_stereo_method(json!({ "num_disparities": 16 })),
            Err(ConfigError::InvalidMethodParameters { .. })
        ));
        assert!(matches!(
            create_stereo_method(json!([1, 2])),
            Err(ConfigError::InvalidMethodParameters { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("method.json");
        fs::write(&path, r#"{ "MethodName": "BM", "block_size": 3 }"#).unwrap();
        assert!(load_stereo_method(&path).is_ok());
        fs::write(&path, "MethodName = BM").unwrap();
        assert!(matches!(
            load_stereo_method(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
