use crate::error::{ConfigError, Result};
use crate::processor::{OutputFormats, Pipeline, Processor};
use crate::range::FrameRange;
use crate::source::{open_source, InputKind};
use crate::stereo::{load_stereo_method, HomographyRectifier, QReprojector, StereoCalibration};
use log::*;
use std::path::PathBuf;

/// Everything needed to set up a run.
///
/// The default processes the whole input, as the single range `0:1:-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Input file, or the file name template of an image sequence.
    pub input: String,
    /// `image`, `video` or `vrms`; guessed from the input suffix when absent.
    pub input_type: Option<String>,
    pub calibration: Option<PathBuf>,
    pub method: Option<PathBuf>,
    pub ranges: Vec<FrameRange>,
    pub outputs: OutputFormats,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            input_type: None,
            calibration: None,
            method: None,
            ranges: vec![FrameRange::unbounded()],
            outputs: OutputFormats::default(),
        }
    }
}

impl PipelineOptions {
    pub fn input_kind(&self) -> Result<InputKind, ConfigError> {
        match &self.input_type {
            Some(name) => name.parse(),
            None => {
                let kind = InputKind::from_path(&self.input)?;
                debug!("auto-determined input type: {}", kind);
                Ok(kind)
            }
        }
    }

    /// Checks that the requested outputs can be produced.
    pub fn validate(&self) -> Result<InputKind, ConfigError> {
        let kind = self.input_kind()?;
        let outputs = &self.outputs;
        if outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        if self.ranges.is_empty() {
            return Err(ConfigError::NoRanges);
        }
        // Disparity alone works on input that is rectified already.
        if self.calibration.is_none() {
            if !outputs.rectified.is_empty() {
                return Err(ConfigError::CalibrationRequired("rectified images"));
            }
            if !outputs.points.is_empty() {
                return Err(ConfigError::CalibrationRequired("reprojected points"));
            }
        }
        if self.method.is_none() {
            if !outputs.disparity.is_empty() {
                return Err(ConfigError::MethodRequired("disparity"));
            }
            if !outputs.points.is_empty() {
                return Err(ConfigError::MethodRequired("reprojected points"));
            }
        }
        Ok(kind)
    }

    /// Validates the options and builds the processor they describe.
    pub fn setup(&self) -> Result<Processor> {
        let kind = self.validate()?;
        debug!("setting up pipeline");
        let source = open_source(kind, &self.input)?;

        let mut pipeline = Pipeline::default();
        if let Some(path) = &self.calibration {
            debug!("setting up rectification: {}", path.display());
            let calibration = StereoCalibration::load(path)?;
            pipeline.rectifier = Some(Box::new(HomographyRectifier::from_calibration(
                &calibration,
            )?));
            debug!("setting up reprojection");
            pipeline.reprojector = Some(Box::new(QReprojector::from_calibration(&calibration)));
        }
        if let Some(path) = &self.method {
            debug!("setting up stereo method: {}", path.display());
            pipeline.matcher = Some(load_stereo_method(path)?);
        }
        Ok(Processor::new(source, pipeline, &self.outputs))
    }

    /// Logs the configuration of the run.
    pub fn log_summary(&self) {
        let or_none = |path: &Option<PathBuf>| {
            path.as_ref()
                .map_or_else(|| "<none>".to_owned(), |p| p.display().to_string())
        };
        info!("input file: {}", self.input);
        info!(
            "input file type: {}",
            self.input_type.as_deref().unwrap_or("<auto>")
        );
        info!("stereo calibration file: {}", or_none(&self.calibration));
        info!("stereo method config file: {}", or_none(&self.method));
        info!("frame range(s):");
        for range in &self.ranges {
            info!(
                " * {} to {} with step {}",
                range.start,
                range.end_value(),
                range.step
            );
        }
        for (name, formats) in [
            ("frame", &self.outputs.frames),
            ("rectified", &self.outputs.rectified),
            ("disparity", &self.outputs.disparity),
            ("points", &self.outputs.points),
        ] {
            info!("output {} format(s):", name);
            for format in formats {
                info!(" * {}", format);
            }
        }
    }
}
