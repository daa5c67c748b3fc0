use crate::error::Result;
use crate::pair::{ImagePair, Side};
use crate::range::FrameRange;
use crate::sink::{Artifact, OutputSink, OutputSpec, Stage};
use crate::source::FrameSource;
use crate::stereo::{Rectifier, Reprojector, StereoMatcher};
use crate::template::{Value, Variables};
use log::*;

/// The optional stages between fetching a pair and writing outputs.
#[derive(Default)]
pub struct Pipeline {
    /// Without a rectifier the input is assumed to be rectified already.
    pub rectifier: Option<Box<dyn Rectifier>>,
    pub matcher: Option<Box<dyn StereoMatcher>>,
    pub reprojector: Option<Box<dyn Reprojector>>,
}

/// The output path templates of a run, per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFormats {
    pub frames: Vec<String>,
    pub rectified: Vec<String>,
    pub disparity: Vec<String>,
    pub points: Vec<String>,
}

impl OutputFormats {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
            && self.rectified.is_empty()
            && self.disparity.is_empty()
            && self.points.is_empty()
    }

    pub fn for_stage(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Frames => &self.frames,
            Stage::Rectified => &self.rectified,
            Stage::Disparity => &self.disparity,
            Stage::Points => &self.points,
        }
    }

    fn specs(&self, stage: Stage) -> Vec<OutputSpec> {
        self.for_stage(stage)
            .iter()
            .map(|format| OutputSpec::new(format.as_str(), stage))
            .collect()
    }
}

/// What happened to one frame range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSummary {
    pub range: FrameRange,
    /// Number of frames fully processed.
    pub frames: usize,
    /// Whether an unbounded range stopped at the end of the source.
    pub reached_end: bool,
}

/// Drives the per-frame sequence: fetch, rectify, match, reproject, with the
/// outputs of each stage written as soon as the stage is done.
pub struct Processor {
    source: Box<dyn FrameSource>,
    pipeline: Pipeline,
    frames: Vec<OutputSpec>,
    rectified: Vec<OutputSpec>,
    disparity: Vec<OutputSpec>,
    points: Vec<OutputSpec>,
    sink: OutputSink,
}

impl Processor {
    pub fn new(source: Box<dyn FrameSource>, pipeline: Pipeline, outputs: &OutputFormats) -> Self {
        Self {
            source,
            pipeline,
            frames: outputs.specs(Stage::Frames),
            rectified: outputs.specs(Stage::Rectified),
            disparity: outputs.specs(Stage::Disparity),
            points: outputs.specs(Stage::Points),
            sink: OutputSink::new(),
        }
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.sink.written()
    }

    /// Processes `ranges` in order. Stops at the first error.
    pub fn run(&mut self, ranges: &[FrameRange]) -> Result<Vec<RangeSummary>> {
        let mut summaries = Vec::with_capacity(ranges.len());
        for range in ranges {
            info!(
                "processing frame range: {} to {} with step {}",
                range.start,
                range.end_value(),
                range.step
            );
            let summary = self.process_frame_range(range)?;
            info!("done with {} frame(s)", summary.frames);
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Processes a single range. An unbounded range ends quietly when the
    /// source runs out of frames; a bounded one treats that as an error.
    pub fn process_frame_range(&mut self, range: &FrameRange) -> Result<RangeSummary> {
        let mut vars = Variables::new();
        vars.insert("rangeStart".to_owned(), range.start.into());
        vars.insert("rangeEnd".to_owned(), range.end_value().into());
        vars.insert("rangeStep".to_owned(), range.step.into());

        let mut summary = RangeSummary {
            range: *range,
            frames: 0,
            reached_end: false,
        };
        for frame in range {
            vars.insert("f".to_owned(), frame.into());
            debug!("processing frame {}", frame);

            let pair = match self.source.get_frame(frame) {
                Ok(pair) => pair,
                Err(e) if e.is_end_of_sequence() && !range.is_bounded() => {
                    info!("reached end of sequence at frame {}", frame);
                    summary.reached_end = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            self.process_pair(&pair, &mut vars)?;
            summary.frames += 1;
        }
        Ok(summary)
    }

    fn process_pair(&mut self, pair: &ImagePair, vars: &mut Variables) -> Result<()> {
        write_sides(&mut self.sink, &self.frames, vars, pair)?;

        let rectified = self.pipeline.rectifier.as_ref().map(|r| r.rectify(pair));
        let rectified = rectified.as_ref().unwrap_or(pair);
        write_sides(&mut self.sink, &self.rectified, vars, rectified)?;

        let matcher = match &self.pipeline.matcher {
            Some(matcher) => matcher,
            None => return Ok(()),
        };
        let disparity = matcher.compute_disparity(rectified);
        trace!("disparity computed with {} levels", disparity.levels);
        for spec in &self.disparity {
            self.sink
                .write(spec, vars, Artifact::Matrix(&disparity.map), None)?;
        }

        if let Some(reprojector) = &self.pipeline.reprojector {
            let points = reprojector.reproject(&disparity.map);
            for spec in &self.points {
                self.sink.write(
                    spec,
                    vars,
                    Artifact::Points(&points),
                    Some(&rectified.left),
                )?;
            }
        }
        Ok(())
    }
}

/// Writes each per-side output for the left and then the right image.
fn write_sides(
    sink: &mut OutputSink,
    specs: &[OutputSpec],
    vars: &mut Variables,
    pair: &ImagePair,
) -> Result<()> {
    for spec in specs {
        for side in Side::BOTH {
            vars.insert("s".to_owned(), Value::from(side.marker()));
            let written = sink.write(spec, vars, Artifact::Image(pair.side(side)), None);
            vars.remove("s");
            written?;
        }
    }
    Ok(())
}
