//! Frame acquisition and templated multi-stage output for stereo vision.
//!
//! A [`Processor`] pulls left/right [`ImagePair`]s from a [`FrameSource`] for
//! every index of one or more [`FrameRange`]s. Each pair optionally goes
//! through rectification, disparity computation and reprojection, and the
//! result of every stage can be written to files whose names come from
//! [`StringTemplate`]s:
//!
//! ```no_run
//! use stereo_pipeline::{OutputFormats, PipelineOptions};
//!
//! let options = PipelineOptions {
//!     input: "rig/%{f|04d}_%{s}.png".to_owned(),
//!     ranges: vec!["0:9".parse()?],
//!     outputs: OutputFormats {
//!         frames: vec!["copy/%{f}_%{s}.jpg".to_owned()],
//!         ..OutputFormats::default()
//!     },
//!     ..PipelineOptions::default()
//! };
//! let mut processor = options.setup()?;
//! processor.run(&options.ranges)?;
//! # Ok::<(), stereo_pipeline::Error>(())
//! ```

pub mod error;
pub mod matrix;
pub mod options;
pub mod pair;
pub mod processor;
pub mod range;
pub mod sink;
pub mod source;
pub mod stereo;
pub mod template;

pub use error::{ConfigError, Error, Result};
pub use matrix::{Depth, NumericMatrix, PointSet};
pub use options::PipelineOptions;
pub use pair::{ImagePair, Side};
pub use processor::{OutputFormats, Pipeline, Processor, RangeSummary};
pub use range::FrameRange;
pub use sink::{Artifact, OutputSink, OutputSpec, SinkError, Stage};
pub use source::{FrameSource, InputKind, SourceError};
pub use template::{StringTemplate, Value, Variables};
