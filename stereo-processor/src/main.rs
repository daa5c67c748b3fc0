use log::*;
use std::path::PathBuf;
use stereo_pipeline::{FrameRange, OutputFormats, PipelineOptions};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "stereo-processor",
    about = "Batch processing of stereo image sequences, videos and recordings"
)]
struct Opt {
    /// Input file type (image, video, vrms).
    ///
    /// Determined from the input file suffix when not given.
    #[structopt(long)]
    input_type: Option<String>,
    /// Stereo calibration file (JSON).
    #[structopt(long, parse(from_os_str))]
    stereo_calibration: Option<PathBuf>,
    /// Stereo method configuration file (JSON with a `MethodName` entry).
    #[structopt(long, parse(from_os_str))]
    stereo_method: Option<PathBuf>,
    /// Frame range to process, as start:end or start:step:end.
    ///
    /// May be given several times; ranges are processed in order. A negative
    /// or empty end processes until the input runs out of frames.
    #[structopt(short, long, number_of_values = 1, default_value = "0:1:-1")]
    frame_range: Vec<FrameRange>,
    /// Output format for extracted frames, e.g. `frames/%{f|06d}_%{s}.png`.
    #[structopt(long, number_of_values = 1)]
    output_frames: Vec<String>,
    /// Output format for rectified frames.
    #[structopt(long, number_of_values = 1)]
    output_rectified: Vec<String>,
    /// Output format for disparity (xml, yml, yaml, bin or an image type).
    #[structopt(long, number_of_values = 1)]
    output_disparity: Vec<String>,
    /// Output format for point clouds (xml, yml, yaml, bin, pcd or ply).
    #[structopt(long, number_of_values = 1)]
    output_points: Vec<String>,
    /// Log debug messages.
    #[structopt(short, long)]
    verbose: bool,
    /// Input file.
    ///
    /// For image sequences this is a file name template using `%{f}` for the
    /// frame number and `%{s}` for the side (`L` or `R`).
    input: String,
}

impl Opt {
    fn into_options(self) -> PipelineOptions {
        PipelineOptions {
            input: self.input,
            input_type: self.input_type,
            calibration: self.stereo_calibration,
            method: self.stereo_method,
            ranges: self.frame_range,
            outputs: OutputFormats {
                frames: self.output_frames,
                rectified: self.output_rectified,
                disparity: self.output_disparity,
                points: self.output_points,
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn run(opt: Opt) -> stereo_pipeline::Result<()> {
    let options = opt.into_options();
    options.log_summary();
    let mut processor = options.setup()?;
    let summaries = processor.run(&options.ranges)?;
    let frames: usize = summaries.iter().map(|s| s.frames).sum();
    info!(
        "processed {} frame(s) in {} range(s), wrote {} file(s)",
        frames,
        summaries.len(),
        processor.written()
    );
    Ok(())
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.verbose);
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
