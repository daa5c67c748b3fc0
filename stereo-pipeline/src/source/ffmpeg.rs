use super::video::{CaptureError, VideoCapture};
use image::{DynamicImage, RgbImage};
use log::*;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Decodes a video by piping raw RGB frames out of an `ffmpeg` process.
///
/// Requires `ffmpeg` and `ffprobe` on the `PATH`. Seeking restarts the decoder
/// with a frame selection filter, so it is exact but costs a decode from the
/// start of the stream.
#[derive(Debug)]
pub struct FfmpegCapture {
    path: PathBuf,
    width: u32,
    height: u32,
    decoder: Option<(Child, ChildStdout)>,
    position: usize,
    frame: Vec<u8>,
    has_frame: bool,
}

impl FfmpegCapture {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height", "-of", "csv=p=0"])
            .arg(&path)
            .stderr(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(CaptureError::Probe(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }
        let (width, height) = parse_dimensions(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            "opened video {} ({}x{})",
            path.display(),
            width,
            height
        );
        let mut capture = Self {
            path,
            width,
            height,
            decoder: None,
            position: 0,
            frame: vec![0; width as usize * height as usize * 3],
            has_frame: false,
        };
        capture.spawn(0)?;
        Ok(capture)
    }

    fn spawn(&mut self, first_frame: usize) -> Result<(), CaptureError> {
        self.stop();
        let mut command = Command::new("ffmpeg");
        command.args(["-v", "error", "-nostdin", "-i"]).arg(&self.path);
        if first_frame > 0 {
            command
                .arg("-vf")
                .arg(format!("select=gte(n\\,{})", first_frame))
                .args(["-vsync", "0"]);
        }
        let mut child = command
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Probe("decoder has no output pipe".to_owned()))?;
        self.decoder = Some((child, stdout));
        self.position = first_frame;
        self.has_frame = false;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some((mut child, _)) = self.decoder.take() {
            // The process may already have exited at the end of the stream.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl VideoCapture for FfmpegCapture {
    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, index: usize) -> Result<(), CaptureError> {
        self.spawn(index).map_err(|e| {
            warn!("restarting decoder failed: {}", e);
            CaptureError::Seek(index)
        })
    }

    fn grab(&mut self) -> Result<bool, CaptureError> {
        let (_, stdout) = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => return Ok(false),
        };
        match stdout.read_exact(&mut self.frame) {
            Ok(()) => {
                self.position += 1;
                self.has_frame = true;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.stop();
                self.has_frame = false;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn retrieve(&mut self) -> Result<DynamicImage, CaptureError> {
        if !self.has_frame {
            return Err(CaptureError::NoFrame);
        }
        RgbImage::from_raw(self.width, self.height, self.frame.clone())
            .map(DynamicImage::ImageRgb8)
            .ok_or(CaptureError::NoFrame)
    }
}

impl Drop for FfmpegCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parses the `width,height` line ffprobe prints for the first video stream.
fn parse_dimensions(text: &str) -> Result<(u32, u32), CaptureError> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty());
    let bad = || CaptureError::Probe(format!("unexpected stream dimensions '{}'", text.trim()));
    let (width, height) = line.and_then(|l| l.split_once(',')).ok_or_else(bad)?;
    let width: u32 = width.trim().parse().map_err(|_| bad())?;
    let height: u32 = height.trim_end_matches(',').trim().parse().map_err(|_| bad())?;
    if width == 0 || height == 0 {
        return Err(bad());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FrameSource, SourceError, VideoSource};

    fn ffmpeg_on_path() -> bool {
        ["ffmpeg", "ffprobe"].iter().all(|tool| {
            Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_or(false, |status| status.success())
        })
    }

    /// Writes a lossless 10 frame, 32x16 side-by-side clip. Frame `n` has red
    /// `20 * n` everywhere and green `4 * x` in column `x`.
    fn write_clip(path: &Path) {
        let status = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-f", "lavfi", "-i"])
            .arg("color=c=black:s=32x16:r=10:d=1,format=gbrp,geq=r='20*N':g='4*X':b='8*Y'")
            .args(["-frames:v", "10", "-c:v", "rawvideo", "-pix_fmt", "rgb24", "-y"])
            .arg(path)
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn red_and_green(pair: &crate::pair::ImagePair) -> (u8, u8, u8) {
        let left = pair.left.to_rgb8();
        let right = pair.right.to_rgb8();
        (left.get_pixel(0, 0)[0], left.get_pixel(5, 0)[1], right.get_pixel(0, 0)[1])
    }

    #[test]
    fn decodes_seeks_and_ends() {
        if !ffmpeg_on_path() {
            eprintln!("ffmpeg not found, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.nut");
        write_clip(&path);

        let mut source = VideoSource::new(FfmpegCapture::open(&path).unwrap());
        let first = source.get_frame(0).unwrap();
        assert_eq!(first.left.width(), 16);
        assert_eq!(first.right.height(), 16);
        assert_eq!(red_and_green(&first), (0, 20, 64));
        assert_eq!(red_and_green(&source.get_frame(4).unwrap()), (80, 20, 64));
        assert_eq!(source.capture().position(), 5);

        // Backwards restarts the decoder at the requested frame.
        assert_eq!(red_and_green(&source.get_frame(2).unwrap()).0, 40);
        assert_eq!(source.capture().position(), 3);
        assert_eq!(red_and_green(&source.get_frame(9).unwrap()).0, 180);

        let err = source.get_frame(10).unwrap_err();
        assert!(matches!(err, SourceError::EndOfSequence { frame: 10, .. }));
    }

    #[test]
    fn dimensions_from_probe_output() {
        assert_eq!(parse_dimensions("1280,720\n").unwrap(), (1280, 720));
        assert_eq!(parse_dimensions("\n640,480,\n").unwrap(), (640, 480));
    }

    #[test]
    fn bad_probe_output() {
        for text in ["", "1280", "a,b", "0,480"] {
            assert!(matches!(parse_dimensions(text), Err(CaptureError::Probe(_))));
        }
    }
}
