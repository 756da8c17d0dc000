use std::{
    ffi::{OsStr, OsString},
    io::prelude::*,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use image::RgbImage;
use log::{debug, warn};
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

const FFPROBE_TIMEOUT_SECS: u64 = 60;

// Attempt to prevent OOM on very implausible sizes
const MAX_FRAME_BYTES: usize = 5_368_709_120;

// Frames decoded ahead of the consumer. Keeps memory bounded when the consumer is slow.
const FRAME_QUEUE_LEN: usize = 2;

/// Decoded RGB frames read from an ffmpeg rawvideo pipe, in decode order.
///
/// Frames are read from ffmpeg on a background thread. The iterator ends when ffmpeg stops
/// producing frames, or when no frame arrives within the read timeout (if one is set).
#[derive(Debug)]
pub struct FfmpegFrameIter {
    child: Child,
    frames: Option<Receiver<RgbImage>>,
    read_timeout: Option<Duration>,
    frames_read: u64,
}

impl FfmpegFrameIter {
    fn start(mut child: Child, x: u32, y: u32, read_timeout: Option<Duration>) -> Result<Self, FfmpegError> {
        let frame_bytes = usize::try_from(x)
            .ok()
            .and_then(|x| x.checked_mul(usize::try_from(y).ok()?))
            .and_then(|pixels| pixels.checked_mul(3))
            .filter(|bytes| *bytes <= MAX_FRAME_BYTES)
            .ok_or(InvalidResolution)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Io("failed to capture stdout".to_string()))?;

        let (tx, rx) = crossbeam_channel::bounded(FRAME_QUEUE_LEN);
        std::thread::spawn(move || read_frames(stdout, x, y, frame_bytes, &tx));

        Ok(Self {
            child,
            frames: Some(rx),
            read_timeout,
            frames_read: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn finish(&mut self) {
        //dropping the receiver unblocks the reader thread if it is waiting to send.
        self.frames = None;
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

// Runs on the reader thread until ffmpeg closes its stdout or the iterator is dropped.
fn read_frames(mut stdout: ChildStdout, x: u32, y: u32, frame_bytes: usize, tx: &crossbeam_channel::Sender<RgbImage>) {
    loop {
        let mut raw_buf = vec![0u8; frame_bytes];
        if stdout.read_exact(&mut raw_buf).is_err() {
            return;
        }
        let Some(frame) = RgbImage::from_raw(x, y, raw_buf) else {
            return;
        };
        if tx.send(frame).is_err() {
            return;
        }
    }
}

impl Iterator for FfmpegFrameIter {
    type Item = RgbImage;

    fn next(&mut self) -> Option<Self::Item> {
        let frames = self.frames.as_ref()?;

        let received = match self.read_timeout {
            Some(timeout) => frames.recv_timeout(timeout),
            None => frames.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(frame) => {
                self.frames_read += 1;
                Some(frame)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(target: "ffmpeg", "No frame from ffmpeg after {} frames, giving up", self.frames_read);
                self.finish();
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.finish();
                None
            }
        }
    }
}

// to prevent accumulation of zombie processes, reap the return code of
// ffmpeg subcommands (if nothing else has done so already) here
impl Drop for FfmpegFrameIter {
    fn drop(&mut self) {
        self.frames = None;
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

/// Configures and spawns an ffmpeg process that decodes every frame of a video (no frame rate
/// conversion) as rgb24.
#[derive(Clone, Debug)]
pub struct FfmpegFrameReaderBuilder {
    src_path: PathBuf,
    start_secs: Option<f64>,
    timeout_secs: Option<u64>,
    info: Option<VideoInfo>,
}

impl FfmpegFrameReaderBuilder {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            start_secs: None,
            timeout_secs: None,
            info: None,
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    /// Begin decoding at this timestamp. The seek is frame accurate.
    pub fn start_secs(&mut self, start_secs: f64) -> &mut Self {
        self.start_secs = Some(start_secs);
        self
    }

    /// Give up if ffmpeg produces no frame for this many seconds. Applies to each frame separately.
    pub fn timeout_secs(&mut self, timeout_secs: u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Use already known video information rather than running ffprobe again.
    pub fn video_info(&mut self, info: VideoInfo) -> &mut Self {
        self.info = Some(info);
        self
    }

    pub fn spawn_rgb(&self) -> Result<(FfmpegFrameIter, VideoInfo), FfmpegError> {
        //we also need to find out the resolution of the video so that stdout can be converted into frames.
        let stats = match &self.info {
            Some(info) => info.clone(),
            None => VideoInfo::new(&self.src_path)?,
        };

        //bail out if we get invalid dimensions.
        let (x, y) = stats.resolution();
        if x == 0 || y == 0 {
            return Err(InvalidResolution);
        }

        let args = self.ffmpeg_args();
        let args = args.iter().map(OsString::as_os_str).collect::<Vec<_>>();

        let child = spawn_ffmpeg_command(Ffmpeg, &args, true)?;
        let read_timeout = self.timeout_secs.map(Duration::from_secs);
        let frame_iterator = FfmpegFrameIter::start(child, x, y, read_timeout)?;

        Ok((frame_iterator, stats))
    }

    fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "warning", "-nostats"]
            .iter()
            .map(OsString::from)
            .collect();

        //-ss before -i seeks the input. When transcoding, ffmpeg decodes (and discards) frames
        //between the preceding keyframe and the timestamp, so the first frame is exact.
        if let Some(start_secs) = self.start_secs {
            args.push("-ss".into());
            args.push(format!("{:.6}", start_secs.max(0.0)).into());
        }

        args.push("-i".into());
        args.push(self.src_path.clone().into_os_string());

        args.extend(["-fps_mode", "passthrough"].map(OsString::from));

        #[rustfmt::skip]
        let output_args = [
            "-pix_fmt", "rgb24",
            "-c:v",     "rawvideo",
            "-f",       "image2pipe",
            "-",
        ];
        args.extend(output_args.map(OsString::from));

        args
    }
}

pub fn get_video_stats<P: AsRef<Path>>(src_path: P) -> Result<String, FfmpegError> {
    let args = &[
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new(src_path.as_ref()),
    ];

    let stdout = run_ffmpeg_command(Ffprobe, args, true)?.stdout;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

/// Ask ffprobe whether the file at `src_path` contains a video stream.
pub fn is_video_file<P: AsRef<Path>>(src_path: P) -> Result<bool, FfmpegError> {
    //"ffprobe -v error -select_streams v -show_entries stream=codec_type,codec_name -of compact=p=0:nk=1 {}"
    #[rustfmt::skip]
    let args = &[
        OsStr::new("-v"),              OsStr::new("error"),
        OsStr::new("-select_streams"), OsStr::new("v"),
        OsStr::new("-show_entries"),   OsStr::new("stream=codec_name,codec_type"),
        OsStr::new("-of"),             OsStr::new("compact=p=0:nk=1"),
        OsStr::new(src_path.as_ref())
    ];

    let output = run_ffmpeg_command(Ffprobe, args, true)?;
    let streams_string = String::from_utf8(output.stdout).map_err(|_| Utf8Conversion)?;

    //one line per video stream: "codec_name|codec_type"
    let is_video = streams_string
        .lines()
        .any(|line| line.trim().split('|').nth(1) == Some("video"));

    Ok(is_video)
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    //check ffprobe is callable.
    if run_ffmpeg_command(Ffprobe, &[OsStr::new("-version")], true).is_err() {
        return false;
    }

    //now ffmpeg.
    if run_ffmpeg_command(Ffmpeg, &[OsStr::new("-version")], true).is_err() {
        return false;
    }

    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(name: FfmpegCommandName, args: &[&OsStr], stderr_null: bool) -> Result<Child, FfmpegError> {
    let stderr_cfg = if stderr_null {
        Stdio::null()
    } else {
        Stdio::piped()
    };

    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(stderr_cfg);

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    debug!(target: "ffmpeg", "{:?}", command);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

struct FfmpegOutput {
    stdout: Vec<u8>,
}

fn run_ffmpeg_command(name: FfmpegCommandName, args: &[&OsStr], stderr_null: bool) -> Result<FfmpegOutput, FfmpegError> {
    fn read_to_end(mut pipe: impl Read) -> Vec<u8> {
        let mut acc = vec![];
        let _read_error = pipe.read_to_end(&mut acc);
        acc
    }

    let mut child = spawn_ffmpeg_command(name, args, stderr_null)?;

    //Drain the pipes on their own threads so that ffmpeg never blocks on a full pipe while we wait for it.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Io("failed to capture stdout".to_string()))?;
    let stdout_thread = std::thread::spawn(move || read_to_end(stdout));
    let stderr_thread = child
        .stderr
        .take()
        .map(|stderr| std::thread::spawn(move || read_to_end(stderr)));

    let status = match child.wait_timeout(Duration::from_secs(FFPROBE_TIMEOUT_SECS)) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Timeout);
        }
        Err(e) => return Err(Io(format!("{:?}", e.kind()))),
    };

    let stdout = stdout_thread
        .join()
        .map_err(|_| Io("stdout reader panicked".to_string()))?;
    let stderr = match stderr_thread {
        Some(thread) => thread
            .join()
            .map_err(|_| Io("stderr reader panicked".to_string()))?,
        None => vec![],
    };

    if status.success() {
        Ok(FfmpegOutput { stdout })
    } else {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        match std::str::from_utf8(&stderr) {
            Ok(error_text) => Err(FfmpegInternal(error_text.chars().take(500).collect())),
            Err(_) => Err(Utf8Conversion),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seek_args() {
        let mut builder = FfmpegFrameReaderBuilder::new("video.mp4");
        builder.start_secs(2.5);
        let args = builder.ffmpeg_args();
        let args = args.iter().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input, "seek must come before the input");
        assert_eq!(args[ss + 1], "2.500000");
        assert!(args.windows(2).any(|w| w == ["-fps_mode", "passthrough"]));
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[cfg(unix)]
    fn spawn_shell(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    #[test]
    #[cfg(unix)]
    fn test_stalled_decoder_times_out() {
        let child = spawn_shell("sleep 6");
        let mut frames = FfmpegFrameIter::start(child, 4, 4, Some(Duration::from_secs(1))).unwrap();

        let started = std::time::Instant::now();
        assert_eq!(frames.next(), None);
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_secs(3), "gave up after {elapsed:?}");

        //once timed out, the iterator stays finished.
        assert_eq!(frames.next(), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_whole_frames_are_read_until_eof() {
        //two 4x4 rgb frames and a truncated third.
        let child = spawn_shell("head -c 100 /dev/zero");
        let frames = FfmpegFrameIter::start(child, 4, 4, Some(Duration::from_secs(10))).unwrap();

        let frames = frames.collect::<Vec<_>>();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.dimensions() == (4, 4)));
    }

    #[test]
    #[ignore = "requires ffprobe on the PATH"]
    fn test_missing_file_is_not_a_video() {
        assert!(ffmpeg_and_ffprobe_are_callable());
        assert!(is_video_file("/this/file/does/not/exist.mp4").is_err());
    }
}
