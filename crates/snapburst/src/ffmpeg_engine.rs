//! Recording engine that drives an `ffmpeg` child process.
//!
//! `record` spawns ffmpeg with a platform screen grabber as input, `stop`
//! writes `q` to its stdin so it finalizes the container, and a watcher
//! thread reports the exit through the event sink.

use crate::screen_capture::{displays, union_bounds};

use snapburst_core::{
    CaptureError, CoreResult, EngineEventSink, EngineHandle, EngineOptions, EngineStatus,
    RecordingEngine, ScreenRect, SourceDescriptor,
};

use std::{
    io::{Read, Write},
    panic::Location,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Most recent stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 3;

/// Factory for ffmpeg recordings.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
}

impl FfmpegEngine {
    /// Use the ffmpeg executable at `ffmpeg` (a bare name is searched on `PATH`).
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

/// Absolute grab area resolved from a source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabTarget {
    /// A rectangle of the virtual screen.
    Area(ScreenRect),
    /// A native window.
    Window(u64),
}

impl RecordingEngine for FfmpegEngine {
    type Handle = FfmpegRecording;

    #[instrument(skip(self, events))]
    fn create(&self, options: &EngineOptions, events: EngineEventSink) -> CoreResult<FfmpegRecording> {
        let target = resolve_target(&options.source)?;
        debug!(?target, "ffmpeg grab target resolved");

        Ok(FfmpegRecording {
            ffmpeg: self.ffmpeg.clone(),
            options: options.clone(),
            target,
            events,
            stdin: Mutex::new(None),
            child: Arc::new(Mutex::new(None)),
            disposed: AtomicBool::new(false),
        })
    }

    fn supports_pause(&self) -> bool {
        false
    }
}

#[track_caller]
fn resolve_target(source: &SourceDescriptor) -> CoreResult<GrabTarget> {
    match source {
        SourceDescriptor::VirtualScreen => {
            let displays = displays()?;
            let bounds = union_bounds(displays.iter().map(|(_, info)| &info.bounds))
                .ok_or_else(|| no_source("No displays found".to_string()))?;
            Ok(GrabTarget::Area(bounds))
        }
        SourceDescriptor::Window { window_id } => Ok(GrabTarget::Window(*window_id)),
        SourceDescriptor::DisplayRegion { device_name, rect } => {
            let display = displays()?
                .into_iter()
                .map(|(_, info)| info)
                .find(|info| info.device_name == *device_name)
                .ok_or_else(|| no_source(format!("Display {device_name} not found")))?;

            Ok(GrabTarget::Area(ScreenRect::new(
                display.bounds.x.saturating_add(rect.x),
                display.bounds.y.saturating_add(rect.y),
                rect.width,
                rect.height,
            )))
        }
    }
}

#[track_caller]
fn no_source(reason: String) -> CaptureError {
    CaptureError::NoSource {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// One ffmpeg run.
pub struct FfmpegRecording {
    ffmpeg: PathBuf,
    options: EngineOptions,
    target: GrabTarget,
    events: EngineEventSink,
    stdin: Mutex<Option<ChildStdin>>,
    child: Arc<Mutex<Option<Child>>>,
    disposed: AtomicBool,
}

impl EngineHandle for FfmpegRecording {
    #[instrument(skip(self))]
    fn record(&self, path: &Path) -> CoreResult<()> {
        // Held until the child is stored so dispose cannot slip in between.
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if self.disposed.load(Ordering::Acquire) {
            return Err(CaptureError::engine("Recording was disposed before it started"));
        }
        if slot.is_some() {
            return Err(CaptureError::engine("ffmpeg is already running"));
        }

        let args = build_args(&self.options, &self.target, path)?;
        debug!(ffmpeg = ?self.ffmpeg, ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::engine(format!("Failed to start ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        *self.stdin.lock().unwrap_or_else(|e| e.into_inner()) = stdin;
        *slot = Some(child);
        drop(slot);

        let child = Arc::clone(&self.child);
        let events = self.events.clone();
        let output = path.to_path_buf();
        thread::Builder::new()
            .name("ffmpeg-watch".to_string())
            .spawn(move || watch(child, stderr, events, output))
            .map_err(|e| CaptureError::engine(format!("Failed to watch ffmpeg: {e}")))?;

        info!(path = ?path, "ffmpeg recording started");
        self.events.status(EngineStatus::Recording);
        Ok(())
    }

    fn stop(&self) -> CoreResult<()> {
        let stdin = self.stdin.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(mut stdin) = stdin else {
            return Err(CaptureError::engine("ffmpeg is not running"));
        };

        self.events.status(EngineStatus::Finishing);
        stdin
            .write_all(b"q")
            .and_then(|()| stdin.flush())
            .map_err(|e| CaptureError::engine(format!("Failed to signal ffmpeg: {e}")))?;
        debug!("ffmpeg asked to finish");
        Ok(())
    }

    fn pause(&self) -> CoreResult<()> {
        Err(CaptureError::engine("ffmpeg recordings cannot be paused"))
    }

    fn resume(&self) -> CoreResult<()> {
        Err(CaptureError::engine("ffmpeg recordings cannot be paused"))
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        drop(self.stdin.lock().unwrap_or_else(|e| e.into_inner()).take());

        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = child.as_mut() {
            if matches!(running.try_wait(), Ok(None)) {
                warn!("ffmpeg still running at dispose, killing");
                if let Err(e) = running.kill() {
                    error!(error = %e, "Failed to kill ffmpeg");
                }
            }
        }
    }
}

/// Wait for ffmpeg to exit and report the outcome.
fn watch(
    child: Arc<Mutex<Option<Child>>>,
    stderr: Option<impl Read>,
    events: EngineEventSink,
    output: PathBuf,
) {
    // stderr reaches EOF when ffmpeg exits; the child lock stays free until then.
    let mut log = String::new();
    if let Some(mut stderr) = stderr {
        if let Err(e) = stderr.read_to_string(&mut log) {
            debug!(error = %e, "ffmpeg stderr unreadable");
        }
    }

    let status = {
        let mut guard = child.lock().unwrap_or_else(|e| e.into_inner());
        match guard.take() {
            Some(mut running) => running.wait(),
            None => return,
        }
    };

    match status {
        Ok(status) if status.success() && output.exists() => {
            info!(path = ?output, "ffmpeg finished");
            events.complete(Some(output));
        }
        Ok(status) => {
            let tail = stderr_tail(&log);
            error!(?status, stderr = %tail, "ffmpeg exited abnormally");
            let message = if tail.is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                tail
            };
            events.failed(message);
        }
        Err(e) => {
            error!(error = %e, "Failed to wait for ffmpeg");
            events.failed(format!("ffmpeg wait failed: {e}"));
        }
    }
}

/// Output filter chain. libx264 with yuv420p needs even dimensions.
fn video_filter(target: &GrabTarget) -> String {
    const EVEN: &str = "crop=trunc(iw/2)*2:trunc(ih/2)*2";
    match grab_crop(target) {
        Some(crop) => format!("{crop},{EVEN}"),
        None => EVEN.to_string(),
    }
}

/// Crop applied after grabbing, for grabbers that cannot capture an area.
#[cfg(target_os = "macos")]
fn grab_crop(target: &GrabTarget) -> Option<String> {
    match target {
        GrabTarget::Area(rect) => Some(format!(
            "crop={}:{}:{}:{}",
            rect.width, rect.height, rect.x, rect.y
        )),
        GrabTarget::Window(_) => None,
    }
}

#[cfg(not(target_os = "macos"))]
fn grab_crop(_target: &GrabTarget) -> Option<String> {
    None
}

/// Last few non-empty stderr lines joined into one message.
pub fn stderr_tail(log: &str) -> String {
    let lines: Vec<&str> = log
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

/// ffmpeg command line for one recording.
///
/// # Errors
///
/// Returns [`CaptureError::NoSource`] when the target cannot be grabbed on
/// this platform.
#[track_caller]
pub fn build_args(options: &EngineOptions, target: &GrabTarget, path: &Path) -> CoreResult<Vec<String>> {
    let encoder = &options.encoder;
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nostats".into(),
        "-y".into(),
    ];

    args.extend(video_input_args(options, target)?);

    let with_audio = options.include_audio
        && match audio_input_args() {
            Some(audio) => {
                args.extend(audio);
                true
            }
            None => {
                warn!("Audio capture is not supported on this platform, recording without");
                false
            }
        };

    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-vf".into(),
        video_filter(target),
        "-b:v".into(),
        encoder.bitrate.to_string(),
        "-r".into(),
        encoder.framerate.to_string(),
        "-fps_mode".into(),
        if encoder.fixed_framerate { "cfr" } else { "vfr" }.into(),
    ]);

    if with_audio {
        args.extend(["-c:a".into(), "aac".into()]);
    }

    args.push(path.to_string_lossy().into_owned());
    Ok(args)
}

#[cfg(target_os = "windows")]
#[track_caller]
fn video_input_args(options: &EngineOptions, target: &GrabTarget) -> CoreResult<Vec<String>> {
    let mut args: Vec<String> = vec![
        "-f".into(),
        "gdigrab".into(),
        "-framerate".into(),
        options.encoder.framerate.to_string(),
        "-draw_mouse".into(),
        u8::from(options.capture_cursor).to_string(),
    ];
    match target {
        GrabTarget::Area(rect) => args.extend([
            "-offset_x".into(),
            rect.x.to_string(),
            "-offset_y".into(),
            rect.y.to_string(),
            "-video_size".into(),
            format!("{}x{}", rect.width, rect.height),
            "-i".into(),
            "desktop".into(),
        ]),
        GrabTarget::Window(id) => args.extend(["-i".into(), format!("hwnd=0x{id:x}")]),
    }
    Ok(args)
}

#[cfg(target_os = "linux")]
#[track_caller]
fn video_input_args(options: &EngineOptions, target: &GrabTarget) -> CoreResult<Vec<String>> {
    let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    let mut args: Vec<String> = vec![
        "-f".into(),
        "x11grab".into(),
        "-framerate".into(),
        options.encoder.framerate.to_string(),
        "-draw_mouse".into(),
        u8::from(options.capture_cursor).to_string(),
    ];
    match target {
        GrabTarget::Area(rect) => args.extend([
            "-video_size".into(),
            format!("{}x{}", rect.width, rect.height),
            "-i".into(),
            format!("{display}+{},{}", rect.x, rect.y),
        ]),
        GrabTarget::Window(id) => args.extend([
            "-window_id".into(),
            format!("0x{id:x}"),
            "-i".into(),
            display,
        ]),
    }
    Ok(args)
}

#[cfg(target_os = "macos")]
#[track_caller]
fn video_input_args(options: &EngineOptions, target: &GrabTarget) -> CoreResult<Vec<String>> {
    match target {
        GrabTarget::Area(_) => Ok(vec![
            "-f".into(),
            "avfoundation".into(),
            "-framerate".into(),
            options.encoder.framerate.to_string(),
            "-capture_cursor".into(),
            u8::from(options.capture_cursor).to_string(),
            "-i".into(),
            "Capture screen 0:none".into(),
        ]),
        GrabTarget::Window(_) => Err(no_source(
            "Window recording is not supported on macOS".to_string(),
        )),
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
#[track_caller]
fn video_input_args(_options: &EngineOptions, _target: &GrabTarget) -> CoreResult<Vec<String>> {
    Err(no_source("Screen recording is not supported on this platform".to_string()))
}

#[cfg(target_os = "linux")]
fn audio_input_args() -> Option<Vec<String>> {
    Some(vec!["-f".into(), "pulse".into(), "-i".into(), "default".into()])
}

#[cfg(target_os = "macos")]
fn audio_input_args() -> Option<Vec<String>> {
    Some(vec!["-f".into(), "avfoundation".into(), "-i".into(), ":0".into()])
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn audio_input_args() -> Option<Vec<String>> {
    None
}
