//! Per-file metadata extraction with a fallback chain of decoding strategies.
//!
//! The extractor is total: whatever happens while reading a file (bad header,
//! unsupported codec, I/O failure, decoder panic, timeout), the caller gets a
//! [`FileRecord`] back. A record is either fully successful (duration and
//! sample rate present) or fully failed (error present), never a mix.

use crate::discovery::label_for;
use crate::error::ExtractionError;
use crate::{AudioFormat, format_of};
use log::debug;
use serde::Serialize;
use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Duration and sample rate of a successfully read file. Both are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMetadata {
    duration: f64,
    sample_rate: u32,
}

impl AudioMetadata {
    /// Builds metadata from a per-channel frame count and the stream's sample rate.
    pub fn from_frames(frames: u64, sample_rate: u32) -> Result<Self, ExtractionError> {
        if sample_rate == 0 {
            return Err(ExtractionError::InvalidSampleRate(sample_rate));
        }
        if frames == 0 {
            return Err(ExtractionError::EmptyStream);
        }
        Ok(Self {
            duration: frames as f64 / sample_rate as f64,
            sample_rate,
        })
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Extraction outcome for one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    path: PathBuf,
    label: String,
    format: String,
    duration: Option<f64>,
    sampling_rate: Option<u32>,
    error: Option<String>,
}

impl FileRecord {
    pub fn extracted(path: impl Into<PathBuf>, metadata: AudioMetadata) -> Self {
        let path = path.into();
        Self {
            label: label_for(&path),
            format: format_of(&path),
            duration: Some(metadata.duration),
            sampling_rate: Some(metadata.sample_rate),
            error: None,
            path,
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            label: label_for(&path),
            format: format_of(&path),
            duration: None,
            sampling_rate: None,
            error: Some(error.into()),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn sampling_rate(&self) -> Option<u32> {
        self.sampling_rate
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Point in time after which a strategy must give up on the current file.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn check(&self) -> Result<(), ExtractionError> {
        if Instant::now() >= self.at {
            Err(ExtractionError::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}

/// One way of obtaining [`AudioMetadata`] from a path.
pub type ExtractFn = fn(&Path, Option<Deadline>) -> Result<AudioMetadata, ExtractionError>;

#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: ExtractFn,
}

/// Reads frame count and sample rate from the container headers, no decoding.
pub const CONTAINER_PROBE: Strategy = Strategy {
    name: "container probe",
    run: probe_container,
};

/// Decodes the whole stream and counts frames. Slow, but works when headers lack a frame count.
pub const FULL_DECODE: Strategy = Strategy {
    name: "full decode",
    run: decode_full,
};

/// Default per-file budget for extraction
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Tries each strategy in order until one succeeds.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    strategies: Vec<Strategy>,
    timeout: Option<Duration>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(Some(DEFAULT_DECODE_TIMEOUT))
    }
}

impl MetadataExtractor {
    /// The standard chain: container probe first, full decode as fallback.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_strategies(vec![CONTAINER_PROBE, FULL_DECODE], timeout)
    }

    pub fn with_strategies(strategies: Vec<Strategy>, timeout: Option<Duration>) -> Self {
        Self {
            strategies,
            timeout,
        }
    }

    /// Extracts metadata for one file. Never fails and never panics; failures
    /// are recorded in the returned record's `error`.
    pub fn extract(&self, path: impl AsRef<Path>) -> FileRecord {
        let path = path.as_ref();
        if AudioFormat::from_path(path).is_none() {
            return FileRecord::failed(path, format!("Non-audio extension: {}", format_of(path)));
        }

        let deadline = self.timeout.map(Deadline::after);
        let mut failures: Vec<(&'static str, ExtractionError)> = Vec::new();
        for strategy in &self.strategies {
            match run_guarded(strategy, path, deadline) {
                Ok(metadata) => {
                    debug!(
                        "{:?}: {:.3}s at {} Hz via {}",
                        path.file_name().unwrap_or_default(),
                        metadata.duration,
                        metadata.sample_rate,
                        strategy.name
                    );
                    return FileRecord::extracted(path, metadata);
                }
                Err(e) => {
                    debug!(
                        "{} failed for {:?}: {}",
                        strategy.name,
                        path.file_name().unwrap_or_default(),
                        e
                    );
                    failures.push((strategy.name, e));
                }
            }
        }
        FileRecord::failed(path, failure_message(&failures))
    }
}

fn run_guarded(
    strategy: &Strategy,
    path: &Path,
    deadline: Option<Deadline>,
) -> Result<AudioMetadata, ExtractionError> {
    panic::catch_unwind(AssertUnwindSafe(|| (strategy.run)(path, deadline)))
        .unwrap_or_else(|payload| Err(ExtractionError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The last strategy's error is the headline; earlier ones follow in brackets.
fn failure_message(failures: &[(&'static str, ExtractionError)]) -> String {
    let Some(((_, last), earlier)) = failures.split_last() else {
        return "Error loading/processing file: no extraction strategy configured".to_string();
    };
    let mut message = format!("Error loading/processing file: {}", last);
    for (name, e) in earlier {
        message.push_str(&format!(" ({}: {})", name, e));
    }
    message
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>, ExtractionError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
    Ok(probed.format)
}

fn audio_track(format: &dyn FormatReader) -> Result<&Track, ExtractionError> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(ExtractionError::NoTrack)
}

/// Primary path: frame count and sample rate straight from the stream parameters.
pub fn probe_container(
    path: &Path,
    deadline: Option<Deadline>,
) -> Result<AudioMetadata, ExtractionError> {
    if let Some(deadline) = &deadline {
        deadline.check()?;
    }
    let format = open_format(path)?;
    let track = audio_track(&*format)?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(ExtractionError::MissingSampleRate)?;
    let frames = track
        .codec_params
        .n_frames
        .ok_or(ExtractionError::MissingFrameCount)?;
    AudioMetadata::from_frames(frames, sample_rate)
}

/// Secondary path: decode every packet of the audio track and count the frames.
///
/// The sample rate reported by the decoded buffers wins over the header value.
pub fn decode_full(path: &Path, deadline: Option<Deadline>) -> Result<AudioMetadata, ExtractionError> {
    let mut format = open_format(path)?;
    let track = audio_track(&*format)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs().make(&codec_params, &dec_opts)?;

    let mut sample_rate = codec_params.sample_rate;
    let mut frames: u64 = 0;
    let mut skipped_packets = 0usize;

    loop {
        if let Some(deadline) = &deadline {
            deadline.check()?;
        }
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                frames += decoded.frames() as u64;
                sample_rate = Some(decoded.spec().rate);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                debug!(
                    "Decode error in {:?}: {}. Skipping packet.",
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    debug!(
        "Decoded {:?}: {} frames, {} packets skipped",
        path.file_name().unwrap_or_default(),
        frames,
        skipped_packets
    );
    AudioMetadata::from_frames(frames, sample_rate.ok_or(ExtractionError::MissingSampleRate)?)
}
