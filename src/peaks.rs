//! Peak amplitude extraction
//!
//! Decodes a track's source audio to mono samples and reduces it to a
//! fixed-window peak envelope, normalized so the loudest window is 1.0.
//! The envelope is published as a JSON artifact next to the graphs so a
//! consumer can render a waveform without touching the original audio.
//!
//! Computation sits behind the [`PeakComputer`] trait: graph construction
//! only needs "an envelope or a reason there is none", and tests substitute
//! a stub instead of decoding real files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use thiserror::Error;

/// Samples per envelope window at the source sample rate
pub const WINDOW_SIZE: usize = 4096;

/// Peak extraction errors
#[derive(Debug, Error)]
pub enum PeakError {
    /// File could not be opened or read
    #[error("Failed to read audio file: {0}")]
    Read(String),

    /// Container or codec not recognized, or no audio track present
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Decoding failed part way through the stream
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The envelope artifact could not be written
    #[error("Failed to write peaks artifact: {0}")]
    Artifact(String),
}

/// Normalized amplitude envelope of one audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Samples per window at the source sample rate
    pub window: usize,
    /// Per-window peak magnitude, normalized to [0, 1]
    pub peaks: Vec<f32>,
}

/// Capability to turn an audio file into an amplitude envelope
pub trait PeakComputer {
    fn compute(&self, path: &Path) -> Result<Envelope, PeakError>;
}

/// [`PeakComputer`] backed by symphonia's probe and codec registry
pub struct SymphoniaPeakComputer {
    window: usize,
}

impl SymphoniaPeakComputer {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Default for SymphoniaPeakComputer {
    fn default() -> Self {
        Self::new(WINDOW_SIZE)
    }
}

impl PeakComputer for SymphoniaPeakComputer {
    fn compute(&self, path: &Path) -> Result<Envelope, PeakError> {
        let samples = decode_mono(path)?;
        if samples.is_empty() {
            return Err(PeakError::Decode(format!(
                "no samples decoded from {}",
                path.display()
            )));
        }
        Ok(Envelope {
            window: self.window,
            peaks: envelope(&samples, self.window),
        })
    }
}

/// Reduce mono samples to a normalized per-window peak envelope
///
/// A silent input stays all-zero rather than dividing by a zero maximum.
pub fn envelope(samples: &[f32], window: usize) -> Vec<f32> {
    if samples.is_empty() || window == 0 {
        return Vec::new();
    }
    let mut peaks: Vec<f32> = samples
        .chunks(window)
        .map(|chunk| chunk.iter().fold(0.0f32, |peak, s| peak.max(s.abs())))
        .collect();
    let max = peaks.iter().fold(0.0f32, |max, &p| max.max(p));
    if max > 0.0 {
        for peak in &mut peaks {
            *peak /= max;
        }
    }
    peaks
}

/// Decode an audio file to mono f32 samples, averaging across channels
fn decode_mono(path: &Path) -> Result<Vec<f32>, PeakError> {
    let file = fs::File::open(path)
        .map_err(|e| PeakError::Read(format!("{}: {}", path.display(), e)))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PeakError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            PeakError::UnsupportedFormat(format!("no audio track in {}", path.display()))
        })?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PeakError::UnsupportedFormat(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(PeakError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder
            .decode(&packet)
            .map_err(|e| PeakError::Decode(e.to_string()))?;
        append_mono(&decoded, &mut samples);
    }
    Ok(samples)
}

/// Append one decoded buffer as channel-averaged mono samples
fn append_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    fn mix<S: Sample>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
    where
        f32: FromSample<S>,
    {
        let channels = buf.spec().channels.count();
        if channels == 0 {
            return;
        }
        for frame in 0..buf.frames() {
            let mut sum = 0.0f32;
            for channel in 0..channels {
                sum += f32::from_sample(buf.chan(channel)[frame]);
            }
            out.push(sum / channels as f32);
        }
    }

    match decoded {
        AudioBufferRef::U8(buf) => mix(buf, out),
        AudioBufferRef::U16(buf) => mix(buf, out),
        AudioBufferRef::U24(buf) => mix(buf, out),
        AudioBufferRef::U32(buf) => mix(buf, out),
        AudioBufferRef::S8(buf) => mix(buf, out),
        AudioBufferRef::S16(buf) => mix(buf, out),
        AudioBufferRef::S24(buf) => mix(buf, out),
        AudioBufferRef::S32(buf) => mix(buf, out),
        AudioBufferRef::F32(buf) => mix(buf, out),
        AudioBufferRef::F64(buf) => mix(buf, out),
    }
}

/// The published envelope: enough to render a waveform for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeaksArtifact {
    /// Audio file name the envelope was computed from
    pub source: String,
    /// Samples per window at the source sample rate
    pub window: usize,
    /// Per-window peak magnitude, normalized to [0, 1]
    pub peaks: Vec<f32>,
}

/// Artifact file name for an audio file stem
pub fn artifact_file_name(stem: &str) -> String {
    format!("{stem}.peaks.json")
}

/// Write the artifact as JSON, creating parent directories as needed
pub fn write_artifact(path: &Path, artifact: &PeaksArtifact) -> Result<(), PeakError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PeakError::Artifact(format!("{}: {}", parent.display(), e)))?;
    }
    let json = serde_json::to_vec_pretty(artifact)
        .map_err(|e| PeakError::Artifact(e.to_string()))?;
    fs::write(path, json).map_err(|e| PeakError::Artifact(format!("{}: {}", path.display(), e)))
}
