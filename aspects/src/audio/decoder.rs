//! Audio Decoding
//!
//! Decodes audio files to planar f32 PCM, channel as the leading axis.
//!
//! Uses symphonia for format-agnostic decoding (WAV, FLAC, MP3, AAC, etc.)

use crate::error::{AnalysisError, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decoded multi-channel waveform
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// One contiguous sample buffer per channel, range [-1.0, 1.0]
    pub channels: Vec<Vec<f32>>,
}

impl Waveform {
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Copy into a single contiguous row-major buffer of shape `[channels, frames]`
    pub fn to_tensor(&self) -> AudioTensor {
        let frames = self.frames();
        let mut data = Vec::with_capacity(self.channel_count() * frames);
        for channel in &self.channels {
            data.extend_from_slice(&channel[..frames.min(channel.len())]);
            data.resize(data.len() + frames.saturating_sub(channel.len()), 0.0);
        }
        AudioTensor {
            shape: [self.channel_count(), frames],
            data,
        }
    }
}

/// Contiguous `[channels, frames]` representation of a waveform
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTensor {
    pub shape: [usize; 2],
    pub data: Vec<f32>,
}

impl AudioTensor {
    /// Borrow one channel row
    pub fn row(&self, channel: usize) -> &[f32] {
        let frames = self.shape[1];
        &self.data[channel * frames..(channel + 1) * frames]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.shape[0]).map(move |c| self.row(c))
    }
}

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    pub waveform: Waveform,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Decode an audio file to planar f32 samples
///
/// **Algorithm:**
/// 1. Open file and probe format using symphonia
/// 2. Find default audio track
/// 3. Decode all packets, appending each channel to its own buffer
///
/// Packets that fail to decode are skipped; any other error is fatal.
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::NotFound(file_path.to_path_buf())
        } else {
            AnalysisError::Io(e)
        }
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create format hint from file extension
    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error(file_path, "probe format", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AnalysisError::Decode(format!("No audio track found in {}", file_path.display()))
        })?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::Decode(format!("Sample rate unknown for {}", file_path.display()))
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(file_path, "create decoder", e))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_error(file_path, "read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_planar(&decoded, &mut channels),
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(path = %file_path.display(), error = e, "Skipping corrupt packet");
            }
            Err(e) => return Err(decode_error(file_path, "decode packet", e)),
        }
    }

    if channels.is_empty() {
        return Err(AnalysisError::Decode(format!(
            "No audio frames decoded from {}",
            file_path.display()
        )));
    }

    let waveform = Waveform::new(channels);

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels = waveform.channel_count(),
        frames = waveform.frames(),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        waveform,
        sample_rate,
    })
}

fn decode_error(path: &Path, stage: &str, e: symphonia::core::errors::Error) -> AnalysisError {
    AnalysisError::Decode(format!("Failed to {} for {}: {}", stage, path.display(), e))
}

/// Append one decoded buffer to the per-channel outputs
fn append_planar(decoded: &AudioBufferRef, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::F32(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::F64(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::U8(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::U16(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::U24(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::U32(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::S8(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::S16(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::S24(buf) => copy_channels(&**buf, channels),
        AudioBufferRef::S32(buf) => copy_channels(&**buf, channels),
    }
}

fn copy_channels<S>(buf: &AudioBuffer<S>, channels: &mut Vec<Vec<f32>>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let count = buf.spec().channels.count();
    if channels.len() < count {
        channels.resize_with(count, Vec::new);
    }
    for (ch, out) in channels.iter_mut().enumerate().take(count) {
        out.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(AnalysisError::NotFound(_))));
    }

    #[test]
    fn test_decode_rejects_non_audio() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();

        let result = decode_audio_file(&path);
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_tensor_is_channel_major() {
        let waveform = Waveform::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let tensor = waveform.to_tensor();

        assert_eq!(tensor.shape, [2, 3]);
        assert_eq!(tensor.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(tensor.row(1), &[4.0, 5.0, 6.0]);
    }
}
