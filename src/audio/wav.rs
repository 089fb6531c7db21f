//! 16-bit PCM WAVE output
//!
//! Mono and stereo 16-bit files get the canonical 44-byte header: a 16-byte
//! `fmt ` chunk with format tag 1 followed by a single `data` chunk.

use std::io::{Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{RemixError, Result};

pub const BITS_PER_SAMPLE: u16 = 16;
pub const HEADER_LEN: usize = 44;

/// WAV format for interleaved 16-bit integer samples
pub fn pcm16_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Write interleaved samples as a complete WAV stream
pub fn write_pcm16<W: Write + Seek>(
    writer: W,
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let writer = WavWriter::new(writer, pcm16_spec(channels, sample_rate)).map_err(wav_error)?;
    write_samples(writer, samples)
}

/// Create (or truncate) `path` and write interleaved samples to it
pub fn save_pcm16(path: &Path, samples: &[i16], channels: u16, sample_rate: u32) -> Result<()> {
    let writer =
        WavWriter::create(path, pcm16_spec(channels, sample_rate)).map_err(wav_error)?;
    write_samples(writer, samples)
}

fn write_samples<W: Write + Seek>(mut writer: WavWriter<W>, samples: &[i16]) -> Result<()> {
    for &sample in samples {
        writer.write_sample(sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)
}

fn wav_error(e: hound::Error) -> RemixError {
    match e {
        hound::Error::IoError(io) => RemixError::Io(io),
        other => RemixError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}
