//! Reassembling segments into a single buffer

use crate::audio::buffer::AudioData;
use crate::audio::index::{seconds_to_frames, AudioIndex, TimeSpan};
use crate::error::{RemixError, Result};

/// Extra frames allocated past the summed segment durations
pub const ASSEMBLY_PADDING_FRAMES: usize = 100_000;

/// Cut each segment out of `source` and join them, in order
///
/// The result is allocated for the total segment duration plus
/// [`ASSEMBLY_PADDING_FRAMES`]; its write cursor marks the audio actually
/// written.
pub fn get_pieces<S: TimeSpan>(source: &AudioData, segments: &[S]) -> Result<AudioData> {
    if !source.is_initialized() {
        return Err(RemixError::UninitializedBuffer);
    }

    let sample_rate = source.sample_rate();
    let frames: usize = segments
        .iter()
        .map(|s| seconds_to_frames(s.duration(), sample_rate))
        .sum();

    let mut assembled = AudioData::with_capacity(
        frames + ASSEMBLY_PADDING_FRAMES,
        source.channels(),
        sample_rate,
    )?;

    for segment in segments {
        let piece = source.slice(AudioIndex::segment(segment))?;
        assembled.append(&piece)?;
    }

    tracing::debug!(
        "Assembled {} segments: {} frames written, {} allocated",
        segments.len(),
        assembled.write_cursor(),
        assembled.len()
    );
    Ok(assembled)
}
