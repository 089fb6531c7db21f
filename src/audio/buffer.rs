//! PCM audio buffer
//!
//! [`AudioData`] owns a fixed-capacity block of interleaved 16-bit samples
//! plus a write cursor used by [`AudioData::append`]. Capacity and cursor are
//! separate: a buffer allocated for 10 frames with 4 appended has `len() == 10`
//! and `write_cursor() == 4`.
//!
//! # Example
//! ```
//! use remix::audio::{AudioData, Segment};
//!
//! let tone: Vec<i16> = (0..8000).map(|i| (i % 100) as i16).collect();
//! let audio = AudioData::from_samples(tone, 1, 8000).unwrap();
//!
//! let half = audio.slice(0.0..0.5).unwrap();
//! assert_eq!(half.len(), 4000);
//!
//! let beat = audio.slice(Segment::new(0.25, 0.25)).unwrap();
//! assert_eq!(beat.len(), 2000);
//! ```

use std::io::{BufWriter, Seek, Write};
use std::ops::Add;
use std::path::{Path, PathBuf};

use crate::audio::index::{AudioIndex, Resolved};
use crate::audio::wav;
use crate::error::{RemixError, Result};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u16 = 2;

/// Allocation size of a buffer, in frames and channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub frames: usize,
    pub channels: u16,
}

impl Shape {
    pub fn new(frames: usize, channels: u16) -> Self {
        Self { frames, channels }
    }

    pub fn mono(frames: usize) -> Self {
        Self::new(frames, 1)
    }

    pub fn stereo(frames: usize) -> Self {
        Self::new(frames, 2)
    }
}

/// Result of indexing a buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// One frame: a single sample for mono audio, one per channel otherwise
    Frame(&'a [i16]),
    /// A copied sub-range
    Slice(AudioData),
}

/// Fixed-capacity interleaved 16-bit PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Interleaved samples; `None` until the buffer is given a size
    data: Option<Vec<i16>>,
    sample_rate: u32,
    channels: u16,
    /// Next free frame for `append`
    end_index: usize,
}

impl AudioData {
    /// General constructor
    ///
    /// - With a `shape`, that many frames are allocated (zeroed).
    /// - Without a shape but with a `source`, the source's size is allocated.
    /// - With neither, the buffer has no backing data.
    ///
    /// A source is copied to the start of the buffer and the write cursor is
    /// placed just after it.
    pub fn new(
        source: Option<&[i16]>,
        shape: Option<Shape>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self> {
        validate_format(sample_rate, channels)?;

        if let Some(shape) = shape {
            if shape.channels != channels {
                return Err(RemixError::invalid(format!(
                    "shape has {} channels but buffer was declared with {}",
                    shape.channels, channels
                )));
            }
        }

        let source_frames = match source {
            Some(samples) => Some(frames_in(samples, channels)?),
            None => None,
        };

        let capacity = match (shape, source_frames) {
            (Some(shape), _) => Some(shape.frames),
            (None, Some(frames)) => Some(frames),
            (None, None) => None,
        };

        let samples = match capacity {
            Some(frames) => Some(frames.checked_mul(channels as usize).ok_or_else(|| {
                RemixError::invalid(format!(
                    "{} frames of {}-channel audio is too large to allocate",
                    frames, channels
                ))
            })?),
            None => None,
        };

        let mut audio = Self {
            data: samples.map(|len| vec![0; len]),
            sample_rate,
            channels,
            end_index: 0,
        };

        if let (Some(samples), Some(frames)) = (source, source_frames) {
            let capacity = audio.len();
            if frames > capacity {
                return Err(RemixError::CapacityExceeded {
                    cursor: 0,
                    requested: frames,
                    capacity,
                });
            }
            if let Some(data) = audio.data.as_mut() {
                data[..samples.len()].copy_from_slice(samples);
            }
            audio.end_index = frames;
        }

        Ok(audio)
    }

    /// A buffer with no backing data
    pub fn uninitialized(sample_rate: u32, channels: u16) -> Self {
        Self {
            data: None,
            sample_rate,
            channels: channels.max(1),
            end_index: 0,
        }
    }

    /// A silent buffer of `frames` frames with the write cursor at 0
    pub fn with_capacity(frames: usize, channels: u16, sample_rate: u32) -> Result<Self> {
        Self::new(None, Some(Shape::new(frames, channels)), sample_rate, channels)
    }

    /// Take ownership of interleaved samples; the buffer is full
    pub fn from_samples(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Result<Self> {
        validate_format(sample_rate, channels)?;
        let frames = frames_in(&samples, channels)?;
        Ok(Self {
            data: Some(samples),
            sample_rate,
            channels,
            end_index: frames,
        })
    }

    /// Allocated frames, or 0 without backing data
    #[inline]
    pub fn len(&self) -> usize {
        self.data
            .as_ref()
            .map(|d| d.len() / self.channels as usize)
            .unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.data.is_some()
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames written so far through construction and `append`
    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.end_index
    }

    /// Frames still free after the write cursor
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.end_index)
    }

    /// Duration of the allocated capacity in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// All interleaved samples, including unwritten capacity
    pub fn samples(&self) -> Option<&[i16]> {
        self.data.as_deref()
    }

    /// Interleaved samples up to the write cursor
    pub fn written(&self) -> Option<&[i16]> {
        self.data
            .as_deref()
            .map(|d| &d[..self.end_index * self.channels as usize])
    }

    fn data(&self) -> Result<&[i16]> {
        self.data.as_deref().ok_or(RemixError::UninitializedBuffer)
    }

    /// Index the buffer by frame, time, range, or segment
    pub fn get(&self, index: impl Into<AudioIndex>) -> Result<Selection<'_>> {
        let data = self.data()?;
        match index.into().resolve(self.sample_rate, self.len())? {
            Resolved::Frame(frame) => Ok(Selection::Frame(self.frame_at(data, frame))),
            Resolved::Span(span) => Ok(Selection::Slice(self.copy_span(data, span))),
        }
    }

    /// A single frame
    ///
    /// Fails with `InvalidArgument` if the index describes a range.
    pub fn frame(&self, index: impl Into<AudioIndex>) -> Result<&[i16]> {
        let data = self.data()?;
        match index.into().resolve(self.sample_rate, self.len())? {
            Resolved::Frame(frame) => Ok(self.frame_at(data, frame)),
            Resolved::Span(span) => Err(RemixError::invalid(format!(
                "frame() needs a single position, got frames {}..{}",
                span.start, span.end
            ))),
        }
    }

    /// Copy a sub-range into a new buffer with the same format
    ///
    /// A single-frame index yields a one-frame buffer.
    pub fn slice(&self, index: impl Into<AudioIndex>) -> Result<AudioData> {
        let data = self.data()?;
        let span = match index.into().resolve(self.sample_rate, self.len())? {
            Resolved::Frame(frame) => frame..frame + 1,
            Resolved::Span(span) => span,
        };
        Ok(self.copy_span(data, span))
    }

    fn frame_at<'a>(&self, data: &'a [i16], frame: usize) -> &'a [i16] {
        let channels = self.channels as usize;
        &data[frame * channels..(frame + 1) * channels]
    }

    fn copy_span(&self, data: &[i16], span: std::ops::Range<usize>) -> AudioData {
        let channels = self.channels as usize;
        let samples = data[span.start * channels..span.end * channels].to_vec();
        AudioData {
            end_index: span.len(),
            data: Some(samples),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Join two buffers end to end
    ///
    /// Whole allocations are joined, including any unwritten capacity past
    /// either write cursor. A side without backing data contributes nothing.
    pub fn concat(&self, other: &AudioData) -> Result<AudioData> {
        match (self.data.as_ref(), other.data.as_ref()) {
            (None, None) => Err(RemixError::UninitializedBuffer),
            (None, Some(theirs)) => {
                AudioData::from_samples(theirs.clone(), other.channels, other.sample_rate)
            }
            (Some(ours), None) => {
                AudioData::from_samples(ours.clone(), self.channels, self.sample_rate)
            }
            (Some(ours), Some(theirs)) => {
                self.check_compatible(other)?;
                let mut joined = Vec::with_capacity(ours.len() + theirs.len());
                joined.extend_from_slice(ours);
                joined.extend_from_slice(theirs);
                AudioData::from_samples(joined, self.channels, self.sample_rate)
            }
        }
    }

    /// Copy all of `other` in at the write cursor and advance it
    ///
    /// Fails without modifying anything if `other` does not fit in the
    /// remaining capacity.
    pub fn append(&mut self, other: &AudioData) -> Result<()> {
        let theirs = other.data()?;
        self.check_compatible(other)?;

        let cursor = self.end_index;
        let capacity = self.len();
        let requested = other.len();
        let channels = self.channels as usize;

        let ours = self.data.as_mut().ok_or(RemixError::UninitializedBuffer)?;
        if cursor + requested > capacity {
            return Err(RemixError::CapacityExceeded {
                cursor,
                requested,
                capacity,
            });
        }

        ours[cursor * channels..(cursor + requested) * channels].copy_from_slice(theirs);
        self.end_index += requested;
        Ok(())
    }

    fn check_compatible(&self, other: &AudioData) -> Result<()> {
        if self.channels != other.channels {
            return Err(RemixError::invalid(format!(
                "cannot combine {}-channel audio with {}-channel audio",
                self.channels, other.channels
            )));
        }
        if self.sample_rate != other.sample_rate {
            return Err(RemixError::invalid(format!(
                "cannot combine {} Hz audio with {} Hz audio",
                self.sample_rate, other.sample_rate
            )));
        }
        Ok(())
    }

    /// Write the whole allocation as a 16-bit PCM WAV stream
    pub fn write_wav<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let data = self.data()?;
        wav::write_pcm16(writer, data, self.channels, self.sample_rate)
    }

    /// Save to a WAV file and return its path
    ///
    /// Without a path a new temporary `.wav` file is created. It is not
    /// deleted automatically; the caller owns it.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let data = self.data()?;

        let path = match path {
            Some(path) => {
                wav::save_pcm16(path, data, self.channels, self.sample_rate)?;
                path.to_path_buf()
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("remix-")
                    .suffix(".wav")
                    .tempfile()?;
                self.write_wav(BufWriter::new(file.as_file_mut()))?;
                let (_, path) = file.keep().map_err(|e| e.error)?;
                path
            }
        };

        tracing::info!(
            "Saved {} frames ({} ch, {} Hz) to {}",
            self.len(),
            self.channels,
            self.sample_rate,
            path.display()
        );
        Ok(path)
    }
}

impl Add for &AudioData {
    type Output = Result<AudioData>;

    fn add(self, other: Self) -> Self::Output {
        self.concat(other)
    }
}

impl Default for AudioData {
    fn default() -> Self {
        Self::uninitialized(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)
    }
}

fn validate_format(sample_rate: u32, channels: u16) -> Result<()> {
    if sample_rate == 0 {
        return Err(RemixError::invalid("sample rate must be positive"));
    }
    if channels == 0 {
        return Err(RemixError::invalid("channel count must be positive"));
    }
    Ok(())
}

fn frames_in(samples: &[i16], channels: u16) -> Result<usize> {
    let channels = channels as usize;
    if samples.len() % channels != 0 {
        return Err(RemixError::invalid(format!(
            "{} samples is not a whole number of {}-channel frames",
            samples.len(),
            channels
        )));
    }
    Ok(samples.len() / channels)
}

// ============================================================================
// Tests
// ============================================================================
