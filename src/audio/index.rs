//! Buffer indexing
//!
//! Audio can be addressed by frame, by time, or by analysis segments. All of
//! these are resolved once into a frame index or a frame range before any
//! buffer logic runs.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{RemixError, Result};

/// Anything with a start time and a duration, in seconds
///
/// Implemented by analysis results (beats, bars, segments...) so they can be
/// used directly to cut audio.
pub trait TimeSpan {
    fn start(&self) -> f64;
    fn duration(&self) -> f64;

    fn end(&self) -> f64 {
        self.start() + self.duration()
    }
}

impl<T: TimeSpan + ?Sized> TimeSpan for &T {
    fn start(&self) -> f64 {
        (**self).start()
    }

    fn duration(&self) -> f64 {
        (**self).duration()
    }
}

/// A plain time span
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub duration: f64,
}

impl Segment {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn from_span<S: TimeSpan + ?Sized>(span: &S) -> Self {
        Self {
            start: span.start(),
            duration: span.duration(),
        }
    }
}

impl TimeSpan for Segment {
    fn start(&self) -> f64 {
        self.start
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}

/// A position or range within an audio buffer
#[derive(Debug, Clone, PartialEq)]
pub enum AudioIndex {
    /// A single frame
    Sample(usize),
    /// A single frame at a time in seconds, rounded to the nearest frame
    Time(f64),
    /// Half-open frame range
    SampleRange(Range<usize>),
    /// Half-open range in seconds, truncated to frames
    TimeRange(Range<f64>),
    /// The span covered by one segment
    Segment(Segment),
    /// From the start of the first segment to the end of the second
    SegmentRange(Segment, Segment),
}

/// An [`AudioIndex`] resolved against a concrete buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Frame(usize),
    Span(Range<usize>),
}

impl AudioIndex {
    pub fn segment<S: TimeSpan + ?Sized>(span: &S) -> Self {
        AudioIndex::Segment(Segment::from_span(span))
    }

    pub fn segment_range<S: TimeSpan + ?Sized, T: TimeSpan + ?Sized>(first: &S, last: &T) -> Self {
        AudioIndex::SegmentRange(Segment::from_span(first), Segment::from_span(last))
    }

    /// Resolve to a frame or a frame range for a buffer of `len` frames
    ///
    /// Single frames must be in bounds. Ranges are clamped to the buffer,
    /// and a range that ends before it starts is empty.
    pub fn resolve(&self, sample_rate: u32, len: usize) -> Result<Resolved> {
        match self {
            AudioIndex::Sample(index) => check_frame(*index, len),
            AudioIndex::Time(secs) => {
                if !secs.is_finite() || *secs < 0.0 {
                    return Err(RemixError::invalid(format!(
                        "time index must be a non-negative number of seconds, got {}",
                        secs
                    )));
                }
                let index = (secs * sample_rate as f64).round() as usize;
                check_frame(index, len)
            }
            AudioIndex::SampleRange(range) => Ok(clamp_span(range.start, range.end, len)),
            AudioIndex::TimeRange(range) => Ok(clamp_span(
                seconds_to_frames(range.start, sample_rate),
                seconds_to_frames(range.end, sample_rate),
                len,
            )),
            AudioIndex::Segment(segment) => Ok(clamp_span(
                seconds_to_frames(segment.start, sample_rate),
                seconds_to_frames(segment.end(), sample_rate),
                len,
            )),
            AudioIndex::SegmentRange(first, last) => Ok(clamp_span(
                seconds_to_frames(first.start, sample_rate),
                seconds_to_frames(last.end(), sample_rate),
                len,
            )),
        }
    }
}

/// Seconds to frames, truncating. Negative and NaN times map to frame 0.
pub fn seconds_to_frames(secs: f64, sample_rate: u32) -> usize {
    (secs * sample_rate as f64) as usize
}

fn check_frame(index: usize, len: usize) -> Result<Resolved> {
    if index < len {
        Ok(Resolved::Frame(index))
    } else {
        Err(RemixError::IndexError { index, len })
    }
}

fn clamp_span(start: usize, end: usize, len: usize) -> Resolved {
    let end = end.min(len);
    let start = start.min(end);
    Resolved::Span(start..end)
}

impl From<usize> for AudioIndex {
    fn from(index: usize) -> Self {
        AudioIndex::Sample(index)
    }
}

impl From<f64> for AudioIndex {
    fn from(secs: f64) -> Self {
        AudioIndex::Time(secs)
    }
}

impl From<Range<usize>> for AudioIndex {
    fn from(range: Range<usize>) -> Self {
        AudioIndex::SampleRange(range)
    }
}

impl From<Range<f64>> for AudioIndex {
    fn from(range: Range<f64>) -> Self {
        AudioIndex::TimeRange(range)
    }
}

impl From<Segment> for AudioIndex {
    fn from(segment: Segment) -> Self {
        AudioIndex::Segment(segment)
    }
}

impl From<&Segment> for AudioIndex {
    fn from(segment: &Segment) -> Self {
        AudioIndex::Segment(*segment)
    }
}

impl From<(Segment, Segment)> for AudioIndex {
    fn from((first, last): (Segment, Segment)) -> Self {
        AudioIndex::SegmentRange(first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    #[test]
    fn test_time_index_matches_sample_index() {
        let len = SR as usize * 2;
        assert_eq!(
            AudioIndex::Time(1.0).resolve(SR, len).unwrap(),
            AudioIndex::Sample(44100).resolve(SR, len).unwrap()
        );
    }

    #[test]
    fn test_time_index_rounds() {
        // 10.6 frames in
        let secs = 10.6 / SR as f64;
        assert_eq!(
            AudioIndex::Time(secs).resolve(SR, 100).unwrap(),
            Resolved::Frame(11)
        );
    }

    #[test]
    fn test_time_range_truncates() {
        let range = 10.6 / SR as f64..20.9 / SR as f64;
        assert_eq!(
            AudioIndex::TimeRange(range).resolve(SR, 100).unwrap(),
            Resolved::Span(10..20)
        );
    }

    #[test]
    fn test_segment_range_spans_both_segments() {
        let first = Segment::new(1.0, 0.5);
        let last = Segment::new(2.0, 0.5);
        let index = AudioIndex::segment_range(&first, &last);
        assert_eq!(
            index.resolve(SR, SR as usize * 3).unwrap(),
            Resolved::Span(44100..110250)
        );
    }

    #[test]
    fn test_segment_is_half_open() {
        let index = AudioIndex::from(Segment::new(0.5, 0.25));
        assert_eq!(
            index.resolve(SR, SR as usize).unwrap(),
            Resolved::Span(22050..33075)
        );
    }

    #[test]
    fn test_out_of_range_frame() {
        let err = AudioIndex::Sample(10).resolve(SR, 10).unwrap_err();
        assert!(matches!(err, RemixError::IndexError { index: 10, len: 10 }));
    }

    #[test]
    fn test_negative_time_rejected() {
        assert!(AudioIndex::Time(-1.0).resolve(SR, 10).is_err());
    }

    #[test]
    fn test_ranges_clamp() {
        assert_eq!(
            AudioIndex::SampleRange(5..50).resolve(SR, 10).unwrap(),
            Resolved::Span(5..10)
        );
        assert_eq!(
            AudioIndex::SampleRange(Range { start: 8, end: 3 }).resolve(SR, 10).unwrap(),
            Resolved::Span(3..3)
        );
    }
}
