//! Remix - cached track analysis and PCM audio buffers
//!
//! Two independent halves:
//! 1. [`analysis`] - a lazily caching client for a remote track-analysis API.
//!    Each analysis field is fetched once on first access and memoized.
//! 2. [`audio`] - 16-bit PCM buffers that can be indexed by sample, by time,
//!    or by analysis segments, then reassembled and written out as WAV.

pub mod analysis;
pub mod audio;
pub mod error;

pub use analysis::{AnalysisField, AnalyzeApi, AnalyzeConfig, AudioAnalysis};
pub use audio::{get_pieces, load, AudioData, AudioIndex, Segment, TimeSpan};
pub use error::{RemixError, Result};
