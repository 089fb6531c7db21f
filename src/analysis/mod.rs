//! Track Analysis Module
//!
//! Lazily cached access to a remote audio-analysis service:
//! - Closed table of analysis fields
//! - Remote API seam with HTTP and mock implementations
//! - Per-field memoizing cache

pub mod cache;
pub mod config;
pub mod field;
pub mod mock;
pub mod remote;

pub use cache::AudioAnalysis;
pub use config::AnalyzeConfig;
pub use field::AnalysisField;
pub use remote::{parse_thing_id, AnalyzeApi, HttpAnalyzeApi};
