//! Audio Module
//!
//! 16-bit PCM audio handling:
//! - Fixed-capacity buffers with an append cursor
//! - Indexing by frame, time, or segment
//! - WAV export and ffmpeg-backed loading
//! - Reassembly of segment lists

pub mod assemble;
pub mod buffer;
pub mod index;
pub mod load;
pub mod wav;

pub use assemble::{get_pieces, ASSEMBLY_PADDING_FRAMES};
pub use buffer::{AudioData, Selection, Shape, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
pub use index::{AudioIndex, Resolved, Segment, TimeSpan};
pub use load::{decode, load, load_with, TranscodeSettings, Transcoder};
