//! Audio buffer tests
//!
//! End-to-end behavior of indexing, assembly, and WAV export.

use approx::assert_relative_eq;
use remix::audio::{AudioData, Selection, Segment, ASSEMBLY_PADDING_FRAMES};
use remix::{get_pieces, RemixError};

/// Stereo buffer where each frame holds its index (mod 30000) in both channels
fn stereo_counter(frames: usize, sample_rate: u32) -> AudioData {
    let samples = (0..frames)
        .flat_map(|i| {
            let v = (i % 30000) as i16;
            [v, v]
        })
        .collect();
    AudioData::from_samples(samples, 2, sample_rate).unwrap()
}

#[test]
fn test_capacity_ten_cursor_four() {
    let mut audio = AudioData::with_capacity(10, 2, 44100).unwrap();
    audio.append(&stereo_counter(4, 44100)).unwrap();
    assert_eq!(audio.len(), 10);
    assert_eq!(audio.write_cursor(), 4);
}

#[test]
fn test_overflowing_append_fails() {
    let mut audio = AudioData::with_capacity(10, 2, 44100).unwrap();
    audio.append(&stereo_counter(4, 44100)).unwrap();

    let err = audio.append(&stereo_counter(7, 44100)).unwrap_err();
    assert!(matches!(err, RemixError::CapacityExceeded { .. }));
    assert_eq!(audio.write_cursor(), 4);
}

#[test]
fn test_one_second_is_frame_44100() {
    let audio = stereo_counter(44100 * 2, 44100);
    assert_eq!(audio.frame(1.0).unwrap(), audio.frame(44100).unwrap());
    assert_eq!(audio.get(1.0).unwrap(), audio.get(44100).unwrap());
}

#[test]
fn test_segment_pair_selects_span() {
    let audio = stereo_counter(44100 * 3, 44100);
    let first = Segment::new(1.0, 0.5);
    let last = Segment::new(2.0, 0.5);

    let Selection::Slice(span) = audio.get((first, last)).unwrap() else {
        panic!("segment range should select a slice");
    };
    assert_eq!(span.len(), 110250 - 44100);
    assert_eq!(span.frame(0).unwrap(), audio.frame(44100).unwrap());
    assert_eq!(span.sample_rate(), 44100);
}

#[test]
fn test_out_of_range_sample() {
    let audio = stereo_counter(100, 8000);
    assert!(matches!(
        audio.frame(100),
        Err(RemixError::IndexError { index: 100, len: 100 })
    ));
}

#[test]
fn test_assemble_two_seconds() {
    let audio = stereo_counter(44100 * 3, 44100);
    let segments = [Segment::new(0.0, 1.0), Segment::new(1.0, 1.0)];

    let assembled = get_pieces(&audio, &segments).unwrap();
    assert_eq!(assembled.len(), 2 * 44100 + ASSEMBLY_PADDING_FRAMES);
    assert_eq!(assembled.write_cursor(), 2 * 44100);
    assert_eq!(assembled.channels(), 2);
    assert_eq!(assembled.frame(44100).unwrap(), audio.frame(44100).unwrap());
}

#[test]
fn test_save_mono_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    let samples: Vec<i16> = (0..100).collect();
    let audio = AudioData::from_samples(samples.clone(), 1, 8000).unwrap();

    audio.save(Some(&path)).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let byte_rate = u32::from_le_bytes(bytes[28..32].try_into().unwrap());
    let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
    assert_eq!(byte_rate, 8000 * 2 * 1);
    assert_eq!(data_len, 200);

    let mut reader = hound::WavReader::open(&path).unwrap();
    assert_relative_eq!(
        reader.duration() as f64 / reader.spec().sample_rate as f64,
        audio.duration_secs()
    );
    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, samples);
}

#[test]
fn test_save_writes_unused_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("padded.wav");
    let mut audio = AudioData::with_capacity(50, 2, 8000).unwrap();
    audio.append(&stereo_counter(10, 8000)).unwrap();

    audio.save(Some(&path)).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.duration(), 50);
}

#[test]
fn test_assembled_audio_round_trips_through_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assembled.wav");
    let audio = stereo_counter(8000, 8000);
    let assembled = get_pieces(&audio, &[Segment::new(0.5, 0.25)]).unwrap();
    assembled.save(Some(&path)).unwrap();

    let loaded = remix::load(
        &path,
        Some(remix::audio::TranscodeSettings::new(8000, 2)),
    )
    .unwrap();
    assert_eq!(loaded.len(), assembled.len());
    assert_eq!(loaded.frame(0).unwrap(), &[4000, 4000]);
}
