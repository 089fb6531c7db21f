//! Loading audio files into [`AudioData`]
//!
//! Arbitrary formats are first transcoded to 44.1kHz stereo WAV by an
//! external `ffmpeg`, then decoded as 16-bit PCM. The transcoded file lives
//! in a temporary file that is removed when loading finishes.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use hound::{SampleFormat, WavReader};
use regex::Regex;

use crate::audio::buffer::{AudioData, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{RemixError, Result};

/// Sample rate and channel count of decoded audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeSettings {
    pub sample_rate: u32,
    pub channels: u16,
}

impl TranscodeSettings {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Read settings from ffmpeg's stream description
    ///
    /// Looks for lines like
    /// `Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 44100 Hz, stereo, s16, 1411 kb/s`.
    /// Anything not found keeps its default (44100 Hz, stereo).
    pub fn from_ffmpeg_output(output: &str) -> Self {
        static HZ_RE: OnceLock<Regex> = OnceLock::new();
        let hz = HZ_RE.get_or_init(|| Regex::new(r"(\d+)\s*Hz").expect("valid sample rate regex"));

        let mut settings = Self::default();
        for line in output.lines() {
            if !(line.contains("Stream #0") && line.contains("Audio")) {
                continue;
            }
            for part in line.split(", ") {
                if let Some(rate) = hz
                    .captures(part)
                    .and_then(|caps| caps[1].parse::<u32>().ok())
                {
                    settings.sample_rate = rate;
                } else if part.contains("stereo") {
                    settings.channels = 2;
                } else if part.contains("mono") {
                    settings.channels = 1;
                }
            }
        }
        settings
    }
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Runs the external ffmpeg binary
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
}

impl Transcoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `REMIX_FFMPEG_PATH`, falling back to `ffmpeg` on the PATH
    pub fn from_env() -> Self {
        Self::new(std::env::var("REMIX_FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".into()))
    }

    /// Convert `input` to a WAV file at `output` with the given settings
    pub fn transcode(&self, input: &Path, output: &Path, settings: TranscodeSettings) -> Result<()> {
        tracing::info!(
            "{} -y -i {} -ar {} -ac {} {}",
            self.program.display(),
            input.display(),
            settings.sample_rate,
            settings.channels,
            output.display()
        );

        let result = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-ar")
            .arg(settings.sample_rate.to_string())
            .arg("-ac")
            .arg(settings.channels.to_string())
            .arg(output)
            .output()
            .map_err(|e| RemixError::DecodeError {
                reason: format!("cannot run {}: {}", self.program.display(), e),
                source: Some(Box::new(e)),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
            return Err(RemixError::decode(format!(
                "transcoding {} failed ({}): {}",
                input.display(),
                result.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }
        Ok(())
    }

    /// ffmpeg's description of a file's streams
    ///
    /// ffmpeg exits non-zero when given no output, so only a failure to run
    /// at all is an error.
    pub fn probe(&self, path: &Path) -> Result<String> {
        let result = Command::new(&self.program)
            .arg("-i")
            .arg(path)
            .output()
            .map_err(|e| RemixError::DecodeError {
                reason: format!("cannot run {}: {}", self.program.display(), e),
                source: Some(Box::new(e)),
            })?;

        let mut description = String::from_utf8_lossy(&result.stdout).into_owned();
        description.push_str(&String::from_utf8_lossy(&result.stderr));
        Ok(description)
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Load an audio file
///
/// With `target` unset the file is transcoded to 44.1kHz stereo first and
/// the actual format is read back from ffmpeg. With `target` set the file
/// must already be a 16-bit WAV in that format.
pub fn load(path: &Path, target: Option<TranscodeSettings>) -> Result<AudioData> {
    load_with(&Transcoder::from_env(), path, target)
}

/// [`load`] with an explicit transcoder
pub fn load_with(
    transcoder: &Transcoder,
    path: &Path,
    target: Option<TranscodeSettings>,
) -> Result<AudioData> {
    if let Some(settings) = target {
        return decode(path, settings);
    }

    let temp = tempfile::Builder::new()
        .prefix("remix-")
        .suffix(".wav")
        .tempfile()?;
    transcoder.transcode(path, temp.path(), TranscodeSettings::default())?;

    let settings = TranscodeSettings::from_ffmpeg_output(&transcoder.probe(temp.path())?);
    tracing::debug!(
        "Transcoded {} to {} Hz, {} channel(s)",
        path.display(),
        settings.sample_rate,
        settings.channels
    );
    decode(temp.path(), settings)
}

/// Decode a 16-bit PCM WAV file, trusting `settings` for its format
///
/// The sample count must equal frames times `settings.channels`.
pub fn decode(path: &Path, settings: TranscodeSettings) -> Result<AudioData> {
    let mut reader = WavReader::open(path).map_err(|e| RemixError::DecodeError {
        reason: format!("cannot open {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(RemixError::decode(format!(
            "{} is {}-bit {:?}, expected 16-bit PCM",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let frames = reader.duration() as usize;
    let expected = frames * settings.channels as usize;

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()
        .map_err(|e| RemixError::DecodeError {
            reason: format!("failed to read samples from {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        })?;

    if samples.len() != expected {
        return Err(RemixError::decode(format!(
            "{} holds {} samples, expected {} ({} frames x {} channels)",
            path.display(),
            samples.len(),
            expected,
            frames,
            settings.channels
        )));
    }

    AudioData::from_samples(samples, settings.channels, settings.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav;

    const FFMPEG_PROBE: &str = "\
ffmpeg version 4.4.2 Copyright (c) 2000-2021 the FFmpeg developers
Input #0, wav, from '/tmp/remix-abc.wav':
  Duration: 00:03:12.04, bitrate: 705 kb/s
  Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 22050 Hz, mono, s16, 352 kb/s
At least one output file must be specified";

    fn write_wav(path: &Path, samples: &[i16], channels: u16, sample_rate: u32) {
        wav::save_pcm16(path, samples, channels, sample_rate).unwrap();
    }

    #[test]
    fn test_settings_from_probe() {
        let settings = TranscodeSettings::from_ffmpeg_output(FFMPEG_PROBE);
        assert_eq!(settings, TranscodeSettings::new(22050, 1));
    }

    #[test]
    fn test_settings_default_when_no_stream_line() {
        let settings = TranscodeSettings::from_ffmpeg_output("No such file or directory");
        assert_eq!(settings, TranscodeSettings::new(44100, 2));
    }

    #[test]
    fn test_settings_ignore_video_streams() {
        let output = "  Stream #0:0: Video: h264, yuv420p, 1280x720, 30 fps\n  \
                      Stream #0:1: Audio: aac, 48000 Hz, stereo, fltp";
        assert_eq!(
            TranscodeSettings::from_ffmpeg_output(output),
            TranscodeSettings::new(48000, 2)
        );
    }

    #[test]
    fn test_decode_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, &[1, -1, 2, -2, 3, -3], 2, 44100);

        let audio = decode(&path, TranscodeSettings::new(44100, 2)).unwrap();
        assert_eq!(audio.len(), 3);
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.write_cursor(), 3);
        assert_eq!(audio.frame(2).unwrap(), &[3, -3]);
    }

    #[test]
    fn test_decode_channel_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, &[1, 2, 3, 4], 1, 8000);

        let err = decode(&path, TranscodeSettings::new(8000, 2)).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_ERROR");
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode(Path::new("/nonexistent/remix.wav"), TranscodeSettings::default())
            .unwrap_err();
        assert!(matches!(err, RemixError::DecodeError { .. }));
    }

    #[test]
    fn test_decode_rejects_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(decode(&path, TranscodeSettings::new(8000, 1)).is_err());
    }

    #[test]
    fn test_load_with_target_skips_transcoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ready.wav");
        write_wav(&path, &[5, 6, 7], 1, 16000);

        let transcoder = Transcoder::new("/nonexistent/ffmpeg");
        let audio = load_with(&transcoder, &path, Some(TranscodeSettings::new(16000, 1))).unwrap();
        assert_eq!(audio.sample_rate(), 16000);
        assert_eq!(audio.samples().unwrap(), &[5, 6, 7]);
    }

    /// Shell stand-in for ffmpeg: `-y` copies `transcoded` to the output
    /// argument, `-i` alone prints a stream line to stderr and fails.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, transcoded: &Path, stream: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffmpeg");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 if [ \"$1\" = \"-y\" ]; then\n\
                 \x20 cp '{}' \"$8\"\n\
                 \x20 exit 0\n\
                 fi\n\
                 echo '{}' >&2\n\
                 exit 1\n",
                transcoded.display(),
                stream
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_load_reads_format_from_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let transcoded = dir.path().join("transcoded.wav");
        write_wav(&transcoded, &[1, 2, 3, 4], 1, 8000);
        let ffmpeg = fake_ffmpeg(
            dir.path(),
            &transcoded,
            "  Stream #0:0: Audio: pcm_s16le, 8000 Hz, mono, s16",
        );

        let audio = load_with(&Transcoder::new(ffmpeg), Path::new("in.mp3"), None).unwrap();
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.samples().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(audio.write_cursor(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_rejects_reported_channel_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let transcoded = dir.path().join("transcoded.wav");
        write_wav(&transcoded, &[1, 2, 3], 1, 8000);
        let ffmpeg = fake_ffmpeg(
            dir.path(),
            &transcoded,
            "  Stream #0:0: Audio: pcm_s16le, 8000 Hz, stereo, s16",
        );

        let err = load_with(&Transcoder::new(ffmpeg), Path::new("in.mp3"), None).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_ERROR");
    }

    #[test]
    fn test_missing_transcoder_is_decode_error() {
        let transcoder = Transcoder::new("/nonexistent/ffmpeg");
        let err = load_with(&transcoder, Path::new("song.mp3"), None).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_ERROR");
    }
}
