//! Audio normalization for uploaded voice recordings.
//!
//! Everything downstream (speech recognition, the debug store) works on mono
//! 16 kHz samples; this crate gets uploads into that shape.

pub mod error;
pub mod resample;
pub mod transcode;
pub mod wav;

pub use error::AudioError;
pub use transcode::{FFMPEG_ENV, FfmpegTranscoder, TARGET_SAMPLE_RATE_HZ};
pub use wav::{DecodedAudio, decode_wav, encode_wav_mono_pcm16, to_pcm_s16le};
