use crate::error::AudioError;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate_hz: u32,
    /// Mono samples in [-1, 1]; multi-channel input is averaged.
    pub samples: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleFormat {
    Int,
    Float,
}

#[derive(Debug, Clone, Copy)]
struct WavFormat {
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn unsupported(msg: impl Into<String>) -> AudioError {
    AudioError::UnsupportedWav(msg.into())
}

fn le_u16(b: &[u8], at: usize) -> Result<u16, AudioError> {
    b.get(at..at + 2)
        .map(|s| u16::from_le_bytes([s[0], s[1]]))
        .ok_or_else(|| unsupported("truncated header"))
}

fn le_u32(b: &[u8], at: usize) -> Result<u32, AudioError> {
    b.get(at..at + 4)
        .map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
        .ok_or_else(|| unsupported("truncated header"))
}

pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, AudioError> {
    if !is_wav(bytes) {
        return Err(unsupported("not a RIFF/WAVE file"));
    }

    let mut pos = 12usize;
    let mut fmt: Option<WavFormat> = None;
    let mut data: Option<&[u8]> = None;
    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_size = le_u32(bytes, pos + 4)? as usize;
        let start = pos + 8;
        // Streaming writers (ffmpeg to a pipe) leave the data size unset.
        let end = start.saturating_add(chunk_size).min(bytes.len());

        if chunk_id == b"fmt " {
            if chunk_size < 16 {
                return Err(unsupported("fmt chunk too short"));
            }
            let mut audio_format = le_u16(bytes, start)?;
            if audio_format == 0xFFFE && chunk_size >= 26 {
                // WAVE_FORMAT_EXTENSIBLE: the real tag opens the sub-format GUID.
                audio_format = le_u16(bytes, start + 24)?;
            }
            let format = match audio_format {
                1 => SampleFormat::Int,
                3 => SampleFormat::Float,
                other => return Err(unsupported(format!("audio_format={other}"))),
            };
            fmt = Some(WavFormat {
                format,
                channels: le_u16(bytes, start + 2)?,
                sample_rate: le_u32(bytes, start + 4)?,
                bits_per_sample: le_u16(bytes, start + 14)?,
            });
        } else if chunk_id == b"data" && data.is_none() {
            data = Some(&bytes[start..end]);
        }

        pos = end.saturating_add(chunk_size % 2);
    }

    let fmt = fmt.ok_or_else(|| unsupported("missing fmt chunk"))?;
    let data = data.ok_or_else(|| unsupported("missing data chunk"))?;
    if fmt.channels == 0 || fmt.sample_rate == 0 {
        return Err(unsupported("zero channels or sample rate"));
    }

    let width = match (fmt.format, fmt.bits_per_sample) {
        (SampleFormat::Int, 8 | 16 | 24 | 32) | (SampleFormat::Float, 32) => {
            fmt.bits_per_sample as usize / 8
        }
        (f, bits) => return Err(unsupported(format!("{f:?} with {bits} bits"))),
    };

    let frame = width * fmt.channels as usize;
    let mut samples = Vec::with_capacity(data.len() / frame);
    for chunk in data.chunks_exact(frame) {
        let sum: f32 = chunk
            .chunks_exact(width)
            .map(|s| decode_sample(s, fmt.format))
            .sum();
        samples.push(sum / fmt.channels as f32);
    }

    Ok(DecodedAudio {
        sample_rate_hz: fmt.sample_rate,
        samples,
    })
}

fn decode_sample(s: &[u8], format: SampleFormat) -> f32 {
    match (format, s.len()) {
        (SampleFormat::Int, 1) => (s[0] as f32 - 128.0) / 128.0,
        (SampleFormat::Int, 2) => i16::from_le_bytes([s[0], s[1]]) as f32 / 32_768.0,
        (SampleFormat::Int, 3) => {
            let v = i32::from_le_bytes([0, s[0], s[1], s[2]]) >> 8;
            v as f32 / 8_388_608.0
        }
        (SampleFormat::Int, 4) => {
            i32::from_le_bytes([s[0], s[1], s[2], s[3]]) as f32 / 2_147_483_648.0
        }
        (SampleFormat::Float, 4) => f32::from_le_bytes([s[0], s[1], s[2], s[3]]),
        _ => 0.0,
    }
}

/// Little-endian 16-bit PCM, clamped.
pub fn to_pcm_s16le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn encode_wav_mono_pcm16(samples: &[f32], sample_rate_hz: u32) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let audio_format: u16 = 1; // PCM

    let byte_rate = sample_rate_hz * num_channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = num_channels * (bits_per_sample / 8);

    let pcm = to_pcm_s16le(samples);
    let data_bytes_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_bytes_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&audio_format.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes_len.to_le_bytes());
    out.extend_from_slice(&pcm);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stereo_pcm16(frames: &[(i16, i16)], rate: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for (l, r) in frames {
            data.extend_from_slice(&l.to_le_bytes());
            data.extend_from_slice(&r.to_le_bytes());
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * 4).to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    #[test]
    fn encoded_wav_decodes_back() {
        let wav = encode_wav_mono_pcm16(&[0.0, 0.5, -0.5], 16_000);
        assert!(wav.starts_with(b"RIFF"));
        let decoded = decode_wav(&wav).unwrap();
        assert_eq!(decoded.sample_rate_hz, 16_000);
        assert_eq!(decoded.samples.len(), 3);
        assert_abs_diff_eq!(decoded.samples[1], 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(decoded.samples[2], -0.5, epsilon = 1e-3);
    }

    #[test]
    fn stereo_is_downmixed() {
        let wav = stereo_pcm16(&[(16_384, -16_384), (16_384, 16_384)], 44_100);
        let decoded = decode_wav(&wav).unwrap();
        assert_eq!(decoded.sample_rate_hz, 44_100);
        assert_abs_diff_eq!(decoded.samples[0], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(decoded.samples[1], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn rejects_non_wav() {
        assert!(decode_wav(b"ID3\x04\x00\x00").is_err());
        assert!(!is_wav(b"OggS"));
    }

    #[test]
    fn pcm_conversion_clamps() {
        let pcm = to_pcm_s16le(&[2.0, -2.0]);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -i16::MAX);
    }
}
