//! File decoding built on top of Symphonia.
//!
//! Inputs are opened as seekable files so containers that keep their metadata at the end
//! (most `.m4a` files put `moov` after `mdat`) can still be probed.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::audio::AudioBufferRef;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use super::resample::MonoResampler;

/// Turns an audio file into mono `f32` samples at [`super::TARGET_SAMPLE_RATE`].
pub trait SampleDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<f32>>;
}

/// The default [`SampleDecoder`], backed by Symphonia and rubato.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SampleDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<f32>> {
        decode_file(path)
    }
}

/// Decode the default audio track of `path` into normalized mono samples.
pub fn decode_file(path: &Path) -> Result<Vec<f32>> {
    let file =
        File::open(path).with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let hint_extension = path.extension().and_then(|ext| ext.to_str());
    let (mut format, track) = probe_and_pick_default_track(Box::new(file), hint_extension)
        .with_context(|| format!("failed to probe {}", path.display()))?;

    let mut decoder = make_decoder_for_track(&track)?;
    let mut resampler = MonoResampler::new();
    let mut samples = Vec::new();

    while let Some(packet) = next_packet(&mut format)? {
        // Ignore packets from other tracks (video, cover art, ...).
        if packet.track_id() != track.id {
            continue;
        }

        decode_packet_and_then(&mut decoder, &packet, |decoded| {
            resampler
                .push_decoded(&decoded, &mut samples)
                .context("audio pipeline failed while processing decoded samples")
        })?;
    }

    resampler
        .finalize(&mut samples)
        .context("audio pipeline failed during finalize")?;

    debug!(path = %path.display(), samples = samples.len(), "decoded audio");
    Ok(samples)
}

/// Probe the container and pick the track to transcribe.
///
/// The first track with a real codec and a known sample rate wins; recordings carry one audio
/// track, and the rate is needed before the resampler can be configured. `hint_extension`
/// (e.g. `"m4a"`) helps the probe with ambiguous containers.
fn probe_and_pick_default_track(
    source: Box<dyn MediaSource>,
    hint_extension: Option<&str>,
) -> Result<(Box<dyn FormatReader>, Track)> {
    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };
    let mss = MediaSourceStream::new(source, mss_opts);

    let mut hint = Hint::new();
    if let Some(ext) = hint_extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!(e))
        .context("failed to probe media stream")?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

/// Create a decoder for `track` from Symphonia's default codec registry.
///
/// Fails when the codec is unsupported or its parameters are invalid.
fn make_decoder_for_track(track: &Track) -> Result<Box<dyn Decoder>> {
    symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")
}

/// Read the next packet; `Ok(None)` means end of stream.
///
/// Symphonia reports a clean EOF as an `IoError`, so every IO error ends the stream. Other
/// errors are surfaced with context.
fn next_packet(format: &mut Box<dyn FormatReader>) -> Result<Option<Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        // EOF (`UnexpectedEof`) or a truncated file: keep what was decoded so far.
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

/// Decode a packet and hand the decoded buffer to `on_decoded`.
///
/// Returns `Ok(true)` when a buffer was produced and `on_decoded` ran, `Ok(false)` when the
/// packet was dropped, and `Err` for fatal decoder errors.
///
/// Error policy:
/// - `DecodeError`: the frame is corrupt; skip it and keep decoding
/// - `IoError`: the packet's data is gone; drop it, `next_packet` ends the loop
/// - anything else (unsupported feature, reset required) is fatal
fn decode_packet_and_then(
    decoder: &mut Box<dyn Decoder>,
    packet: &Packet,
    mut on_decoded: impl FnMut(AudioBufferRef<'_>) -> Result<()>,
) -> Result<bool> {
    match decoder.decode(packet) {
        Ok(buf) => {
            on_decoded(buf)?;
            Ok(true)
        }
        // A single bad AAC frame shouldn't cost the whole recording.
        Err(SymphoniaError::DecodeError(_)) => Ok(false),
        Err(SymphoniaError::IoError(_)) => Ok(false),
        Err(e) => Err(anyhow!(e)).context("decoder failure"),
    }
}
