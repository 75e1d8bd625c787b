//! Converts a compressed source recording into the WAV file the transcriber reads.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::audio::wav::write_wav;
use crate::audio::{SampleDecoder, SymphoniaDecoder};
use crate::error::{Error, Result};

/// What [`Converter::convert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// The target already existed and was left untouched.
    Skipped,
    /// The source was decoded and the target written.
    Converted,
}

/// Decodes a source file and writes it as mono 16 kHz PCM WAV.
pub struct Converter<D: SampleDecoder = SymphoniaDecoder> {
    decoder: D,
}

impl Converter<SymphoniaDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(SymphoniaDecoder)
    }
}

impl Default for Converter<SymphoniaDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SampleDecoder> Converter<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Convert `source` into `target`.
    ///
    /// Idempotent: when `target` already exists nothing is decoded or written. The WAV only
    /// appears at `target` once it is complete, so an interrupted run is converted again rather
    /// than skipped.
    pub fn convert(&self, source: &Path, target: &Path) -> Result<ConvertOutcome> {
        if target.exists() {
            info!("{} already exists. Skipping conversion.", target.display());
            return Ok(ConvertOutcome::Skipped);
        }

        let samples = self
            .decoder
            .decode(source)
            .with_context(|| format!("failed to decode {}", source.display()))
            .map_err(Error::conversion)?;

        write_wav(target, &samples).map_err(Error::conversion)?;

        info!("Conversion to WAV successful.");
        Ok(ConvertOutcome::Converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::partial_path;
    use crate::error::Stage;
    use hound::WavReader;
    use std::cell::Cell;
    use std::fs;

    struct FailingDecoder {
        calls: Cell<usize>,
    }

    impl SampleDecoder for FailingDecoder {
        fn decode(&self, _path: &Path) -> anyhow::Result<Vec<f32>> {
            self.calls.set(self.calls.get() + 1);
            anyhow::bail!("decoder must not be invoked")
        }
    }

    struct ToneDecoder;

    impl SampleDecoder for ToneDecoder {
        fn decode(&self, _path: &Path) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.25; 1600])
        }
    }

    #[test]
    fn existing_target_is_left_untouched() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("call.wav");
        fs::write(&target, b"not really a wav")?;

        let decoder = FailingDecoder {
            calls: Cell::new(0),
        };
        let converter = Converter::with_decoder(decoder);

        let outcome = converter.convert(&dir.path().join("call.m4a"), &target)?;

        assert_eq!(outcome, ConvertOutcome::Skipped);
        assert_eq!(converter.decoder.calls.get(), 0);
        assert_eq!(fs::read(&target)?, b"not really a wav");
        Ok(())
    }

    #[test]
    fn writes_decoded_samples_as_wav() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("call.wav");

        let outcome =
            Converter::with_decoder(ToneDecoder).convert(&dir.path().join("call.m4a"), &target)?;

        assert_eq!(outcome, ConvertOutcome::Converted);
        let reader = WavReader::open(&target)?;
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.duration(), 1600);
        Ok(())
    }

    #[test]
    fn interrupted_conversion_is_redone_not_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("call.wav");
        // What a killed run leaves behind: a header and no finalized data.
        fs::write(partial_path(&target), b"RIFF\0\0\0\0WAVEfmt ")?;

        let converter = Converter::with_decoder(ToneDecoder);
        let outcome = converter.convert(&dir.path().join("call.m4a"), &target)?;

        assert_eq!(outcome, ConvertOutcome::Converted);
        assert_eq!(WavReader::open(&target)?.duration(), 1600);
        assert!(!partial_path(&target).exists());

        let again = converter.convert(&dir.path().join("call.m4a"), &target)?;
        assert_eq!(again, ConvertOutcome::Skipped);
        Ok(())
    }

    #[test]
    fn decode_failure_is_a_conversion_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("call.wav");
        let converter = Converter::with_decoder(FailingDecoder {
            calls: Cell::new(0),
        });

        let err = converter
            .convert(&dir.path().join("call.m4a"), &target)
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Conversion);
        assert!(err.to_string().contains("failed to decode"));
        assert!(err.to_string().contains("decoder must not be invoked"));
        assert!(!target.exists());
        Ok(())
    }

    #[test]
    fn missing_source_fails_with_real_decoder() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = Converter::new()
            .convert(&dir.path().join("missing.m4a"), &dir.path().join("out.wav"))
            .unwrap_err();

        assert!(err.to_string().contains("failed to open audio file"));
        Ok(())
    }
}
