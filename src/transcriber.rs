//! Model load → inference → SubRip output, timed as one unit.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use crate::backends::whisper::WhisperLoader;
use crate::engine::{ModelLoader, SpeechEngine};
use crate::error::Error;
use crate::opts::TranscribeOpts;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::srt_encoder::SrtEncoder;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "large-v2";

/// Result of one [`Transcriber::transcribe`] call.
///
/// The elapsed time is always measured, including when the run failed; check
/// [`Transcription::outcome`] before assuming subtitles were written.
#[derive(Debug)]
pub struct Transcription {
    elapsed: Duration,
    outcome: crate::Result<usize>,
}

impl Transcription {
    /// Wall-clock minutes spent loading the model, transcribing, and writing subtitles, unrounded.
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// Number of subtitle entries written, or the error that stopped the run.
    pub fn outcome(&self) -> &crate::Result<usize> {
        &self.outcome
    }

    pub fn into_outcome(self) -> crate::Result<usize> {
        self.outcome
    }
}

/// Transcribes decoded audio into a SubRip file using models from a [`ModelLoader`].
pub struct Transcriber<L: ModelLoader = WhisperLoader> {
    loader: L,
}

impl<L: ModelLoader> Transcriber<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load `model_identifier`, transcribe `audio_path`, and write the entries to `subtitle_path`.
    ///
    /// The model is loaded on every call. The subtitle file is only created once the engine has
    /// returned its segments, so a failed run leaves any previous file in place.
    pub fn transcribe(
        &self,
        audio_path: &Path,
        subtitle_path: &Path,
        model_identifier: &str,
        opts: &TranscribeOpts,
    ) -> Transcription {
        let started = Instant::now();

        let outcome = self
            .run(audio_path, subtitle_path, model_identifier, opts)
            .map_err(Error::transcription);
        if outcome.is_ok() {
            info!("Transcription saved to {}", subtitle_path.display());
        }

        Transcription {
            elapsed: started.elapsed(),
            outcome,
        }
    }

    fn run(
        &self,
        audio_path: &Path,
        subtitle_path: &Path,
        model_identifier: &str,
        opts: &TranscribeOpts,
    ) -> Result<usize> {
        let engine = self
            .loader
            .load(model_identifier)
            .with_context(|| format!("failed to load model '{model_identifier}'"))?;

        let segments = engine
            .transcribe(audio_path, opts)
            .with_context(|| format!("failed to transcribe {}", audio_path.display()))?;

        write_subtitles(subtitle_path, &segments)
    }
}

/// Write `segments` to `path` as SubRip, replacing any existing file.
///
/// Returns the number of entries written.
pub fn write_subtitles(path: &Path, segments: &[Segment]) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("failed to create subtitle file: {}", path.display()))?;

    let mut encoder = SrtEncoder::new(BufWriter::new(file));
    for seg in segments {
        encoder.write_segment(seg)?;
    }
    encoder
        .close()
        .with_context(|| format!("failed to flush subtitle file: {}", path.display()))?;

    Ok(encoder.entries_written())
}
