//! The end-to-end run: convert → transcribe → write subtitles → notify.
//!
//! Stages always run in that order and none of them is skipped because an earlier one failed.
//! Each failure is logged where it happens and collected into the [`RunReport`], so the default
//! behavior stays "log and carry on" while callers can still inspect what went wrong.

use std::path::Path;

use tracing::{error, info};

use crate::audio::{SampleDecoder, SymphoniaDecoder};
use crate::backends::whisper::WhisperLoader;
use crate::config::Config;
use crate::converter::{ConvertOutcome, Converter};
use crate::engine::ModelLoader;
use crate::error::{Error, Stage};
use crate::notifier::{Notifier, WebhookNotifier, notify};
use crate::transcriber::Transcriber;

/// What happened during one [`Pipeline::run`].
#[derive(Debug)]
pub struct RunReport {
    /// `None` when conversion was disabled or failed.
    pub conversion: Option<ConvertOutcome>,

    /// Time spent in the transcription stage, in minutes. Present even if it failed.
    pub elapsed_minutes: f64,

    /// Subtitle entries written, `None` if transcription failed.
    pub subtitle_entries: Option<usize>,

    /// The notification text that was sent (or attempted).
    pub message: String,

    /// Every stage failure, in stage order.
    pub errors: Vec<Error>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `stage` reported a failure.
    pub fn failed(&self, stage: Stage) -> bool {
        self.errors.iter().any(|err| err.stage() == stage)
    }
}

/// Wires the stages together for one configured run.
pub struct Pipeline<L = WhisperLoader, D = SymphoniaDecoder, N = WebhookNotifier>
where
    L: ModelLoader,
    D: SampleDecoder,
    N: Notifier,
{
    config: Config,
    converter: Converter<D>,
    transcriber: Transcriber<L>,
    notifier: N,
}

impl Pipeline {
    /// Production wiring: Symphonia conversion, whisper.cpp models, HTTP webhook.
    pub fn from_config(config: Config) -> Self {
        let transcriber = Transcriber::new(WhisperLoader::new(&config.models_dir));
        let notifier = WebhookNotifier::with_timeout(config.notify_timeout);
        Self::new(config, Converter::new(), transcriber, notifier)
    }
}

impl<L, D, N> Pipeline<L, D, N>
where
    L: ModelLoader,
    D: SampleDecoder,
    N: Notifier,
{
    pub fn new(
        config: Config,
        converter: Converter<D>,
        transcriber: Transcriber<L>,
        notifier: N,
    ) -> Self {
        Self {
            config,
            converter,
            transcriber,
            notifier,
        }
    }

    /// Run every stage once, in order.
    pub fn run(&self) -> RunReport {
        let config = &self.config;
        let mut errors = Vec::new();

        info!(
            source = %config.audio_path_source.display(),
            decoded = %config.audio_path_decoded.display(),
            subtitles = %config.subtitle_path.display(),
            model = %config.model,
            "starting transcription run"
        );

        let conversion = if config.convert {
            match self
                .converter
                .convert(&config.audio_path_source, &config.audio_path_decoded)
            {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    error!("Error during conversion: {err}");
                    errors.push(err);
                    None
                }
            }
        } else {
            info!("conversion disabled; using existing decoded audio");
            None
        };

        let transcription = self.transcriber.transcribe(
            &config.audio_path_decoded,
            &config.subtitle_path,
            &config.model,
            &config.transcribe_opts(),
        );
        let elapsed_minutes = transcription.elapsed_minutes();
        let subtitle_entries = match transcription.into_outcome() {
            Ok(entries) => Some(entries),
            Err(err) => {
                error!("An error occurred during transcription: {err}");
                errors.push(err);
                None
            }
        };

        let message = completion_message(&config.audio_path_source, elapsed_minutes);
        let url = config.webhook_url.as_deref().unwrap_or_default();
        if let Err(err) = notify(&self.notifier, url, &message) {
            error!("Error sending message to webhook: {err}");
            errors.push(err);
        }

        RunReport {
            conversion,
            elapsed_minutes,
            subtitle_entries,
            message,
            errors,
        }
    }
}

/// The notification text for a finished run.
pub fn completion_message(audio_path_source: &Path, elapsed_minutes: f64) -> String {
    format!(
        "Transcription of {} completed in {elapsed_minutes:.2} minutes.",
        audio_path_source.display()
    )
}
