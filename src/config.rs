use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backends::whisper::DEFAULT_MODELS_DIR;
use crate::notifier::DEFAULT_TIMEOUT;
use crate::opts::TranscribeOpts;
use crate::transcriber::DEFAULT_MODEL;

/// Environment variable holding the webhook endpoint.
pub const WEBHOOK_URL_ENV: &str = "MM_WEBHOOK_URL";

/// Environment variable holding the vocabulary hint.
pub const VOCABULARY_HINT_ENV: &str = "CONTEXT";

/// Everything one pipeline run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub audio_path_source: PathBuf,
    pub audio_path_decoded: PathBuf,
    pub subtitle_path: PathBuf,
    pub vocabulary_hint: Option<String>,
    pub webhook_url: Option<String>,

    pub model: String,
    pub models_dir: PathBuf,
    pub language: Option<String>,
    pub convert: bool,
    pub notify_timeout: Duration,
}

impl Config {
    /// Build a config for the two audio paths with every optional setting at its default.
    pub fn new(audio_path_source: impl Into<PathBuf>, audio_path_decoded: impl Into<PathBuf>) -> Self {
        let audio_path_source = audio_path_source.into();
        Self {
            subtitle_path: subtitle_path_for(&audio_path_source),
            audio_path_source,
            audio_path_decoded: audio_path_decoded.into(),
            vocabulary_hint: None,
            webhook_url: None,
            model: DEFAULT_MODEL.to_owned(),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            language: None,
            convert: true,
            notify_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Like [`Config::new`], reading the webhook URL and vocabulary hint through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(
        audio_path_source: impl Into<PathBuf>,
        audio_path_decoded: impl Into<PathBuf>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            webhook_url: non_empty(WEBHOOK_URL_ENV),
            vocabulary_hint: non_empty(VOCABULARY_HINT_ENV),
            ..Self::new(audio_path_source, audio_path_decoded)
        }
    }

    /// [`Config::from_lookup`] over the process environment.
    pub fn from_env(audio_path_source: impl Into<PathBuf>, audio_path_decoded: impl Into<PathBuf>) -> Self {
        Self::from_lookup(audio_path_source, audio_path_decoded, |key| {
            std::env::var(key).ok()
        })
    }

    /// Engine options derived from this config.
    pub fn transcribe_opts(&self) -> TranscribeOpts {
        TranscribeOpts {
            language: self.language.clone(),
            vocabulary_hint: self.vocabulary_hint.clone(),
        }
    }
}

/// The subtitle path for a source recording: same path, `.srt` extension.
pub fn subtitle_path_for(audio_path_source: &Path) -> PathBuf {
    audio_path_source.with_extension("srt")
}
