use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use tracing::{debug, info};
use whisper_rs::{WhisperContext, WhisperContextParameters};

use crate::audio::decode_file;
use crate::engine::{ModelLoader, SpeechEngine};
use crate::opts::TranscribeOpts;
use crate::segments::Segment;

mod logging;
mod segments;

use logging::route_whisper_logging;
use segments::collect_segments;

/// Default directory searched for GGML model files.
pub const DEFAULT_MODELS_DIR: &str = "./models";

/// Loads whisper.cpp GGML models by name or path.
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    models_dir: PathBuf,
}

impl WhisperLoader {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Map a model identifier onto a file on disk.
    ///
    /// An identifier that names an existing file is used as-is; anything else is treated as a
    /// whisper.cpp model name and resolved to `<models_dir>/ggml-<name>.bin`.
    pub fn resolve_model_path(&self, model_identifier: &str) -> PathBuf {
        let direct = Path::new(model_identifier);
        if direct.is_file() {
            return direct.to_path_buf();
        }
        self.models_dir.join(format!("ggml-{model_identifier}.bin"))
    }
}

impl Default for WhisperLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MODELS_DIR)
    }
}

impl ModelLoader for WhisperLoader {
    type Engine = WhisperEngine;

    fn load(&self, model_identifier: &str) -> Result<WhisperEngine> {
        ensure!(
            !model_identifier.trim().is_empty(),
            "model identifier must be provided"
        );

        let model_path = self.resolve_model_path(model_identifier);
        ensure!(
            model_path.is_file(),
            "model '{}' not found at '{}'",
            model_identifier,
            model_path.display()
        );

        info!(model = model_identifier, path = %model_path.display(), "loading whisper model");
        WhisperEngine::from_path(&model_path)
    }
}

/// Speech engine powered by `whisper-rs` / `whisper.cpp`.
pub struct WhisperEngine {
    ctx: WhisperContext,
}

impl WhisperEngine {
    /// Load a whisper.cpp model from disk.
    pub fn from_path(model_path: &Path) -> Result<Self> {
        route_whisper_logging();

        let path = model_path
            .to_str()
            .with_context(|| format!("model path is not valid UTF-8: {}", model_path.display()))?;

        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .with_context(|| format!("failed to load model from path: {path}"))?;

        Ok(Self { ctx })
    }
}

impl SpeechEngine for WhisperEngine {
    fn transcribe(&self, audio_path: &Path, opts: &TranscribeOpts) -> Result<Vec<Segment>> {
        let samples = decode_file(audio_path)?;
        debug!(samples = samples.len(), "running whisper inference");

        if samples.is_empty() {
            return Ok(Vec::new());
        }

        collect_segments(&self.ctx, opts, &samples)
    }
}
