use std::path::Path;

use anyhow::Result;

use crate::opts::TranscribeOpts;
use crate::segments::Segment;

/// Pluggable speech-to-text engine used by [`crate::Transcriber`].
///
/// An engine turns one decoded audio file into an ordered list of [`Segment`]s covering the whole
/// recording. The call blocks until inference is finished.
pub trait SpeechEngine {
    fn transcribe(&self, audio_path: &Path, opts: &TranscribeOpts) -> Result<Vec<Segment>>;
}

/// Loads a [`SpeechEngine`] for a named model.
///
/// The transcriber calls this once per run, so loading is part of the measured duration.
pub trait ModelLoader {
    type Engine: SpeechEngine;

    fn load(&self, model_identifier: &str) -> Result<Self::Engine>;
}
