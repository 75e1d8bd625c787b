/// Options that control how a transcription is performed.
///
/// This is library-level configuration, not CLI flags. The binary maps its arguments into this
/// type so tests and other frontends can build it directly.
#[derive(Debug, Clone, Default)]
pub struct TranscribeOpts {
    /// Optional language hint (e.g. `"en"`, `"es"`). `None` lets the engine auto-detect.
    pub language: Option<String>,

    /// Optional biasing text handed to the engine as its initial prompt.
    ///
    /// An empty hint is treated as absent; any other text, whitespace included, is passed on.
    pub vocabulary_hint: Option<String>,
}

impl TranscribeOpts {
    /// The vocabulary hint, if one is set and non-empty.
    pub fn prompt(&self) -> Option<&str> {
        self.vocabulary_hint.as_deref().filter(|hint| !hint.is_empty())
    }
}
