/// A time-bounded unit of transcribed speech, as emitted by a speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start_seconds: f32,
    pub end_seconds: f32,
    pub text: String,
}

impl Segment {
    pub fn new(start_seconds: f32, end_seconds: f32, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// Convert a whisper.cpp timestamp (centiseconds) into seconds.
///
/// whisper uses -1 for unknown; clamp to 0 so consumers don't see -0.01s.
pub(crate) fn centiseconds_to_seconds(value: i64) -> f32 {
    if value < 0 { 0.0 } else { value as f32 / 100.0 }
}
