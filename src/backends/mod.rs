/// Built-in speech engines.
pub mod whisper;
