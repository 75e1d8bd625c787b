//! `transcribe-srt`: convert a recording, transcribe it with Whisper, write SubRip subtitles,
//! and post a completion message to a webhook.
//!
//! The stages are plain components behind small traits so each can be swapped for a fake:
//! - [`Converter`] decodes the source recording into 16 kHz mono WAV ([`audio::SampleDecoder`])
//! - [`Transcriber`] loads a model and runs a [`SpeechEngine`] ([`ModelLoader`])
//! - [`SrtEncoder`] formats segments as numbered SubRip entries
//! - [`Notifier`] posts the completion message
//!
//! [`Pipeline`] runs them in a fixed order from a [`Config`].

mod error;

// High-level API (most consumers should start here).
pub mod config;
pub mod opts;
pub mod pipeline;

// Stages.
pub mod converter;
pub mod notifier;
pub mod transcriber;

// Speech engines.
pub mod backends;
pub mod engine;

// Segment data and output encoding.
pub mod segment_encoder;
pub mod segments;
pub mod srt_encoder;

// Audio decoding and normalization.
pub mod audio;

// Logging configuration for binaries.
#[cfg(feature = "logging")]
pub mod logging;

pub use backends::whisper::{WhisperEngine, WhisperLoader};
pub use config::Config;
pub use converter::{ConvertOutcome, Converter};
pub use engine::{ModelLoader, SpeechEngine};
pub use error::{Error, Result, Stage};
pub use notifier::{Notifier, WebhookNotifier};
pub use opts::TranscribeOpts;
pub use pipeline::{Pipeline, RunReport};
pub use segments::Segment;
pub use srt_encoder::{SrtEncoder, SubtitleEntry};
pub use transcriber::{Transcriber, Transcription};
