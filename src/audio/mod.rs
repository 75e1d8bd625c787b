//! Audio decoding and normalization.
//!
//! - `decode` probes a file with Symphonia and decodes its default audio track
//! - `resample` downmixes decoded PCM to mono and resamples it to [`TARGET_SAMPLE_RATE`]
//! - `wav` writes normalized samples as 16-bit PCM WAV

pub mod decode;
pub mod resample;
pub mod wav;

pub use decode::{SampleDecoder, SymphoniaDecoder, decode_file};

/// Sample rate (Hz) the speech engine consumes.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
