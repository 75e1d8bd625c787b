use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperSegment, WhisperState};

use crate::opts::TranscribeOpts;
use crate::segments::{Segment, centiseconds_to_seconds};

/// Run one full whisper pass over `samples` and collect its segments in emission order.
pub(super) fn collect_segments(
    ctx: &WhisperContext,
    opts: &TranscribeOpts,
    samples: &[f32],
) -> Result<Vec<Segment>> {
    let state = run_whisper_full(ctx, opts, samples)?;
    let segments = state.as_iter().map(to_segment).collect::<Result<Vec<_>>>()?;
    Ok(segments)
}

fn to_segment(segment: WhisperSegment) -> Result<Segment> {
    let text = segment_text(segment.to_bytes().context("failed to get segment text")?);

    Ok(Segment {
        start_seconds: centiseconds_to_seconds(segment.start_timestamp()),
        end_seconds: centiseconds_to_seconds(segment.end_timestamp()),
        text,
    })
}

/// Segment text as UTF-8, replacing invalid sequences.
///
/// whisper.cpp splits on tokens, not characters, so a multibyte character (common in CJK
/// output) can straddle two segments and leave each with a partial sequence.
fn segment_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn build_full_params<'a>(opts: &'a TranscribeOpts) -> FullParams<'a, 'a> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(opts.language.as_deref());
    params.set_single_segment(false);

    if let Some(prompt) = opts.prompt() {
        // whisper.cpp takes a C string.
        params.set_initial_prompt(&prompt.replace('\0', ""));
    }

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

fn run_whisper_full(
    ctx: &WhisperContext,
    opts: &TranscribeOpts,
    samples: &[f32],
) -> Result<WhisperState> {
    let params = build_full_params(opts);

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_text_passes_valid_utf8_through() {
        assert_eq!(segment_text(" 你好, world".as_bytes()), " 你好, world");
    }

    #[test]
    fn segment_text_keeps_segments_with_split_characters() {
        // "你好" is e4 bd a0 e5 a5 bd; the segment boundary fell inside the second character.
        let head = segment_text(&[0xe4, 0xbd, 0xa0, 0xe5, 0xa5]);
        assert_eq!(head, "你\u{fffd}");

        let tail = segment_text(&[0xbd, b'!']);
        assert_eq!(tail, "\u{fffd}!");
    }
}
