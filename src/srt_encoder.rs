use anyhow::Result;
use std::fmt;
use std::io::Write;

use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;

/// One numbered SubRip block derived from a [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// 1-based position in emission order.
    pub index: usize,
    pub start: String,
    pub end: String,
    pub text: String,
}

impl SubtitleEntry {
    /// Build the entry for the segment at 1-based position `index`.
    pub fn from_segment(index: usize, seg: &Segment) -> Self {
        Self {
            index,
            start: format_timestamp_srt(seg.start_seconds),
            end: format_timestamp_srt(seg.end_seconds),
            text: seg.text.clone(),
        }
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        // Text is written verbatim: no trimming, no escaping.
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// A `SegmentEncoder` that writes segments in SubRip (`.srt`) format.
///
/// Entries are numbered from 1 in the order segments arrive. Nothing is sorted, merged, or
/// corrected for overlap.
pub struct SrtEncoder<W: Write> {
    /// The underlying writer we stream SubRip into.
    w: W,

    /// Index of the next entry.
    next_index: usize,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> SrtEncoder<W> {
    /// Create a new SRT encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_index: 1,
            closed: false,
        }
    }

    /// Number of entries written so far.
    pub fn entries_written(&self) -> usize {
        self.next_index - 1
    }
}

impl<W: Write> SegmentEncoder for SrtEncoder<W> {
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            anyhow::bail!("cannot write segment: encoder is already closed");
        }

        let entry = SubtitleEntry::from_segment(self.next_index, seg);
        write!(&mut self.w, "{entry}")?;
        self.next_index += 1;

        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

/// Format seconds into a SubRip timestamp with whole-second precision (`H:MM:SS,000`).
///
/// Sub-second precision is discarded by truncation and the millisecond field is always zero.
/// Hours are not zero-padded. Negative and non-finite inputs clamp to zero.
pub fn format_timestamp_srt(seconds: f32) -> String {
    let total_s = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    format!("{h}:{m:02}:{s:02},000")
}
