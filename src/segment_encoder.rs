use crate::segments::Segment;
use anyhow::Result;

/// Serializes segments, one at a time, into some output format.
///
/// Callers own the encoder lifecycle and must call `close` once they are done.
pub trait SegmentEncoder {
    fn write_segment(&mut self, seg: &Segment) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
