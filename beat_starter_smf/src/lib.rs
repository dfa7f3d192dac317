// beat_starter_smf: note-event model and Standard MIDI File output.
//
// This crate is the boundary between the generators in `beat_starter_music`
// and the bytes that end up on disk. It has no knowledge of scales, styles or
// randomness; it only turns beat-positioned note events into an exact SMF
// Format 1 byte layout, and reads such files back for inspection.
//
// Module overview:
// - `types.rs`:   `NoteEvent`, `Track`, and the channel/resolution constants.
// - `vlq.rs`:     Variable-length quantity encode/decode for delta times.
// - `writer.rs`:  `SequenceWriter`: tick conversion, on/off edge merging,
//                 chunk assembly, buffer/stream/file output.
// - `inspect.rs`: `midly`-backed reader that pairs notes back into tick spans.
// - `error.rs`:   `SmfError`.
//
// Design decisions:
// - **Hand-written encoder.** The writer emits every status byte explicitly so
//   the layout is fixed by the input alone; `midly` is used only for reading.
// - **Beats in, ticks out.** Events stay in floating-point beats until the
//   final rounding step inside the writer.

pub mod error;
pub mod inspect;
pub mod types;
pub mod vlq;
pub mod writer;

pub use error::SmfError;
pub use inspect::{DecodedNote, SequenceSummary, TrackSummary, inspect};
pub use types::{
    CHORD_CHANNEL, DRUM_CHANNEL, MAX_CHANNEL, MELODY_CHANNEL, NoteEvent, TICKS_PER_BEAT, Track,
    clamp_pitch,
};
pub use vlq::{MAX_VLQ, decode_vlq, encode_vlq};
pub use writer::{SequenceWriter, beats_to_ticks};
