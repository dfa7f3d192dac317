// Read-back of written sequence files.
//
// Parses SMF bytes with `midly` and pairs note-on/note-off messages into
// tick spans, one summary per track. Used by the `generate` binary to print
// what it wrote and by tests to check the writer against an independent
// parser.

use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::SmfError;

/// A note recovered from the file, in absolute ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedNote {
    pub pitch: u8,
    pub velocity: u8,
    pub on_tick: u64,
    pub off_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    pub name: String,
    /// Channel of the first channel message, if the track has any.
    pub channel: Option<u8>,
    /// Notes ordered by their note-on position in the stream.
    pub notes: Vec<DecodedNote>,
    /// Tick of the end-of-track event.
    pub end_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSummary {
    pub ticks_per_beat: u16,
    pub tracks: Vec<TrackSummary>,
}

/// Parse `bytes` and summarize every track.
pub fn inspect(bytes: &[u8]) -> Result<SequenceSummary, SmfError> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ppq) => ppq.as_int(),
        Timing::Timecode(..) => 0,
    };

    let mut tracks = Vec::with_capacity(smf.tracks.len());
    for track in &smf.tracks {
        let mut summary = TrackSummary {
            name: String::new(),
            channel: None,
            notes: Vec::new(),
            end_tick: 0,
        };
        // Sounding notes by pitch, as indices into `summary.notes`.
        let mut open: HashMap<u8, Vec<usize>> = HashMap::new();
        // Deltas are at most 28 bits, but their sum can pass u32::MAX.
        let mut tick: u64 = 0;

        for event in track {
            tick += u64::from(event.delta.as_int());
            match &event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    summary.name = String::from_utf8_lossy(name).into_owned();
                }
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                    summary.end_tick = tick;
                }
                TrackEventKind::Midi { channel, message } => {
                    summary.channel.get_or_insert(channel.as_int());
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open.entry(key.as_int()).or_default().push(summary.notes.len());
                            summary.notes.push(DecodedNote {
                                pitch: key.as_int(),
                                velocity: vel.as_int(),
                                on_tick: tick,
                                off_tick: tick,
                            });
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pending = open.entry(key.as_int()).or_default();
                            if !pending.is_empty() {
                                let index = pending.remove(0);
                                summary.notes[index].off_tick = tick;
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        tracks.push(summary);
    }

    Ok(SequenceSummary {
        ticks_per_beat,
        tracks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CHORD_CHANNEL, DRUM_CHANNEL, MELODY_CHANNEL, NoteEvent};
    use crate::writer::SequenceWriter;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_note_round_trip() {
        let mut writer = SequenceWriter::new();
        writer.add_track("Melody", MELODY_CHANNEL, vec![NoteEvent::new(60, 1.0, 100, 0.0)]);
        let summary = inspect(&writer.to_bytes().unwrap()).unwrap();

        assert_eq!(summary.ticks_per_beat, 480);
        assert_eq!(summary.tracks.len(), 1);
        let track = &summary.tracks[0];
        assert_eq!(track.name, "Melody");
        assert_eq!(track.channel, Some(0));
        assert_eq!(
            track.notes,
            vec![DecodedNote {
                pitch: 60,
                velocity: 100,
                on_tick: 0,
                off_tick: 480,
            }]
        );
        assert_eq!(track.end_tick, 480);
    }

    #[test]
    fn multi_track_round_trip_preserves_spans() {
        let chord = vec![
            NoteEvent::new(48, 4.0, 80, 0.0),
            NoteEvent::new(51, 4.0, 80, 0.0),
            NoteEvent::new(55, 4.0, 80, 0.0),
        ];
        let hats: Vec<NoteEvent> = (0..4)
            .map(|i| NoteEvent::new(42, 0.125, 75, 1.0 + f64::from(i) * 0.125))
            .collect();

        let mut writer = SequenceWriter::new();
        writer.add_track("Chords", CHORD_CHANNEL, chord);
        writer.add_track("Drums", DRUM_CHANNEL, hats);
        let summary = inspect(&writer.to_bytes().unwrap()).unwrap();

        let chords = &summary.tracks[0];
        assert_eq!(chords.channel, Some(1));
        let pitches: Vec<u8> = chords.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![48, 51, 55]);
        assert!(chords.notes.iter().all(|n| n.on_tick == 0 && n.off_tick == 1920));

        let drums = &summary.tracks[1];
        assert_eq!(drums.name, "Drums");
        assert_eq!(drums.channel, Some(9));
        let spans: Vec<(u64, u64)> = drums.notes.iter().map(|n| (n.on_tick, n.off_tick)).collect();
        assert_eq!(spans, vec![(480, 540), (540, 600), (600, 660), (660, 720)]);
    }

    #[test]
    fn absolute_ticks_beyond_u32_decode() {
        let spacing = 500_000.0;
        let notes: Vec<NoteEvent> = (0..20)
            .map(|i| NoteEvent::new(60, 1.0, 100, f64::from(i) * spacing))
            .collect();
        let mut writer = SequenceWriter::new();
        writer.add_track("Sparse", MELODY_CHANNEL, notes);
        let summary = inspect(&writer.to_bytes().unwrap()).unwrap();

        let track = &summary.tracks[0];
        assert_eq!(track.notes.len(), 20);
        let last = track.notes[19];
        assert_eq!(last.on_tick, 19 * 240_000_000);
        assert_eq!(last.off_tick, 19 * 240_000_000 + 480);
        assert!(track.end_tick > u64::from(u32::MAX));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(inspect(b"not a midi file"), Err(SmfError::Parse(_))));
    }
}
