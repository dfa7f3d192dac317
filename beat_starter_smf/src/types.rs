// Symbolic note data shared by every track producer.
//
// `NoteEvent` is the unit of exchange between the generators in
// `beat_starter_music` and the writer in `writer.rs`: a pitch, a start offset
// and a duration (both in beats), and a velocity. Events carry no channel;
// the owning `Track` supplies it. Nothing here knows about ticks. Beat time is
// converted to the file's integer time base only at write time.

use serde::{Deserialize, Serialize};

/// Ticks per beat used for every file this crate writes.
pub const TICKS_PER_BEAT: u16 = 480;

/// Conventional channel for the lead melody.
pub const MELODY_CHANNEL: u8 = 0;

/// Conventional channel for backing chords.
pub const CHORD_CHANNEL: u8 = 1;

/// General MIDI percussion channel (channel 10 in 1-based numbering).
pub const DRUM_CHANNEL: u8 = 9;

/// Highest valid channel number.
pub const MAX_CHANNEL: u8 = 15;

/// Clamp an arbitrary semitone number into the valid pitch range 0-127.
pub fn clamp_pitch(pitch: i32) -> u8 {
    pitch.clamp(0, 127) as u8
}

/// One sounding note, positioned in beats from the start of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch, always within 0-127.
    pub pitch: u8,
    /// Length in beats. Always positive.
    pub duration: f64,
    /// Attack velocity, 1-127.
    pub velocity: u8,
    /// Start time in beats from the sequence start.
    pub offset: f64,
}

impl NoteEvent {
    /// Build an event, clamping pitch and velocity into their valid ranges.
    pub fn new(pitch: i32, duration: f64, velocity: i32, offset: f64) -> Self {
        NoteEvent {
            pitch: clamp_pitch(pitch),
            duration,
            velocity: velocity.clamp(1, 127) as u8,
            offset: offset.max(0.0),
        }
    }

    /// Beat position at which the note stops sounding.
    pub fn end(&self) -> f64 {
        self.offset + self.duration
    }
}

/// A named, channel-tagged lane of note events.
///
/// The track owns its events outright. They need not be sorted; the writer
/// orders them by offset when encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub channel: u8,
    pub events: Vec<NoteEvent>,
}

impl Track {
    pub fn new(name: impl Into<String>, channel: u8, events: Vec<NoteEvent>) -> Self {
        let name = name.into();
        if channel > MAX_CHANNEL {
            log::warn!("track '{name}': channel {channel} out of range, using {MAX_CHANNEL}");
        }
        Track {
            name,
            channel: channel.min(MAX_CHANNEL),
            events,
        }
    }

    /// Total beats covered by the track (end of its latest note).
    pub fn length_beats(&self) -> f64 {
        self.events.iter().map(NoteEvent::end).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_event_clamps_pitch_and_velocity() {
        let high = NoteEvent::new(200, 1.0, 300, 0.0);
        assert_eq!(high.pitch, 127);
        assert_eq!(high.velocity, 127);

        let low = NoteEvent::new(-5, 1.0, 0, -1.0);
        assert_eq!(low.pitch, 0);
        assert_eq!(low.velocity, 1);
        assert_eq!(low.offset, 0.0);
    }

    #[test]
    fn track_clamps_channel() {
        let track = Track::new("Lead", 42, Vec::new());
        assert_eq!(track.channel, MAX_CHANNEL);
        let drums = Track::new("Drums", DRUM_CHANNEL, Vec::new());
        assert_eq!(drums.channel, 9);
    }

    #[test]
    fn track_length_is_latest_note_end() {
        let track = Track::new(
            "Lead",
            MELODY_CHANNEL,
            vec![
                NoteEvent::new(60, 2.0, 100, 3.0),
                NoteEvent::new(62, 0.5, 100, 1.0),
            ],
        );
        assert_eq!(track.length_beats(), 5.0);
    }

    #[test]
    fn note_event_serializes_to_json() {
        let event = NoteEvent::new(60, 1.0, 100, 0.5);
        let json = serde_json::to_string(&event).unwrap();
        let back: NoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
