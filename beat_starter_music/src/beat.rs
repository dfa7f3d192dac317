// Beat assembly: one request in, one multi-track sequence out.
//
// Track order is fixed: melody, then chords, then drums, each on its own
// channel. A master generator seeded from the request hands every engine its
// own sub-seed, drawn in that order whether or not the engine is enabled, so
// toggling chords or drums never changes the melody for a given seed.

use rand::Rng;

use beat_starter_smf::{CHORD_CHANNEL, DRUM_CHANNEL, MELODY_CHANNEL, SequenceWriter};

use crate::chords::{ChordGenerator, DEFAULT_CHORD_VELOCITY, progression_events};
use crate::choice::seeded_rng;
use crate::config::BeatRequest;
use crate::drums::DrumGenerator;
use crate::error::MusicError;
use crate::melody::MelodyGenerator;

/// Run every enabled engine and collect their tracks.
pub fn generate_beat(request: &BeatRequest) -> SequenceWriter {
    let mut master = seeded_rng(request.seed);
    let melody_seed: u64 = master.random();
    let chord_seed: u64 = master.random();
    let drum_seed: u64 = master.random();

    let time_signature = request.parsed_time_signature();
    let mut melody = MelodyGenerator::new(
        &request.key,
        &request.scale,
        request.tempo,
        request.bars,
        Some(melody_seed),
    )
    .with_time_signature(time_signature);
    // The melody generator owns the clamped bar count.
    let bars = melody.length_bars() as usize;

    log::info!(
        "generating {} bars of {} {} at {} bpm, variation {}",
        bars,
        request.key,
        request.scale,
        melody.tempo(),
        request.variation
    );

    let mut writer = SequenceWriter::new();
    writer.add_track(
        format!("Melody Var {}", request.variation),
        MELODY_CHANNEL,
        melody.generate_variation(request.variation),
    );

    if request.add_chords {
        let mut chords = ChordGenerator::new(&request.key, &request.scale, Some(chord_seed));
        let progression = chords.generate_progression(bars);
        writer.add_track(
            "Chords",
            CHORD_CHANNEL,
            progression_events(
                &progression,
                time_signature.beats_per_bar(),
                DEFAULT_CHORD_VELOCITY,
            ),
        );
    }

    if request.add_drums {
        let mut drums = DrumGenerator::new(melody.tempo(), request.drum_style, Some(drum_seed));
        writer.add_track(
            format!("Drums ({})", request.drum_style),
            DRUM_CHANNEL,
            drums.generate_pattern(bars),
        );
    }

    writer
}

/// Generate and serialize to SMF bytes.
pub fn render_beat(request: &BeatRequest) -> Result<Vec<u8>, MusicError> {
    generate_beat(request).to_bytes().map_err(MusicError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drums::DrumStyle;
    use crate::melody::Variation;
    use pretty_assertions::assert_eq;

    fn seeded(seed: u64) -> BeatRequest {
        BeatRequest {
            seed: Some(seed),
            ..BeatRequest::default()
        }
    }

    #[test]
    fn default_request_has_three_tracks() {
        let writer = generate_beat(&seeded(1));
        let tracks = writer.tracks();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].name, "Melody Var B");
        assert_eq!(tracks[0].channel, MELODY_CHANNEL);
        assert_eq!(tracks[1].name, "Chords");
        assert_eq!(tracks[1].channel, CHORD_CHANNEL);
        assert_eq!(tracks[2].name, "Drums (trap)");
        assert_eq!(tracks[2].channel, DRUM_CHANNEL);
    }

    #[test]
    fn optional_tracks_can_be_disabled() {
        let request = BeatRequest {
            add_chords: false,
            add_drums: false,
            ..seeded(2)
        };
        let writer = generate_beat(&request);
        assert_eq!(writer.tracks().len(), 1);

        let chords_only = BeatRequest {
            add_drums: false,
            ..seeded(2)
        };
        let writer = generate_beat(&chords_only);
        let names: Vec<&str> = writer.tracks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Melody Var B", "Chords"]);
    }

    #[test]
    fn melody_ignores_other_tracks_toggles() {
        let full = generate_beat(&seeded(3));
        let bare = generate_beat(&BeatRequest {
            add_chords: false,
            add_drums: false,
            ..seeded(3)
        });
        assert_eq!(full.tracks()[0], bare.tracks()[0]);
    }

    #[test]
    fn tracks_span_the_requested_bars() {
        let request = BeatRequest {
            bars: 8,
            variation: Variation::A,
            drum_style: DrumStyle::LoFi,
            ..seeded(4)
        };
        let writer = generate_beat(&request);
        for track in writer.tracks() {
            assert!(track.length_beats() <= 32.0 + 1e-9, "{}", track.name);
        }
        assert_eq!(writer.tracks()[0].length_beats(), 32.0);
        assert_eq!(writer.tracks()[1].length_beats(), 32.0);
        assert_eq!(writer.tracks()[2].name, "Drums (lofi)");
    }

    #[test]
    fn chords_follow_meter() {
        let request = BeatRequest {
            time_signature: "3/4".to_string(),
            ..seeded(5)
        };
        let writer = generate_beat(&request);
        assert_eq!(writer.tracks()[0].length_beats(), 12.0);
        assert!(writer.tracks()[1].events.iter().all(|e| e.duration == 3.0));
    }

    #[test]
    fn render_is_deterministic() {
        let a = render_beat(&seeded(42)).unwrap();
        let b = render_beat(&seeded(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..4], b"MThd");
        assert_ne!(a, render_beat(&seeded(43)).unwrap());
    }

    #[test]
    fn bad_names_still_render() {
        let request = BeatRequest {
            key: "H".to_string(),
            scale: "klingon".to_string(),
            time_signature: "?".to_string(),
            ..seeded(6)
        };
        let bytes = render_beat(&request).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}
