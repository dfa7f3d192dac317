// Beat Starter Music Generator
//
// Procedural generator for short hip-hop and trap "beat starters": a melody,
// an optional chord progression and an optional drum pattern, written as a
// multi-track Standard MIDI File through `beat_starter_smf`.
//
// Every engine works on a seeded `StdRng` it owns, so a seeded request is
// fully reproducible. Nothing in generation fails; bad names and meters are
// replaced by defaults with a logged warning.
//
// Architecture:
// - theory.rs: Note-name resolution, scale catalogue, `ScaleTable` (in-scale
//   and stable pitches for an octave window)
// - choice.rs: Seeded generator construction and weighted table picks
// - rhythm.rs: Beat-budget rhythm patterns and `TimeSignature`
// - chords.rs: Diatonic triads and four-chord progression loops
// - drums.rs: Style-driven kick/snare/hat patterns on the GM percussion map
// - melody.rs: Scale-degree random walks, phrase forms and the three
//   melodic variations
// - config.rs: `BeatRequest`, the JSON-loadable set of generation options
// - beat.rs: Runs the engines for a request and assembles the tracks
// - error.rs: `MusicError`

pub mod beat;
pub mod choice;
pub mod chords;
pub mod config;
pub mod drums;
pub mod error;
pub mod melody;
pub mod rhythm;
pub mod theory;

pub use beat::{generate_beat, render_beat};
pub use chords::{Chord, ChordGenerator, progression_events};
pub use config::BeatRequest;
pub use drums::{DrumGenerator, DrumStyle};
pub use error::MusicError;
pub use melody::{MelodyGenerator, PhraseForm, Variation};
pub use rhythm::{RhythmPattern, RhythmStyle, TimeSignature, generate_pattern};
pub use theory::{ScaleKind, ScaleTable, classify_stability, resolve_pitch_class, scale_pitches};
