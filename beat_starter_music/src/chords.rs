// Chord progressions: diatonic triads stacked from the working scale.
//
// A triad on scale degree d takes the degree's root from a one-octave table
// (wrapping d past the scale length back to the start) and stacks the third
// and fifth two and four scale steps above it. Those upper notes are read
// from a table spanning the chord octave window; they never wrap, and a note
// that would fall past the window's top is left out.
//
// Progressions are picked whole from a catalogue of four-chord loops common
// in trap and pop, then cycled bar by bar to the requested length.

use rand::Rng;
use rand::rngs::StdRng;

use beat_starter_smf::{NoteEvent, clamp_pitch};

use crate::choice::seeded_rng;
use crate::theory::{ScaleTable, root_or_default};

/// Octave holding the degree roots.
pub const CHORD_OCTAVE_LO: i32 = 3;
/// Top octave available to thirds and fifths.
pub const CHORD_OCTAVE_HI: i32 = 5;

/// Velocity used for chord notes when the caller has no preference.
pub const DEFAULT_CHORD_VELOCITY: u8 = 80;

/// Four-bar loops as 1-based scale degrees.
pub const PROGRESSIONS: [[usize; 4]; 4] = [
    [1, 6, 7, 1], // i - VI - VII - i
    [1, 4, 5, 1], // i - iv - v - i
    [1, 6, 3, 7], // i - VI - III - VII
    [1, 2, 1, 5], // i - ii - i - v
];

/// A chord as ascending MIDI pitches.
pub type Chord = Vec<u8>;

#[derive(Debug, Clone)]
pub struct ChordGenerator {
    key: String,
    scale_name: String,
    /// One octave of degree roots.
    degree_table: ScaleTable,
    /// Every in-scale pitch of the chord octave window.
    voicing_table: ScaleTable,
    rng: StdRng,
}

impl ChordGenerator {
    /// Create a generator for `key`/`scale`. An unresolvable key is treated
    /// as C and an unknown scale as natural minor.
    pub fn new(key: &str, scale: &str, seed: Option<u64>) -> Self {
        let root_pc = root_or_default(key);
        ChordGenerator {
            key: key.to_string(),
            scale_name: scale.to_string(),
            degree_table: ScaleTable::new(root_pc, scale, CHORD_OCTAVE_LO, CHORD_OCTAVE_LO),
            voicing_table: ScaleTable::new(root_pc, scale, CHORD_OCTAVE_LO, CHORD_OCTAVE_HI),
            rng: seeded_rng(seed),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scale_name(&self) -> &str {
        &self.scale_name
    }

    pub fn degree_table(&self) -> &[u8] {
        self.degree_table.pitches()
    }

    /// Triad on 1-based scale `degree`, transposed by whole octaves.
    ///
    /// Normally three notes; fewer only when the third or fifth would run
    /// past the chord window.
    pub fn build_triad(&self, degree: usize, octave_offset: i32) -> Chord {
        let scale_len = self.degree_table.len();
        if scale_len == 0 {
            return Vec::new();
        }
        let root_pos = degree.saturating_sub(1) % scale_len;
        let voicing = self.voicing_table.pitches();
        [root_pos, root_pos + 2, root_pos + 4]
            .into_iter()
            .filter_map(|pos| voicing.get(pos))
            .map(|&pitch| clamp_pitch(i32::from(pitch) + octave_offset * 12))
            .collect()
    }

    /// One triad per bar, cycling a randomly chosen loop from [`PROGRESSIONS`].
    pub fn generate_progression(&mut self, length_bars: usize) -> Vec<Chord> {
        let template = PROGRESSIONS[self.rng.random_range(0..PROGRESSIONS.len())];
        log::debug!("chord progression {template:?} over {length_bars} bars");
        (0..length_bars)
            .map(|bar| self.build_triad(template[bar % template.len()], 0))
            .collect()
    }
}

/// Sustain each chord for one full bar.
pub fn progression_events(progression: &[Chord], beats_per_bar: f64, velocity: u8) -> Vec<NoteEvent> {
    progression
        .iter()
        .enumerate()
        .flat_map(|(bar, chord)| {
            let offset = bar as f64 * beats_per_bar;
            chord.iter().map(move |&pitch| {
                NoteEvent::new(i32::from(pitch), beats_per_bar, i32::from(velocity), offset)
            })
        })
        .collect()
}
