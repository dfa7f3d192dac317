// Melody generation: scale-degree random walks shaped into phrases.
//
// All melodic motion happens on indices into the generator's `ScaleTable`,
// never on raw semitones, so every note is diatonic and leaps are measured in
// scale steps. Indices clamp at both ends of the table; a step that would run
// off the range stops at the boundary.
//
// A melody is built in four passes over one phrase rhythm:
// 1. Rhythm. Two one-bar patterns (A and B) are drawn and arranged by a
//    4-bar form, AABA or ABAB. Phrases of any other length repeat bar A.
// 2. Pitch. Variations A and B take a weighted voice-leading step from the
//    previous sounding pitch. Variation C cycles a short motif and shifts it
//    up a diatonic third in every other two-bar group.
// 3. Cadence. The final slot, and any slot ending exactly on a 4-bar
//    boundary, snaps to the nearest stable pitch (tonic, third, fifth).
// 4. Space. Variation B drops non-cadence slots with a fixed probability.
//    Dropped slots still take up time.
//
// Each variation has its own step table and velocity shape; see `Variation`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beat_starter_smf::NoteEvent;

use crate::choice::{pick_weighted, seeded_rng};
use crate::rhythm::{RhythmStyle, TimeSignature, generate_pattern};
use crate::theory::{ScaleTable, root_or_default};

/// Default octave window for melodies (C3 through B5 for a C root).
pub const DEFAULT_OCTAVES: (i32, i32) = (3, 5);

/// Bars per phrase; cadences fall at multiples of this.
pub const PHRASE_BARS: u32 = 4;

/// Chance that a non-cadence slot in variation B is left silent.
pub const REST_PROBABILITY: f64 = 0.2;

/// Notes in the variation C motif.
pub const MOTIF_LENGTH: usize = 4;

/// Scale steps added to the motif in its transposed groups (a third).
const MOTIF_SHIFT: i32 = 2;

const MOTIF_STEPS: &[(i32, f64)] = &[
    (-2, 1.0),
    (-1, 4.0),
    (0, 2.0),
    (1, 4.0),
    (2, 1.0),
    (3, 0.5),
    (-3, 0.5),
];

const SMOOTH_STEPS: &[(i32, f64)] = &[(-1, 4.0), (1, 4.0), (0, 1.0)];

const AGGRESSIVE_STEPS: &[(i32, f64)] = &[
    (-2, 2.0),
    (2, 2.0),
    (0, 3.0),
    (-3, 1.0),
    (3, 1.0),
    (7, 0.5),
    (-7, 0.5),
];

const MOTIVIC_STEPS: &[(i32, f64)] = &[(-1, 3.0), (1, 3.0), (-2, 1.0), (2, 1.0), (0, 1.0)];

/// Velocity accents for variation B.
const ACCENTS: [u8; 4] = [100, 110, 120, 60];

/// Velocity range for variations A and C.
const VELOCITY_RANGE: (u8, u8) = (80, 110);

const EPSILON: f64 = 1e-9;

/// The three melodic characters a generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variation {
    /// Smooth and singable: mostly stepwise.
    A,
    /// Aggressive: leaps, repeated notes, rests and hard accents.
    #[default]
    B,
    /// Motivic: a four-note idea repeated and sequenced.
    C,
}

impl Variation {
    pub const ALL: [Variation; 3] = [Variation::A, Variation::B, Variation::C];

    /// Weighted scale-step table used for voice leading.
    pub fn step_table(self) -> &'static [(i32, f64)] {
        match self {
            Variation::A => SMOOTH_STEPS,
            Variation::B => AGGRESSIVE_STEPS,
            Variation::C => MOTIVIC_STEPS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variation::A => "Melodic",
            Variation::B => "Trap",
            Variation::C => "Motivic",
        }
    }

    /// A short note on what the variation does musically.
    pub fn explanation(self) -> &'static str {
        match self {
            Variation::A => {
                "Variation A (Melodic): moves mostly by step with gentle voice \
                 leading, giving a lyrical line that suits hooks and emotional \
                 sections."
            }
            Variation::B => {
                "Variation B (Trap): wider leaps, repeated notes, rests and \
                 strong velocity accents give a percussive, syncopated line \
                 that builds tension through repetition."
            }
            Variation::C => {
                "Variation C (Motivic): states a four-note motif and develops \
                 it by repetition and sequence, trading predictability against \
                 variation."
            }
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Variation::A => "A",
            Variation::B => "B",
            Variation::C => "C",
        };
        f.write_str(letter)
    }
}

impl FromStr for Variation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Variation::A),
            "B" => Ok(Variation::B),
            "C" => Ok(Variation::C),
            other => Err(format!("unknown variation '{other}' (expected A, B or C)")),
        }
    }
}

/// Which of the two bar rhythms a bar of a phrase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarRole {
    A,
    B,
}

/// Four-bar macro form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseForm {
    Aaba,
    Abab,
}

impl PhraseForm {
    pub const ALL: [PhraseForm; 2] = [PhraseForm::Aaba, PhraseForm::Abab];

    pub fn bar_roles(self) -> [BarRole; 4] {
        match self {
            PhraseForm::Aaba => [BarRole::A, BarRole::A, BarRole::B, BarRole::A],
            PhraseForm::Abab => [BarRole::A, BarRole::B, BarRole::A, BarRole::B],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MelodyGenerator {
    key: String,
    scale_name: String,
    tempo: u32,
    length_bars: u32,
    time_signature: TimeSignature,
    scale: ScaleTable,
    rng: StdRng,
}

impl MelodyGenerator {
    /// Create a generator over octaves 3-5 in 4/4.
    ///
    /// An unresolvable key is treated as C, an unknown scale as natural
    /// minor. A zero tempo or bar count is raised to 1.
    pub fn new(key: &str, scale: &str, tempo: u32, length_bars: u32, seed: Option<u64>) -> Self {
        if tempo == 0 || length_bars == 0 {
            log::warn!("tempo {tempo} / bars {length_bars} must be positive; raising to 1");
        }
        let (lo, hi) = DEFAULT_OCTAVES;
        MelodyGenerator {
            key: key.to_string(),
            scale_name: scale.to_string(),
            tempo: tempo.max(1),
            length_bars: length_bars.max(1),
            time_signature: TimeSignature::default(),
            scale: ScaleTable::new(root_or_default(key), scale, lo, hi),
            rng: seeded_rng(seed),
        }
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    /// Use a different octave window. Ignored if it would leave no pitches.
    pub fn with_octaves(mut self, octave_lo: i32, octave_hi: i32) -> Self {
        let table = ScaleTable::new(self.scale.root_pc(), &self.scale_name, octave_lo, octave_hi);
        if table.is_empty() {
            log::warn!("octaves {octave_lo}..={octave_hi} contain no pitches; keeping current range");
        } else {
            self.scale = table;
        }
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scale_name(&self) -> &str {
        &self.scale_name
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn length_bars(&self) -> u32 {
        self.length_bars
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// The working scale: every pitch the melody may use.
    pub fn scale(&self) -> &ScaleTable {
        &self.scale
    }

    /// Total beats the melody spans.
    pub fn total_beats(&self) -> f64 {
        f64::from(self.length_bars) * self.time_signature.beats_per_bar()
    }

    /// A short seed idea: `n` pitches from a weighted walk that starts in the
    /// middle of the range.
    pub fn generate_motif(&mut self, n: usize) -> Vec<u8> {
        let mut index = self.scale.mid_index();
        let mut motif = Vec::with_capacity(n);
        for _ in 0..n {
            let step = pick_weighted(MOTIF_STEPS, &mut self.rng);
            index = self.scale.step_clamped(index, step);
            motif.push(self.scale.pitch_at(index));
        }
        motif
    }

    /// Durations for a whole phrase of `total_bars` bars.
    pub fn generate_phrase_rhythm(&mut self, total_bars: u32) -> Vec<f64> {
        let beats = self.time_signature.beats_per_bar();
        let bar_a = generate_pattern(beats, RhythmStyle::Trap, &mut self.rng);
        let bar_b = generate_pattern(beats, RhythmStyle::Trap, &mut self.rng);
        let form = PhraseForm::ALL[self.rng.random_range(0..PhraseForm::ALL.len())];

        if total_bars != PHRASE_BARS {
            return (0..total_bars)
                .flat_map(|_| bar_a.durations().iter().copied())
                .collect();
        }

        log::debug!("phrase form {form:?}");
        form.bar_roles()
            .into_iter()
            .flat_map(|role| match role {
                BarRole::A => bar_a.durations(),
                BarRole::B => bar_b.durations(),
            })
            .copied()
            .collect()
    }

    /// Next pitch after `current_pitch`, one weighted step in scale degrees.
    /// Out-of-scale pitches start from the middle of the range.
    pub fn apply_voice_leading(&mut self, current_pitch: u8, variation: Variation) -> u8 {
        let index = self
            .scale
            .index_of(current_pitch)
            .unwrap_or_else(|| self.scale.mid_index());
        let step = pick_weighted(variation.step_table(), &mut self.rng);
        self.scale.pitch_at(self.scale.step_clamped(index, step))
    }

    /// A complete melody in the given variation.
    pub fn generate_variation(&mut self, variation: Variation) -> Vec<NoteEvent> {
        let rhythm = self.generate_phrase_rhythm(self.length_bars);
        let beats_per_bar = self.time_signature.beats_per_bar();
        let phrase_beats = beats_per_bar * f64::from(PHRASE_BARS);
        let group_beats = beats_per_bar * 2.0;

        let motif = match variation {
            Variation::C => self.generate_motif(MOTIF_LENGTH),
            _ => Vec::new(),
        };

        let mut current = self.scale.pitch_at(self.scale.mid_index());
        let mut cursor = 0.0;
        let mut melody = Vec::with_capacity(rhythm.len());

        for (slot, &duration) in rhythm.iter().enumerate() {
            let slot_end = cursor + duration;
            let phrase_end = slot + 1 == rhythm.len() || ends_on_multiple(slot_end, phrase_beats);

            let mut pitch = if motif.is_empty() {
                self.apply_voice_leading(current, variation)
            } else {
                let pitch = motif[slot % motif.len()];
                let group = (cursor / group_beats + EPSILON).floor() as u64;
                if group % 2 == 1 {
                    self.shift_in_scale(pitch, MOTIF_SHIFT)
                } else {
                    pitch
                }
            };

            if phrase_end {
                pitch = self.scale.nearest_stable(pitch);
            }

            let silent = variation == Variation::B
                && !phrase_end
                && self.rng.random_bool(REST_PROBABILITY);

            if !silent {
                let velocity = match variation {
                    Variation::B => ACCENTS[self.rng.random_range(0..ACCENTS.len())],
                    Variation::A | Variation::C => {
                        self.rng.random_range(VELOCITY_RANGE.0..=VELOCITY_RANGE.1)
                    }
                };
                melody.push(NoteEvent::new(
                    i32::from(pitch),
                    duration,
                    i32::from(velocity),
                    cursor,
                ));
                current = pitch;
            }

            cursor = slot_end;
        }

        melody
    }

    fn shift_in_scale(&self, pitch: u8, steps: i32) -> u8 {
        match self.scale.index_of(pitch) {
            Some(index) => self.scale.pitch_at(self.scale.step_clamped(index, steps)),
            None => pitch,
        }
    }
}

/// Whether `beats` lands on a whole multiple of `period` (and is past zero).
fn ends_on_multiple(beats: f64, period: f64) -> bool {
    if period <= 0.0 || beats <= EPSILON {
        return false;
    }
    let ratio = beats / period;
    (ratio - ratio.round()).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generator(bars: u32, seed: u64) -> MelodyGenerator {
        MelodyGenerator::new("C", "minor", 140, bars, Some(seed))
    }

    #[test]
    fn motif_stays_in_scale_and_starts_near_middle() {
        for seed in 0..50 {
            let mut melody = generator(4, seed);
            let mid = melody.scale().mid_index();
            let motif = melody.generate_motif(4);
            assert_eq!(motif.len(), 4);
            let first = melody.scale().index_of(motif[0]).unwrap();
            assert!(first.abs_diff(mid) <= 3);
            for pair in motif.windows(2) {
                let a = melody.scale().index_of(pair[0]).unwrap();
                let b = melody.scale().index_of(pair[1]).unwrap();
                assert!(a.abs_diff(b) <= 3, "motif step too large: {motif:?}");
            }
        }
    }

    #[test]
    fn four_bar_rhythm_follows_a_form() {
        for seed in 0..50 {
            let mut melody = generator(4, seed);
            let rhythm = melody.generate_phrase_rhythm(4);
            assert_eq!(rhythm.iter().sum::<f64>(), 16.0);

            // Split back into bars and check the form.
            let mut bars: Vec<Vec<f64>> = vec![Vec::new()];
            let mut acc = 0.0;
            for &d in &rhythm {
                bars.last_mut().unwrap().push(d);
                acc += d;
                if acc == 4.0 {
                    bars.push(Vec::new());
                    acc = 0.0;
                }
            }
            bars.pop();
            assert_eq!(bars.len(), 4, "seed {seed}: bar lines not respected");
            let aaba = bars[0] == bars[1] && bars[0] == bars[3];
            let abab = bars[0] == bars[2] && bars[1] == bars[3];
            assert!(aaba || abab, "seed {seed}: {bars:?}");
        }
    }

    #[test]
    fn other_lengths_repeat_one_bar() {
        let mut melody = generator(3, 8);
        let rhythm = melody.generate_phrase_rhythm(3);
        assert_eq!(rhythm.iter().sum::<f64>(), 12.0);
        assert_eq!(rhythm.len() % 3, 0);
        let bar = rhythm.len() / 3;
        assert_eq!(&rhythm[..bar], &rhythm[bar..2 * bar]);
        assert_eq!(&rhythm[..bar], &rhythm[2 * bar..]);
    }

    #[test]
    fn voice_leading_a_moves_at_most_one_step() {
        let mut melody = generator(4, 21);
        let mut pitch = melody.scale().pitch_at(melody.scale().mid_index());
        for _ in 0..500 {
            let next = melody.apply_voice_leading(pitch, Variation::A);
            let a = melody.scale().index_of(pitch).unwrap();
            let b = melody.scale().index_of(next).unwrap();
            assert!(a.abs_diff(b) <= 1);
            pitch = next;
        }
    }

    #[test]
    fn voice_leading_clamps_at_range_edges() {
        let mut melody = generator(4, 3);
        let lowest = melody.scale().pitches()[0];
        let highest = *melody.scale().pitches().last().unwrap();
        for _ in 0..200 {
            let down = melody.apply_voice_leading(lowest, Variation::B);
            assert!(melody.scale().index_of(down).unwrap() <= 7);
            let up = melody.apply_voice_leading(highest, Variation::B);
            assert!(up <= highest && up >= lowest);
        }
    }

    #[test]
    fn voice_leading_from_outside_scale_uses_middle() {
        let mut melody = generator(4, 4);
        let mid = melody.scale().mid_index();
        for _ in 0..100 {
            // 61 (C#) is not in C minor.
            let next = melody.apply_voice_leading(61, Variation::A);
            let index = melody.scale().index_of(next).unwrap();
            assert!(index.abs_diff(mid) <= 1);
        }
    }

    #[test]
    fn variations_fill_four_bars() {
        for variation in [Variation::A, Variation::C] {
            for seed in 0..30 {
                let events = generator(4, seed).generate_variation(variation);
                let total: f64 = events.iter().map(|e| e.duration).sum();
                assert!((total - 16.0).abs() < 0.1, "{variation} seed {seed}: {total}");
                let end = events.last().unwrap().end();
                assert_eq!(end, 16.0);
            }
        }
    }

    #[test]
    fn variation_b_rests_keep_time() {
        for seed in 0..30 {
            let events = generator(4, seed).generate_variation(Variation::B);
            assert!(events.windows(2).all(|w| w[0].end() <= w[1].offset + 1e-9));
            assert_eq!(events.last().unwrap().end(), 16.0);
            for e in &events {
                assert!(ACCENTS.contains(&e.velocity));
            }
        }
    }

    #[test]
    fn variation_b_leaves_some_space() {
        let mut silent_slots = 0;
        for seed in 0..20 {
            let mut melody = generator(4, seed);
            let events = melody.generate_variation(Variation::B);
            let total: f64 = events.iter().map(|e| e.duration).sum();
            if total < 16.0 {
                silent_slots += 1;
            }
        }
        assert!(silent_slots > 10, "rests should be common across seeds");
    }

    #[test]
    fn phrase_ends_resolve_to_stable_pitches() {
        for variation in Variation::ALL {
            for seed in 0..30 {
                let mut melody = generator(8, seed);
                let stable = melody.scale().stable_pitches().to_vec();
                let events = melody.generate_variation(variation);
                let last = events.last().unwrap();
                assert!(stable.contains(&last.pitch), "{variation} seed {seed}");
                for e in &events {
                    if ends_on_multiple(e.end(), 16.0) {
                        assert!(stable.contains(&e.pitch), "{variation} seed {seed}: {e:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn every_note_is_diatonic() {
        for variation in Variation::ALL {
            let mut melody = MelodyGenerator::new("F#", "phrygian", 140, 4, Some(12));
            let events = melody.generate_variation(variation);
            for e in events {
                assert!(melody.scale().index_of(e.pitch).is_some());
                assert!((1..=127).contains(&e.velocity));
            }
        }
    }

    #[test]
    fn variation_c_cycles_its_motif() {
        let mut melody = generator(4, 99);
        let events = melody.generate_variation(Variation::C);
        // No rests, so slots line up with events.
        let first_group: Vec<&NoteEvent> = events.iter().filter(|e| e.end() < 8.0 - 1e-9).collect();
        for (i, e) in first_group.iter().enumerate().skip(4) {
            if !ends_on_multiple(e.end(), 16.0) {
                assert_eq!(e.pitch, first_group[i - 4].pitch);
            }
        }
    }

    #[test]
    fn three_four_meter() {
        let mut melody = generator(4, 5).with_time_signature(TimeSignature::parse("3/4"));
        assert_eq!(melody.total_beats(), 12.0);
        let events = melody.generate_variation(Variation::A);
        assert_eq!(events.last().unwrap().end(), 12.0);
    }

    #[test]
    fn octave_window_override() {
        let melody = generator(4, 0).with_octaves(4, 4);
        assert_eq!(melody.scale().pitches(), &[60, 62, 63, 65, 67, 68, 70]);
        let unchanged = generator(4, 0).with_octaves(12, 14);
        assert_eq!(unchanged.scale().len(), 21);
    }

    #[test]
    fn same_seed_same_melody() {
        for variation in Variation::ALL {
            let a = generator(4, 1234).generate_variation(variation);
            let b = generator(4, 1234).generate_variation(variation);
            assert_eq!(a, b);
        }
        let a = generator(4, 1).generate_variation(Variation::A);
        let b = generator(4, 2).generate_variation(Variation::A);
        assert_ne!(a, b);
    }

    #[test]
    fn zero_bars_raised_to_one() {
        let mut melody = MelodyGenerator::new("C", "minor", 0, 0, Some(1));
        assert_eq!(melody.tempo(), 1);
        assert_eq!(melody.length_bars(), 1);
        let events = melody.generate_variation(Variation::A);
        assert_eq!(events.last().unwrap().end(), 4.0);
    }

    #[test]
    fn variation_names() {
        assert_eq!("b".parse::<Variation>().unwrap(), Variation::B);
        assert!("D".parse::<Variation>().is_err());
        assert_eq!(Variation::C.to_string(), "C");
        assert!(Variation::A.explanation().starts_with("Variation A"));
        let labels: Vec<&str> = Variation::ALL.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["Melodic", "Trap", "Motivic"]);
    }
}
