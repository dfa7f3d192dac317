// Scale theory: note names, scale interval tables, and stable-degree tests.
//
// Hip-hop and trap writing leans on a handful of minor-leaning scales, so the
// catalogue here is small and fixed. Everything is pure and stateless except
// `ScaleTable`, which precomputes one generator's working pitches so chord
// building and voice leading never rebuild them.
//
// Name handling is forgiving by contract: an unknown scale name means natural
// minor, and generator-level callers substitute C for a root they cannot
// resolve. Only `resolve_pitch_class` reports bad input.
//
// Stability is decided by the tonic (0), dominant (7), and a third whose size
// depends on whether the *scale name* reads as major-family or minor-family.
// That is a substring test on the name, not a lookup of the scale's actual
// third. "pentatonic_major" counts as major; "blues" counts as minor.

use serde::{Deserialize, Serialize};

use crate::error::MusicError;

/// Sharp spellings of the twelve pitch classes, indexed by pitch class.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Named scale templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    /// Natural minor (aeolian). The fallback for unknown names.
    Minor,
    HarmonicMinor,
    /// Minor with a flat second; common in trap.
    Phrygian,
    Dorian,
    PentatonicMinor,
    PentatonicMajor,
    /// Minor blues: minor pentatonic plus the flat fifth.
    Blues,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 8] = [
        ScaleKind::Major,
        ScaleKind::Minor,
        ScaleKind::HarmonicMinor,
        ScaleKind::Phrygian,
        ScaleKind::Dorian,
        ScaleKind::PentatonicMinor,
        ScaleKind::PentatonicMajor,
        ScaleKind::Blues,
    ];

    /// Semitone offsets from the root, strictly ascending, all below 12.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::PentatonicMinor => &[0, 3, 5, 7, 10],
            ScaleKind::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleKind::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Canonical lookup key, e.g. `"harmonic_minor"`.
    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
            ScaleKind::HarmonicMinor => "harmonic_minor",
            ScaleKind::Phrygian => "phrygian",
            ScaleKind::Dorian => "dorian",
            ScaleKind::PentatonicMinor => "pentatonic_minor",
            ScaleKind::PentatonicMajor => "pentatonic_major",
            ScaleKind::Blues => "blues",
        }
    }

    /// Look up a scale by name. Case-insensitive; spaces count as underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_scale_name(name);
        Self::ALL.into_iter().find(|kind| kind.name() == key)
    }

    /// Look up a scale by name, falling back to natural minor.
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown scale '{name}', using natural minor");
            ScaleKind::Minor
        })
    }
}

fn normalize_scale_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Resolve a note name to its pitch class (0-11).
///
/// Accepts the twelve sharp spellings and the five flat aliases Db, Eb, Gb,
/// Ab, Bb, all case-insensitively. Cb, Fb, double accidentals and the empty
/// string are rejected.
pub fn resolve_pitch_class(name: &str) -> Result<u8, MusicError> {
    let upper = name.trim().to_uppercase();
    let sharp = match upper.as_str() {
        "DB" => "C#",
        "EB" => "D#",
        "GB" => "F#",
        "AB" => "G#",
        "BB" => "A#",
        other => other,
    };
    NOTE_NAMES
        .iter()
        .position(|&n| n == sharp)
        .map(|pc| pc as u8)
        .ok_or_else(|| MusicError::InvalidNoteName(name.to_string()))
}

/// Resolve a root name, substituting C (pitch class 0) when it is invalid.
pub fn root_or_default(name: &str) -> u8 {
    resolve_pitch_class(name).unwrap_or_else(|e| {
        log::warn!("{e}; using C");
        0
    })
}

/// Pitches of a named scale across `octave_lo..=octave_hi`, ascending.
///
/// Octave numbering puts middle C (60) in octave 4. Pitches outside 0-127
/// are dropped. Unknown roots fall back to C and unknown scales to natural
/// minor.
pub fn scale_pitches(root: &str, scale_name: &str, octave_lo: i32, octave_hi: i32) -> Vec<u8> {
    pitches_in_octaves(
        root_or_default(root),
        ScaleKind::resolve(scale_name),
        octave_lo,
        octave_hi,
    )
}

/// Like [`scale_pitches`], for an already-resolved root and scale.
pub fn pitches_in_octaves(root_pc: u8, kind: ScaleKind, octave_lo: i32, octave_hi: i32) -> Vec<u8> {
    let mut pitches = Vec::new();
    for octave in octave_lo..=octave_hi {
        let octave_root = i32::from(root_pc % 12) + (octave + 1) * 12;
        for &interval in kind.intervals() {
            let pitch = octave_root + i32::from(interval);
            if (0..=127).contains(&pitch) {
                pitches.push(pitch as u8);
            }
        }
    }
    pitches
}

/// Whether a scale name reads as major-family (mentions "major" but not
/// "minor").
pub fn is_major_family(scale_name: &str) -> bool {
    let key = normalize_scale_name(scale_name);
    key.contains("major") && !key.contains("minor")
}

/// Whether an interval above the root (0-11) is a stable degree.
pub fn is_stable_interval(interval: u8, major_family: bool) -> bool {
    match interval {
        0 | 7 => true,
        4 => major_family,
        3 => !major_family,
        _ => false,
    }
}

/// Whether `pitch` is the tonic, dominant, or family-appropriate third of
/// the scale rooted at `root`.
pub fn classify_stability(pitch: u8, root: &str, scale_name: &str) -> bool {
    let root_pc = root_or_default(root);
    is_stable_interval(interval_above(pitch, root_pc), is_major_family(scale_name))
}

fn interval_above(pitch: u8, root_pc: u8) -> u8 {
    (pitch % 12 + 12 - root_pc % 12) % 12
}

/// Name with octave, e.g. 60 -> "C4", 61 -> "C#4".
pub fn note_name(pitch: u8) -> String {
    if pitch > 127 {
        return "Unknown".to_string();
    }
    let octave = i32::from(pitch / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(pitch % 12)], octave)
}

/// Absolute distance in semitones.
pub fn interval_between(a: u8, b: u8) -> u8 {
    a.abs_diff(b)
}

/// One generator's working scale: every in-scale pitch across an octave
/// window, plus the stable subset.
#[derive(Debug, Clone)]
pub struct ScaleTable {
    root_pc: u8,
    pitches: Vec<u8>,
    stable: Vec<u8>,
}

impl ScaleTable {
    /// Build the table. `scale_name` picks the template (unknown names give
    /// natural minor) and, by substring, the stability family.
    pub fn new(root_pc: u8, scale_name: &str, octave_lo: i32, octave_hi: i32) -> Self {
        let root_pc = root_pc % 12;
        let kind = ScaleKind::resolve(scale_name);
        let major = is_major_family(scale_name);
        let pitches = pitches_in_octaves(root_pc, kind, octave_lo, octave_hi);
        let stable = pitches
            .iter()
            .copied()
            .filter(|&p| is_stable_interval(interval_above(p, root_pc), major))
            .collect();
        ScaleTable {
            root_pc,
            pitches,
            stable,
        }
    }

    pub fn root_pc(&self) -> u8 {
        self.root_pc
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    /// Tonic, third and fifth occurrences, ascending.
    pub fn stable_pitches(&self) -> &[u8] {
        &self.stable
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Index of the middle of the range; where melodies start.
    pub fn mid_index(&self) -> usize {
        self.pitches.len() / 2
    }

    pub fn pitch_at(&self, index: usize) -> u8 {
        self.pitches[index.min(self.pitches.len().saturating_sub(1))]
    }

    /// Position of `pitch` in the table, if it is in scale.
    pub fn index_of(&self, pitch: u8) -> Option<usize> {
        self.pitches.binary_search(&pitch).ok()
    }

    /// Move `step` scale degrees from `index`, stopping at either end of the
    /// table instead of wrapping.
    pub fn step_clamped(&self, index: usize, step: i32) -> usize {
        let last = self.pitches.len().saturating_sub(1) as i64;
        (index as i64 + i64::from(step)).clamp(0, last) as usize
    }

    /// The stable pitch closest to `pitch`. Ties go to the lower table entry.
    /// Returns `pitch` itself if the table has no stable pitches.
    pub fn nearest_stable(&self, pitch: u8) -> u8 {
        let mut best = pitch;
        let mut best_dist = u8::MAX;
        for &candidate in &self.stable {
            let dist = interval_between(candidate, pitch);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }
}
