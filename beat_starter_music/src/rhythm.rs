// Rhythm: filling a beat budget with weighted-random note durations, and the
// meter that sets how many beats a bar holds.
//
// Durations come from a fixed per-style table on a sixteenth-note grid. The
// last draw is clipped to whatever budget remains; a clipped remainder below
// one grid unit is merged into the previous duration rather than emitted as a
// sliver. Because every table value is a multiple of 0.25, the sums are exact
// in binary floating point.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::choice::pick_weighted;

/// Smallest duration a pattern emits on its own, in beats.
pub const GRID_UNIT: f64 = 0.25;

const EPSILON: f64 = 1e-9;

/// Duration vocabulary for a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmStyle {
    /// Even eighths and quarters with occasional sixteenths.
    Straight,
    /// Sixteenths, eighths and quarters in equal measure plus dotted quarters
    /// for syncopation.
    Trap,
}

impl RhythmStyle {
    /// `(duration in beats, weight)` pairs.
    pub fn durations(self) -> &'static [(f64, f64)] {
        match self {
            RhythmStyle::Straight => &[(0.25, 10.0), (0.5, 40.0), (0.75, 10.0), (1.0, 40.0)],
            RhythmStyle::Trap => &[(0.25, 30.0), (0.5, 30.0), (1.0, 30.0), (1.5, 10.0)],
        }
    }
}

/// Ordered note durations that sum to the requested beat budget.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RhythmPattern {
    durations: Vec<f64>,
}

impl RhythmPattern {
    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn total(&self) -> f64 {
        self.durations.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

/// Draw durations for `style` until they fill `beat_budget` exactly.
///
/// A non-positive budget yields an empty pattern.
pub fn generate_pattern(beat_budget: f64, style: RhythmStyle, rng: &mut impl Rng) -> RhythmPattern {
    let mut durations: Vec<f64> = Vec::new();
    let mut filled = 0.0;

    while beat_budget - filled > EPSILON {
        let remaining = beat_budget - filled;
        let mut duration = pick_weighted(style.durations(), rng);
        if duration > remaining {
            duration = remaining;
        }
        match durations.last_mut() {
            Some(last) if duration < GRID_UNIT - EPSILON => *last += duration,
            _ => durations.push(duration),
        }
        filled += duration;
    }

    RhythmPattern { durations }
}

/// Beats per bar and the note value of one beat, e.g. 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats_per_bar: u32,
    pub beat_unit: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            beats_per_bar: 4,
            beat_unit: 4,
        }
    }
}

impl TimeSignature {
    /// Parse `"N/D"`. Anything malformed, including zero parts, gives 4/4.
    pub fn parse(text: &str) -> Self {
        Self::try_parse(text).unwrap_or_else(|| {
            log::warn!("malformed time signature '{text}', using 4/4");
            Self::default()
        })
    }

    fn try_parse(text: &str) -> Option<Self> {
        let (num, den) = text.split_once('/')?;
        let beats_per_bar: u32 = num.trim().parse().ok()?;
        let beat_unit: u32 = den.trim().parse().ok()?;
        (beats_per_bar > 0 && beat_unit > 0).then_some(TimeSignature {
            beats_per_bar,
            beat_unit,
        })
    }

    pub fn beats_per_bar(&self) -> f64 {
        f64::from(self.beats_per_bar)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_bar, self.beat_unit)
    }
}
