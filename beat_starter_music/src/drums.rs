// Drum patterns driven by a per-style kit table.
//
// Every style runs the same three layers per bar, parameterized by its
// `DrumKitConfig`:
// - Timekeeping: evenly spaced hi-hat (or ride) slots. Each slot is either a
//   single hit or, with the style's roll probability, four equal
//   subdivisions played as separate hits.
// - Backbeat: one snare or rimshot at a fixed offset.
// - Kick: always on the downbeat, plus each candidate syncopation offset
//   included independently with the style's probability.
//
// Velocities are drawn per hit from the style's inclusive ranges. Bars are
// always four beats; drum patterns ignore the melody's meter.

use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beat_starter_smf::NoteEvent;

use crate::choice::seeded_rng;

/// Beats in one drum bar.
pub const DRUM_BEATS_PER_BAR: f64 = 4.0;

/// Subdivisions in a hi-hat roll.
pub const ROLL_HITS: u32 = 4;

/// General MIDI percussion keys used by the kits.
pub mod gm {
    pub const KICK: u8 = 36;
    pub const RIMSHOT: u8 = 37;
    pub const SNARE: u8 = 38;
    pub const CLOSED_HAT: u8 = 42;
    pub const RIDE: u8 = 51;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumStyle {
    /// Half-time snare, busy hats with frequent rolls.
    #[default]
    Trap,
    /// Straight eighth hats, snare on two, swung kick pickups.
    BoomBap,
    /// Sparse ride, rimshot backbeat, soft dynamics.
    LoFi,
}

impl DrumStyle {
    pub const ALL: [DrumStyle; 3] = [DrumStyle::Trap, DrumStyle::BoomBap, DrumStyle::LoFi];

    pub fn name(self) -> &'static str {
        match self {
            DrumStyle::Trap => "trap",
            DrumStyle::BoomBap => "boombap",
            DrumStyle::LoFi => "lofi",
        }
    }

    /// Case-insensitive lookup; hyphens and spaces are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .collect();
        Self::ALL.into_iter().find(|style| style.name() == key)
    }

    /// Look up a style by name, falling back to trap.
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown drum style '{name}', using trap");
            DrumStyle::Trap
        })
    }

    pub fn config(self) -> &'static DrumKitConfig {
        match self {
            DrumStyle::Trap => &TRAP_KIT,
            DrumStyle::BoomBap => &BOOM_BAP_KIT,
            DrumStyle::LoFi => &LO_FI_KIT,
        }
    }
}

impl fmt::Display for DrumStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive velocity bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityRange {
    pub low: u8,
    pub high: u8,
}

impl VelocityRange {
    const fn new(low: u8, high: u8) -> Self {
        VelocityRange { low, high }
    }

    fn sample(self, rng: &mut impl Rng) -> u8 {
        rng.random_range(self.low..=self.high)
    }

    pub fn contains(self, velocity: u8) -> bool {
        (self.low..=self.high).contains(&velocity)
    }
}

/// Everything that distinguishes one drum style from another.
#[derive(Debug, Clone, PartialEq)]
pub struct DrumKitConfig {
    pub slots_per_bar: u32,
    /// Length of a single timekeeping hit. Rolls split this into four.
    pub slot_duration: f64,
    pub slot_pitch: u8,
    pub slot_velocity: VelocityRange,
    pub roll_probability: f64,
    pub roll_velocity: VelocityRange,

    pub backbeat_offset: f64,
    pub backbeat_pitch: u8,
    pub backbeat_duration: f64,
    pub backbeat_velocity: VelocityRange,

    pub kick_pitch: u8,
    pub kick_duration: f64,
    pub kick_velocity: VelocityRange,
    /// Optional kick offsets after the downbeat.
    pub kick_candidates: &'static [f64],
    pub kick_probability: f64,
}

pub static TRAP_KIT: DrumKitConfig = DrumKitConfig {
    slots_per_bar: 8,
    slot_duration: 0.5,
    slot_pitch: gm::CLOSED_HAT,
    slot_velocity: VelocityRange::new(80, 100),
    roll_probability: 0.15,
    roll_velocity: VelocityRange::new(70, 90),
    backbeat_offset: 2.0,
    backbeat_pitch: gm::SNARE,
    backbeat_duration: 1.0,
    backbeat_velocity: VelocityRange::new(120, 127),
    kick_pitch: gm::KICK,
    kick_duration: 0.5,
    kick_velocity: VelocityRange::new(112, 127),
    kick_candidates: &[1.5, 2.5, 3.0, 3.5],
    kick_probability: 0.4,
};

pub static BOOM_BAP_KIT: DrumKitConfig = DrumKitConfig {
    slots_per_bar: 8,
    slot_duration: 0.5,
    slot_pitch: gm::CLOSED_HAT,
    slot_velocity: VelocityRange::new(60, 95),
    roll_probability: 0.03,
    roll_velocity: VelocityRange::new(50, 70),
    backbeat_offset: 1.0,
    backbeat_pitch: gm::SNARE,
    backbeat_duration: 0.5,
    backbeat_velocity: VelocityRange::new(105, 120),
    kick_pitch: gm::KICK,
    kick_duration: 0.5,
    kick_velocity: VelocityRange::new(100, 118),
    kick_candidates: &[0.75, 2.0, 2.5, 3.25],
    kick_probability: 0.5,
};

pub static LO_FI_KIT: DrumKitConfig = DrumKitConfig {
    slots_per_bar: 4,
    slot_duration: 1.0,
    slot_pitch: gm::RIDE,
    slot_velocity: VelocityRange::new(45, 70),
    roll_probability: 0.05,
    roll_velocity: VelocityRange::new(40, 60),
    backbeat_offset: 2.0,
    backbeat_pitch: gm::RIMSHOT,
    backbeat_duration: 0.5,
    backbeat_velocity: VelocityRange::new(70, 90),
    kick_pitch: gm::KICK,
    kick_duration: 0.5,
    kick_velocity: VelocityRange::new(80, 100),
    kick_candidates: &[1.75, 2.5, 3.5],
    kick_probability: 0.35,
};

#[derive(Debug, Clone)]
pub struct DrumGenerator {
    tempo: u32,
    style: DrumStyle,
    rng: StdRng,
}

impl DrumGenerator {
    pub fn new(tempo: u32, style: DrumStyle, seed: Option<u64>) -> Self {
        DrumGenerator {
            tempo,
            style,
            rng: seeded_rng(seed),
        }
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn style(&self) -> DrumStyle {
        self.style
    }

    /// Hits for `length_bars` bars, bar by bar: timekeeping, backbeat, kicks.
    pub fn generate_pattern(&mut self, length_bars: usize) -> Vec<NoteEvent> {
        let kit = self.style.config();
        log::debug!("{} drums at {} bpm over {length_bars} bars", self.style, self.tempo);
        let mut events = Vec::new();
        for bar in 0..length_bars {
            let bar_offset = bar as f64 * DRUM_BEATS_PER_BAR;
            self.timekeeping(kit, bar_offset, &mut events);

            events.push(hit(
                kit.backbeat_pitch,
                kit.backbeat_duration,
                kit.backbeat_velocity.sample(&mut self.rng),
                bar_offset + kit.backbeat_offset,
            ));

            events.push(hit(
                kit.kick_pitch,
                kit.kick_duration,
                kit.kick_velocity.sample(&mut self.rng),
                bar_offset,
            ));
            for &spot in kit.kick_candidates {
                if self.rng.random_bool(kit.kick_probability) {
                    events.push(hit(
                        kit.kick_pitch,
                        kit.kick_duration,
                        kit.kick_velocity.sample(&mut self.rng),
                        bar_offset + spot,
                    ));
                }
            }
        }
        events
    }

    fn timekeeping(&mut self, kit: &DrumKitConfig, bar_offset: f64, events: &mut Vec<NoteEvent>) {
        let spacing = DRUM_BEATS_PER_BAR / f64::from(kit.slots_per_bar);
        for slot in 0..kit.slots_per_bar {
            let slot_offset = bar_offset + f64::from(slot) * spacing;
            if self.rng.random_bool(kit.roll_probability) {
                let roll_step = kit.slot_duration / f64::from(ROLL_HITS);
                for r in 0..ROLL_HITS {
                    events.push(hit(
                        kit.slot_pitch,
                        roll_step,
                        kit.roll_velocity.sample(&mut self.rng),
                        slot_offset + f64::from(r) * roll_step,
                    ));
                }
            } else {
                events.push(hit(
                    kit.slot_pitch,
                    kit.slot_duration,
                    kit.slot_velocity.sample(&mut self.rng),
                    slot_offset,
                ));
            }
        }
    }
}

fn hit(pitch: u8, duration: f64, velocity: u8, offset: f64) -> NoteEvent {
    NoteEvent::new(i32::from(pitch), duration, i32::from(velocity), offset)
}
