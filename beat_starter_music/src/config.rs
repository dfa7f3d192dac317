// Beat request: every knob the pipeline reads, loadable from JSON.
//
// Every field has a default, so a config file only needs the fields it wants
// to change. Values are not validated here; the engines substitute defaults
// for anything they cannot use (and log a warning when they do).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drums::DrumStyle;
use crate::error::MusicError;
use crate::melody::Variation;
use crate::rhythm::TimeSignature;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatRequest {
    /// Root note name, e.g. "C", "F#", "Bb".
    pub key: String,
    /// Scale name, e.g. "minor", "harmonic_minor".
    pub scale: String,
    pub tempo: u32,
    pub bars: u32,
    pub variation: Variation,
    pub add_chords: bool,
    pub add_drums: bool,
    pub drum_style: DrumStyle,
    /// Meter as "N/D".
    pub time_signature: String,
    /// Master seed. `None` draws from the OS and is not reproducible.
    pub seed: Option<u64>,
}

impl Default for BeatRequest {
    fn default() -> Self {
        BeatRequest {
            key: "C".to_string(),
            scale: "minor".to_string(),
            tempo: 140,
            bars: 4,
            variation: Variation::B,
            add_chords: true,
            add_drums: true,
            drum_style: DrumStyle::Trap,
            time_signature: "4/4".to_string(),
            seed: None,
        }
    }
}

impl BeatRequest {
    /// Read a request from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, MusicError> {
        let data = std::fs::read_to_string(path)?;
        let request: BeatRequest = serde_json::from_str(&data)?;
        Ok(request)
    }

    pub fn parsed_time_signature(&self) -> TimeSignature {
        TimeSignature::parse(&self.time_signature)
    }
}
