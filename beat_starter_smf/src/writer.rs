// Standard MIDI File output for multi-track note sequences.
//
// Converts `Track`s of beat-positioned `NoteEvent`s into an SMF Format 1 file:
// one `MThd` header chunk followed by one `MTrk` chunk per track, in the order
// tracks were added. Each track chunk holds a track-name meta event, the
// note-on/note-off stream with variable-length delta times, and an
// end-of-track meta event.
//
// Tick conversion rounds to the nearest tick: start = round(offset * ppq),
// end = round((offset + duration) * ppq). Every note is split into a note-on
// edge and a note-off edge, and the track's edges are merged by tick. At an
// equal tick, note-offs are emitted before note-ons so a note that ends
// exactly where the next one starts is released first. Within each kind,
// edges keep the order of their notes after the stable offset sort. A note
// whose rounded span collapses to zero ticks is stretched to one tick so its
// note-off can never precede its note-on.
//
// Every event is written with an explicit status byte (no running status),
// so the byte layout is fully determined by the tracks and the resolution.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SmfError;
use crate::types::{NoteEvent, TICKS_PER_BEAT, Track};
use crate::vlq::write_vlq;

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;

/// SMF format 1: several tracks played simultaneously.
const FORMAT_PARALLEL: u16 = 1;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const META: u8 = 0xFF;
const META_TRACK_NAME: u8 = 0x03;
const META_END_OF_TRACK: u8 = 0x2F;

/// Largest ticks-per-beat value the 15-bit header division field allows.
const MAX_RESOLUTION: u16 = 0x7FFF;

/// Convert a beat position into ticks, rounding to the nearest tick.
pub fn beats_to_ticks(beats: f64, resolution: u16) -> u64 {
    (beats * f64::from(resolution)).round().max(0.0) as u64
}

/// Edge kinds, ordered so that note-offs sort ahead of note-ons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    Off,
    On,
}

/// One half of a note: its attack or its release, at an absolute tick.
#[derive(Debug, Clone, Copy)]
struct Edge {
    tick: u64,
    kind: EdgeKind,
    pitch: u8,
    velocity: u8,
}

/// Split a track's notes into tick-ordered on/off edges.
fn track_edges(events: &[NoteEvent], resolution: u16) -> Vec<Edge> {
    let mut notes: Vec<&NoteEvent> = events.iter().collect();
    notes.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let mut edges = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let pitch = note.pitch.min(127);
        let start = beats_to_ticks(note.offset, resolution);
        let end = beats_to_ticks(note.end(), resolution).max(start.saturating_add(1));
        edges.push(Edge {
            tick: start,
            kind: EdgeKind::On,
            pitch,
            velocity: note.velocity.clamp(1, 127),
        });
        edges.push(Edge {
            tick: end,
            kind: EdgeKind::Off,
            pitch,
            velocity: 0,
        });
    }

    edges.sort_by_key(|edge| (edge.tick, edge.kind));
    edges
}

/// Encode the body of one track chunk (everything after the chunk length).
pub fn encode_track(track: &Track, resolution: u16) -> Result<Vec<u8>, SmfError> {
    let mut data = Vec::new();

    let name = track.name.as_bytes();
    data.extend_from_slice(&[0x00, META, META_TRACK_NAME]);
    write_vlq(&mut data, name.len() as u32)?;
    data.extend_from_slice(name);

    let channel = track.channel & 0x0F;
    let mut last_tick: u64 = 0;
    for edge in track_edges(&track.events, resolution) {
        let delta = edge.tick - last_tick;
        let delta = u32::try_from(delta).map_err(|_| SmfError::DeltaTooLarge(delta))?;
        write_vlq(&mut data, delta)?;
        last_tick = edge.tick;

        let status = match edge.kind {
            EdgeKind::On => NOTE_ON,
            EdgeKind::Off => NOTE_OFF,
        };
        data.extend_from_slice(&[status | channel, edge.pitch, edge.velocity]);
    }

    data.extend_from_slice(&[0x00, META, META_END_OF_TRACK, 0x00]);
    Ok(data)
}

/// Collects tracks and serializes them as one multi-track file.
#[derive(Debug, Clone)]
pub struct SequenceWriter {
    tracks: Vec<Track>,
    resolution: u16,
}

impl Default for SequenceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceWriter {
    /// A writer at the standard 480 ticks per beat.
    pub fn new() -> Self {
        Self::with_resolution(TICKS_PER_BEAT)
    }

    /// A writer at a custom ticks-per-beat resolution (clamped to 1-32767).
    pub fn with_resolution(resolution: u16) -> Self {
        SequenceWriter {
            tracks: Vec::new(),
            resolution: resolution.clamp(1, MAX_RESOLUTION),
        }
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Add a named, channel-tagged track built from `events`.
    pub fn add_track(&mut self, name: impl Into<String>, channel: u8, events: Vec<NoteEvent>) {
        self.push_track(Track::new(name, channel, events));
    }

    pub fn push_track(&mut self, track: Track) {
        log::debug!(
            "adding track '{}' on channel {} with {} notes",
            track.name,
            track.channel,
            track.events.len()
        );
        self.tracks.push(track);
    }

    /// Write the complete file to `writer`.
    ///
    /// All track chunks are encoded before the first byte is written, so an
    /// encoding failure leaves the destination untouched.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SmfError> {
        let track_count = u16::try_from(self.tracks.len())
            .map_err(|_| SmfError::TooManyTracks(self.tracks.len()))?;
        let chunks = self
            .tracks
            .iter()
            .map(|track| encode_track(track, self.resolution))
            .collect::<Result<Vec<_>, _>>()?;

        writer.write_all(HEADER_TAG)?;
        writer.write_all(&HEADER_LENGTH.to_be_bytes())?;
        writer.write_all(&FORMAT_PARALLEL.to_be_bytes())?;
        writer.write_all(&track_count.to_be_bytes())?;
        writer.write_all(&self.resolution.to_be_bytes())?;

        for chunk in &chunks {
            writer.write_all(TRACK_TAG)?;
            writer.write_all(&(chunk.len() as u32).to_be_bytes())?;
            writer.write_all(chunk)?;
        }
        Ok(())
    }

    /// Serialize into an in-memory buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SmfError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Serialize to a file, creating or truncating it.
    pub fn write_file(&self, path: &Path) -> Result<(), SmfError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        log::info!("wrote {} tracks to {}", self.tracks.len(), path.display());
        Ok(())
    }
}
