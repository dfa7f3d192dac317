// Beat Starter Music Generator: CLI entry point.
//
// Builds a beat request from an optional JSON config plus command-line
// overrides, runs the generators, prints the melody and a track summary read
// back from the encoded bytes, then writes the MIDI file.
//
// Usage:
//   cargo run -p beat_starter_music --bin generate -- [output.mid] [--key KEY]
//     [--scale SCALE] [--tempo BPM] [--bars N] [--variation A|B|C]
//     [--drum-style trap|boombap|lofi] [--time-signature N/D] [--seed N]
//     [--no-chords] [--no-drums] [--config request.json] [--json]
//
// Logging goes through env_logger; set RUST_LOG=debug to see generation
// decisions.

use std::path::PathBuf;

use clap::Parser;

use beat_starter_music::theory::{ScaleTable, note_name, root_or_default};
use beat_starter_music::{BeatRequest, DrumStyle, Variation, generate_beat};
use beat_starter_smf::{NoteEvent, SequenceSummary, inspect};

/// Generate a melody, chords and drums as a multi-track MIDI file.
#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Procedural hip-hop beat starter generator")]
struct Args {
    /// Output MIDI file
    #[arg(default_value = "beat.mid")]
    output: PathBuf,

    /// JSON file with a beat request; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root note, e.g. C, F#, Bb
    #[arg(long)]
    key: Option<String>,

    /// Scale name, e.g. minor, harmonic_minor, phrygian
    #[arg(long)]
    scale: Option<String>,

    /// Tempo in BPM
    #[arg(long)]
    tempo: Option<u32>,

    /// Length in bars
    #[arg(long)]
    bars: Option<u32>,

    /// Melodic variation: A (melodic), B (trap), C (motivic)
    #[arg(long)]
    variation: Option<Variation>,

    /// Drum style: trap, boombap, lofi
    #[arg(long)]
    drum_style: Option<String>,

    /// Meter as N/D
    #[arg(long)]
    time_signature: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Leave out the chord track
    #[arg(long)]
    no_chords: bool,

    /// Leave out the drum track
    #[arg(long)]
    no_drums: bool,

    /// Print the melody events as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let request = match build_request(&args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    println!("=== Beat Starter Generator ===");
    println!("Output: {}", args.output.display());
    println!("Key: {} {}", request.key, request.scale);
    println!("Tempo: {} BPM, {} bars of {}", request.tempo, request.bars, request.time_signature);
    println!("Variation: {} ({})", request.variation, request.variation.label());
    if let Some(s) = request.seed {
        println!("Seed: {s}");
    }
    println!();

    let writer = generate_beat(&request);
    let melody = writer
        .tracks()
        .first()
        .map(|t| t.events.as_slice())
        .unwrap_or_default();

    if args.json {
        match serde_json::to_string_pretty(melody) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error encoding melody: {e}"),
        }
    } else {
        print_melody(melody, &request);
    }
    println!();
    println!("{}", request.variation.explanation());
    println!();

    match writer.to_bytes().and_then(|bytes| inspect(&bytes)) {
        Ok(summary) => print_summary(&summary),
        Err(e) => log::warn!("could not read back sequence: {e}"),
    }

    println!();
    println!("Writing MIDI to {}...", args.output.display());
    if let Err(e) = writer.write_file(&args.output) {
        eprintln!("Error writing MIDI: {e}");
        std::process::exit(1);
    }
    println!("Done. Play with: timidity {} (or any MIDI player)", args.output.display());
}

fn build_request(args: &Args) -> Result<BeatRequest, beat_starter_music::MusicError> {
    let mut request = match &args.config {
        Some(path) => BeatRequest::load(path)?,
        None => BeatRequest::default(),
    };
    if let Some(key) = &args.key {
        request.key = key.clone();
    }
    if let Some(scale) = &args.scale {
        request.scale = scale.clone();
    }
    if let Some(tempo) = args.tempo {
        request.tempo = tempo;
    }
    if let Some(bars) = args.bars {
        request.bars = bars;
    }
    if let Some(variation) = args.variation {
        request.variation = variation;
    }
    if let Some(style) = &args.drum_style {
        request.drum_style = DrumStyle::resolve(style);
    }
    if let Some(ts) = &args.time_signature {
        request.time_signature = ts.clone();
    }
    if args.seed.is_some() {
        request.seed = args.seed;
    }
    if args.no_chords {
        request.add_chords = false;
    }
    if args.no_drums {
        request.add_drums = false;
    }
    Ok(request)
}

fn print_melody(melody: &[NoteEvent], request: &BeatRequest) {
    // Every octave, so any melody pitch can be checked against it.
    let scale = ScaleTable::new(root_or_default(&request.key), &request.scale, -1, 9);
    println!("Melody ({} notes):", melody.len());
    println!("  {:>3}  {:<5} {:>7} {:>7} {:>4}  stable", "#", "note", "beat", "length", "vel");
    for (i, note) in melody.iter().enumerate() {
        let stable = scale.stable_pitches().contains(&note.pitch);
        println!(
            "  {:>3}  {:<5} {:>7.2} {:>7.2} {:>4}  {}",
            i + 1,
            note_name(note.pitch),
            note.offset,
            note.duration,
            note.velocity,
            if stable { "*" } else { "" }
        );
    }
}

fn print_summary(summary: &SequenceSummary) {
    println!("Tracks ({} ticks per beat):", summary.ticks_per_beat);
    for track in &summary.tracks {
        let channel = track
            .channel
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let beats = if summary.ticks_per_beat > 0 {
            track.end_tick as f64 / f64::from(summary.ticks_per_beat)
        } else {
            0.0
        };
        println!(
            "  {:<16} ch {:>2}  {:>4} notes  {:.1} beats",
            track.name,
            channel,
            track.notes.len(),
            beats
        );
    }
}
