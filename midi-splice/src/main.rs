//! midi-splice - cuts drum tracks into bar windows and builds augmented variants of them.
//!
//! Subcommands:
//! - `split`: cut every file of a directory into windows of whole bars
//! - `augment`: write randomly category-substituted variants of every file of a directory

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use midi_splice::{
    augment::{load_stream, midi_files, transform, CategoryTable, ExampleLibrary},
    config::SpliceConfig,
    io::MIDIWriter,
    sequence::{
        event::{rewrite_tempo, slice_into_bars, TimeWindow},
        Stream,
    },
};

#[derive(Parser, Debug)]
#[command(name = "midi-splice")]
#[command(about = "Slice and augment percussion MIDI files")]
#[command(version)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rewrite every tempo event to this many microseconds per beat
    #[arg(long, global = true)]
    tempo: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cut each file into windows of whole bars
    Split {
        source_dir: PathBuf,
        out_dir: PathBuf,

        /// Bars per window
        #[arg(long)]
        bar_step: Option<u32>,

        /// Beats per bar for files whose name does not start with it (`4_groove.mid`)
        #[arg(long)]
        beats_per_bar: Option<u32>,
    },
    /// Write the original and N substituted variants of each file
    Augment {
        source_dir: PathBuf,
        examples_dir: PathBuf,
        out_dir: PathBuf,

        /// Variants per file, besides the original
        #[arg(long)]
        transformations: Option<usize>,

        /// Seed for reproducible variants
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SpliceConfig::load(path)?,
        None => SpliceConfig::default(),
    };

    match cli.command {
        Commands::Split {
            source_dir,
            out_dir,
            bar_step,
            beats_per_bar,
        } => {
            let bar_step = bar_step.unwrap_or(config.split.bar_step);
            let beats_per_bar = beats_per_bar.or(config.split.beats_per_bar);
            split_dir(&source_dir, &out_dir, bar_step, beats_per_bar, cli.tempo)
        }
        Commands::Augment {
            source_dir,
            examples_dir,
            out_dir,
            transformations,
            seed,
        } => {
            let table = config.category_table()?;
            let transformations = transformations.unwrap_or(config.augment.transformations);
            let seed = seed.or(config.augment.seed);
            augment_dir(
                &source_dir,
                &examples_dir,
                &out_dir,
                &table,
                transformations,
                seed,
                cli.tempo,
            )
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `4_afro-cuban` has 4 beats per bar.
fn beats_from_name(stem: &str) -> Option<u32> {
    stem.split('_').next()?.parse().ok()
}

/// Loads a source file, with its tempo rewritten when one is given.
fn load_source(path: &Path, tempo: Option<u32>) -> Result<(Stream<u64>, u16)> {
    let (stream, ppq) = load_stream(path)?;
    match tempo {
        Some(micros_per_beat) => Ok((rewrite_tempo(&stream, micros_per_beat), ppq)),
        None => Ok((stream, ppq)),
    }
}

/// Logs every per-file failure and a summary line.
fn report(results: Vec<(PathBuf, Result<usize>)>, what: &str) {
    let mut succeeded = 0;
    let mut written = 0;
    for (path, result) in &results {
        match result {
            Ok(count) => {
                succeeded += 1;
                written += count;
            }
            Err(e) => warn!(path = %path.display(), "{e:#}"),
        }
    }
    info!(
        files = results.len(),
        failed = results.len() - succeeded,
        written,
        "{what} finished"
    );
}

fn split_dir(
    source_dir: &Path,
    out_dir: &Path,
    bar_step: u32,
    beats_per_bar: Option<u32>,
    tempo: Option<u32>,
) -> Result<()> {
    if bar_step == 0 {
        bail!("--bar-step must be at least 1");
    }
    let files = midi_files(source_dir)?;
    info!(files = files.len(), bar_step, "splitting {}", source_dir.display());

    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            let result = split_file(path, out_dir, bar_step, beats_per_bar, tempo);
            (path.clone(), result)
        })
        .collect();
    report(results, "split");
    Ok(())
}

fn split_file(
    path: &Path,
    out_dir: &Path,
    bar_step: u32,
    beats_per_bar: Option<u32>,
    tempo: Option<u32>,
) -> Result<usize> {
    let stem = file_stem(path);
    let beats_per_bar = beats_from_name(&stem)
        .or(beats_per_bar)
        .with_context(|| format!("no beats per bar in the name of {stem} and none configured"))?;

    let (stream, ppq) = load_source(path, tempo)?;
    let windows = slice_into_bars(&stream, TimeWindow::new(ppq, beats_per_bar, bar_step))
        .with_context(|| format!("slicing {}", path.display()))?;

    let split_dir = out_dir.join(format!("split_{stem}"));
    fs::create_dir_all(&split_dir)
        .with_context(|| format!("creating {}", split_dir.display()))?;

    let mut written = 0;
    for window in &windows {
        let Some(content) = &window.content else {
            debug!(window = window.index, "{stem}: nothing to write");
            continue;
        };
        let out = split_dir.join(format!("{stem}_slice_{:03}.mid", window.index));
        MIDIWriter::save(&out, ppq, content).with_context(|| format!("writing {}", out.display()))?;
        written += 1;
    }
    debug!(windows = windows.len(), written, "split {stem}");
    Ok(written)
}

fn augment_dir(
    source_dir: &Path,
    examples_dir: &Path,
    out_dir: &Path,
    table: &CategoryTable,
    transformations: usize,
    seed: Option<u64>,
    tempo: Option<u32>,
) -> Result<()> {
    let library = ExampleLibrary::load_dir(examples_dir, table)?;
    let files = midi_files(source_dir)?;
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    info!(
        files = files.len(),
        examples = library.total(),
        transformations,
        "augmenting {}",
        source_dir.display()
    );

    let results: Vec<_> = files
        .par_iter()
        .enumerate()
        .map(|(i, path)| {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let result = augment_file(
                path,
                out_dir,
                &library,
                table,
                transformations,
                tempo,
                &mut rng,
            );
            (path.clone(), result)
        })
        .collect();
    report(results, "augment");
    Ok(())
}

fn augment_file(
    path: &Path,
    out_dir: &Path,
    library: &ExampleLibrary,
    table: &CategoryTable,
    transformations: usize,
    tempo: Option<u32>,
    rng: &mut StdRng,
) -> Result<usize> {
    let stem = file_stem(path);
    let (stream, ppq) = load_source(path, tempo)?;

    let mut variants = vec![stream.clone()];
    for _ in 0..transformations {
        variants.push(transform(rng, &stream, library, table));
    }

    for (i, variant) in variants.iter().enumerate() {
        let out = out_dir.join(format!("{stem}_transformed_{i:03}.mid"));
        MIDIWriter::save(&out, ppq, variant).with_context(|| format!("writing {}", out.display()))?;
    }
    Ok(variants.len())
}

#[cfg(test)]
mod tests {
    use midi_splice::{
        events::{Event, MetaEvent},
        sequence::event::Delta,
    };

    use super::*;

    #[test]
    fn sources_can_be_loaded_at_a_new_tempo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("4_groove.mid");
        let stream = Stream::from_events(vec![
            Delta::new(0u64, MetaEvent::tempo(500_000).as_event()),
            Event::new_delta_note_on_event(0, 9, 36, 100),
            Event::new_delta_note_off_event(240, 9, 36),
        ]);
        MIDIWriter::save(&path, 480, &stream).unwrap();

        let (kept, ppq) = load_source(&path, None).unwrap();
        assert_eq!(ppq, 480);
        assert_eq!(kept[0].event, MetaEvent::tempo(500_000).as_event());

        let (rewritten, _) = load_source(&path, Some(600_000)).unwrap();
        assert_eq!(rewritten[0].event, MetaEvent::tempo(600_000).as_event());
        assert_eq!(rewritten.len(), kept.len());
    }

    #[test]
    fn reads_beats_per_bar_from_the_name() {
        assert_eq!(beats_from_name("4_afrocuban-calypso-ex0"), Some(4));
        assert_eq!(beats_from_name("7_odd"), Some(7));
        assert_eq!(beats_from_name("groove_4"), None);
        assert_eq!(beats_from_name(""), None);
    }

    #[test]
    fn cli_accepts_both_subcommands() {
        let cli = Cli::try_parse_from([
            "midi-splice",
            "split",
            "in",
            "out",
            "--bar-step",
            "2",
            "--config",
            "splice.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("splice.toml")));
        assert!(matches!(cli.command, Commands::Split { bar_step: Some(2), .. }));

        let cli = Cli::try_parse_from([
            "midi-splice",
            "augment",
            "in",
            "ex",
            "out",
            "--seed",
            "9",
            "--tempo",
            "600000",
        ])
        .unwrap();
        assert_eq!(cli.tempo, Some(600_000));
        assert!(matches!(
            cli.command,
            Commands::Augment {
                seed: Some(9),
                transformations: None,
                ..
            }
        ));
    }
}
