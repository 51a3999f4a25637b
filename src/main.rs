use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cuematch::catalog::{Catalog, LibraryScanner};
use cuematch::similarity::{self, Mode};

#[derive(Parser)]
#[command(name = "cuematch", version, about = "Music library similarity analyzer")]
struct Cli {
    /// Music directory (overrides config music_dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum RankMode {
    /// Cosine similarity over the 13 MFCCs
    #[value(alias = "mfcc")]
    Timbre,
    /// Cosine similarity over tempo + energy + MFCCs
    Combined,
    /// Cosine similarity over ZCR + spectral centroid
    #[value(alias = "percussive")]
    Rhythm,
    /// Ascending BPM distance (raw tempo, no normalization)
    Tempo,
    /// Descending closeness on the 0-100 energy scale
    Energy,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the library and list every track with its features
    List,

    /// Rank all tracks by similarity to a reference track
    Rank {
        /// Reference track (catalog name, e.g. "song.mp3")
        track: String,

        /// Comparison mode
        #[arg(value_enum, default_value = "combined")]
        mode: RankMode,

        /// Number of results (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = cuematch::config::AppConfig::load();

    // Resolve music directory: CLI > config
    let dir = cli
        .dir
        .or(config.music_dir)
        .context("No music directory. Pass --dir or set music_dir in config.")?;
    log::info!("Library: {}", dir.display());

    let scanner = LibraryScanner::new(&dir, config.genre.clone());
    let catalog = scanner.scan().context("Scan failed")?;

    if catalog.is_empty() {
        println!("No tracks found in {}", dir.display());
        return Ok(());
    }

    match cli.command {
        Commands::List => {
            if cli.json {
                let entries: Vec<_> = catalog.iter().collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("{} tracks:", catalog.len());
                for (name, d) in catalog.iter() {
                    println!(
                        "  {} — {} | {:.1} BPM | energy {:.1}%",
                        name, d.genre, d.tempo, d.energy
                    );
                }
            }
        }

        Commands::Rank { track, mode, limit } => {
            let ranked = match mode {
                RankMode::Timbre => similarity::rank(&catalog, &track, Mode::Timbre),
                RankMode::Combined => similarity::rank(&catalog, &track, Mode::Combined),
                RankMode::Rhythm => similarity::rank(&catalog, &track, Mode::Rhythm),
                RankMode::Tempo => similarity::rank_by_tempo(&catalog, &track),
                RankMode::Energy => similarity::rank_by_energy(&catalog, &track),
            }
            .context("Ranking failed")?;

            if ranked.is_empty() {
                println!("No other tracks to compare against {}", track);
                return Ok(());
            }

            let shown = limit.unwrap_or(ranked.len());
            if cli.json {
                let slice: Vec<_> = ranked.iter().take(shown).collect();
                println!("{}", serde_json::to_string_pretty(&slice)?);
            } else {
                print_reference(&catalog, &track);
                for (i, (name, score)) in ranked.iter().take(shown).enumerate() {
                    match mode {
                        RankMode::Tempo => {
                            println!("  {:>3}. {}  (Δ {:.1} BPM)", i + 1, name, score)
                        }
                        _ => println!("  {:>3}. {}  ({:.3})", i + 1, name, score),
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_reference(catalog: &Catalog, track: &str) {
    if let Some(d) = catalog.get(track) {
        println!(
            "Reference: {} — {} | {:.1} BPM | energy {:.1}%",
            track, d.genre, d.tempo, d.energy
        );
    }
}
