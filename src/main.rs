use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use carillon_lib::config::{self, Config, PlaybackDiscipline};
use carillon_lib::melody::{Extraction, MelodyExtractor, Reduction, TrackSelection};
use carillon_lib::midi;
use carillon_lib::playback::{BellVoices, CpalOutput, Player, SampleBank};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "carillon", about = "Turn MIDI files into bell melodies")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the bell sequence from a MIDI file and print it as JSON
    Extract {
        file: PathBuf,
        #[command(flatten)]
        strategy: StrategyArgs,
        /// Print tempo, selected tracks and the reduced melody to stderr
        #[arg(long, short)]
        verbose: bool,
        /// Write the JSON to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Extract a melody and ring it on the configured bell samples
    Play {
        file: PathBuf,
        #[command(flatten)]
        strategy: StrategyArgs,
        /// Strike without waiting for each bell to ring out
        #[arg(long)]
        overlapped: bool,
    },
    /// Serve the upload endpoint
    Serve {
        /// Listen address, e.g. 127.0.0.1:5000
        #[arg(long)]
        addr: Option<String>,
    },
    /// Write the default configuration to the config path
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct StrategyArgs {
    /// Track selection policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Simultaneous-note reduction strategy
    #[arg(long, value_enum)]
    reduction: Option<ReductionArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    ClusterRepresentatives,
    DominantCluster,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReductionArg {
    SalienceOverride,
    Skyline,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = Config::load_or_default(Some(&config_path));

    match cli.command {
        Commands::Extract {
            file,
            strategy,
            verbose,
            output,
        } => {
            strategy.apply(&mut config);
            run_extract(&config, &file, verbose, output)
        }
        Commands::Play {
            file,
            strategy,
            overlapped,
        } => {
            strategy.apply(&mut config);
            if overlapped {
                config.playback.discipline = PlaybackDiscipline::Overlapped;
            }
            run_play(&config, &file)
        }
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                config.server.bind_addr = addr;
            }
            run_serve(config)
        }
        Commands::InitConfig { force } => run_init_config(&config_path, force),
    }
}

impl StrategyArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(policy) = self.policy {
            config.extraction.track_selection = match policy {
                PolicyArg::ClusterRepresentatives => TrackSelection::ClusterRepresentatives,
                PolicyArg::DominantCluster => TrackSelection::DominantCluster,
            };
        }
        if let Some(reduction) = self.reduction {
            config.extraction.reduction = match reduction {
                ReductionArg::SalienceOverride => match config.extraction.reduction {
                    // keep thresholds from the config file
                    current @ Reduction::SalienceOverride { .. } => current,
                    Reduction::Skyline => Reduction::default(),
                },
                ReductionArg::Skyline => Reduction::Skyline,
            };
        }
    }
}

fn analyze(config: &Config, file: &Path) -> Result<Extraction> {
    let midi = midi::parse_file(file).with_context(|| format!("reading {}", file.display()))?;
    let extractor = MelodyExtractor::new(config.extraction.clone());
    Ok(extractor.analyze(&midi))
}

fn run_extract(config: &Config, file: &Path, verbose: bool, output: Option<PathBuf>) -> Result<ExitCode> {
    let extraction = analyze(config, file)?;

    if verbose {
        print_report(&extraction);
    }

    let json = serde_json::to_string_pretty(&extraction.sequence)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote {} notes to {}", extraction.sequence.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(ExitCode::from(0))
}

fn print_report(extraction: &Extraction) {
    let bpm = 60_000_000.0 / extraction.tempo_us.max(1) as f64;
    eprintln!("Tempo: {} us/quarter ({:.1} BPM)", extraction.tempo_us, bpm);
    eprintln!("Ticks per quarter: {}", extraction.ticks_per_quarter);
    eprintln!("Selected tracks: {:?}", extraction.selected_tracks);
    eprintln!("Note events: {}", extraction.note_count);
    eprintln!("Melody notes: {}", extraction.melody.len());
    for (note, bell) in extraction.melody.iter().zip(&extraction.sequence) {
        eprintln!(
            "  tick {:>7}-{:<7} pitch {:>3} vel {:>3} -> {}",
            note.start_tick, note.end_tick, note.pitch, note.velocity, bell.bell
        );
    }
}

fn run_play(config: &Config, file: &Path) -> Result<ExitCode> {
    let extraction = analyze(config, file)?;
    if extraction.sequence.is_empty() {
        println!("No melody found in {}", file.display());
        return Ok(ExitCode::from(0));
    }

    let bank = SampleBank::load(&config.playback.samples);
    for bell in config.extraction.bells.names() {
        if bank.get(bell).is_none() {
            log::warn!("No sample configured for bell {}", bell);
        }
    }

    let output = CpalOutput::open().context("opening audio output")?;
    let voices = BellVoices::new(bank, output)?;
    let report = Player::new(voices, &config.playback).play(&extraction.sequence);

    println!("Played {} notes ({} missing samples)", report.struck, report.missing);
    Ok(ExitCode::from(0))
}

fn run_serve(config: Config) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let extractor = MelodyExtractor::new(config.extraction.clone());
    runtime.block_on(carillon_lib::http::run_http_server(&config.server, extractor))?;
    Ok(ExitCode::from(0))
}

fn run_init_config(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        return Ok(ExitCode::from(2));
    }

    Config::default()
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::from(0))
}
