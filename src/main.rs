use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hilo_core::Rank;
use hilo_cv::{CardCounter, DetectorConfig, Result, SharedCounter, TemplateStore, init_logging};
use log::info;

mod replay;

/// Hi-Lo card counter over captured table frames.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a directory of captured frames and report the final count.
    Run(RunArgs),
    /// Store a rank template taken from a cropped card image.
    Learn(LearnArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Directory of frame images, processed in filename order.
    #[arg(short, long)]
    frames: PathBuf,

    /// Directory holding the rank templates.
    #[arg(short, long, default_value = "templates")]
    templates: PathBuf,

    /// Initial decks-remaining estimate.
    #[arg(long, default_value_t = 6.0)]
    decks: f64,

    /// Capture cadence the frames were recorded at.
    #[arg(long, default_value_t = 2.0)]
    fps: f32,

    /// Detector config JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write annotated frames (green accepted, red rejected) here.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Write per-frame records and the final count as JSON here.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct LearnArgs {
    /// Cropped card image to learn from.
    #[arg(short, long)]
    image: PathBuf,

    /// Rank label: 2-10, J, Q, K or A.
    #[arg(short, long)]
    rank: String,

    /// Directory holding the rank templates.
    #[arg(short, long, default_value = "templates")]
    templates: PathBuf,
}

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info);
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Learn(args) => learn(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    let store = TemplateStore::open(&args.templates);
    info!("{} templates available", store.len());

    let counter = SharedCounter::new(args.decks);
    let mut pipeline = CardCounter::new(config, store, counter.clone());
    let records = replay::replay(&mut pipeline, &args.frames, args.fps, args.annotate.as_deref())?;
    let state = counter.snapshot();

    println!("Frames processed: {}", records.len());
    println!("Running count:    {}", state.running_count);
    println!("True count:       {:.1}", state.true_count);
    println!("Decks remaining:  {:.1}", state.decks_remaining);

    if let Some(path) = &args.json {
        let report = replay::ReplayReport {
            frames: records,
            count: state,
        };
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("wrote JSON report to {}", path.display());
    }
    Ok(())
}

fn learn(args: LearnArgs) -> Result<()> {
    let rank: Rank = args.rank.parse()?;
    let card = image::open(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?
        .to_rgb8();

    let mut store = TemplateStore::open(&args.templates);
    store.add(rank, &card)?;
    println!(
        "Saved template for {} to {}",
        rank,
        store.template_path(rank).display()
    );
    Ok(())
}
