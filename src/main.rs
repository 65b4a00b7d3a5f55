mod config;
mod images;
mod inputs;
mod output;
mod parser;
mod translation;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::config::Settings;
use inputs::TranslationInput;
use parser::books::{BookTable, UNKNOWN_BOOK};
use parser::refs::{RefCodec, VerseRange, VerseRef};
use translation::Lookups;

#[derive(Parser)]
#[command(name = "scml_notes", about = "Convert SCML study Bibles into notes and resources JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one or all translations
    Convert(ConvertArgs),
    /// List translations found in the inputs directory
    List {
        #[arg(long)]
        inputs_dir: Option<PathBuf>,
    },
    /// Show the canonical forms of a verse reference or a BBCCCVVV integer
    Ref {
        /// e.g. "Gen 1:3-5", "Ex. 12:1–13:16" or 1001003
        text: String,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Translation name (directory under the inputs directory)
    #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
    translation: Option<String>,
    /// Convert every translation found
    #[arg(long)]
    all: bool,
    #[arg(long)]
    inputs_dir: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Copy only images backing an emitted resource
    #[arg(long)]
    only_referenced_images: bool,
    /// Fail a translation when one of its images is missing
    #[arg(long)]
    strict_images: bool,
    #[arg(long)]
    no_progress: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => convert(args),
        Commands::List { inputs_dir } => list(inputs_dir),
        Commands::Ref { text } => show_ref(&text),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let mut settings = Settings::load()?;
    settings.apply_dirs(args.inputs_dir, args.output_dir);
    settings.apply_flags(args.only_referenced_images, args.strict_images, args.no_progress);

    let targets = match args.translation {
        Some(name) if !args.all => vec![TranslationInput::named(&settings.inputs_dir, &name)],
        _ => inputs::discover_all(&settings.inputs_dir)?,
    };
    println!("Converting {} translation(s)...", targets.len());

    let lookups = Lookups::default();
    let results = translation::run_all(&targets, &settings, &lookups);

    let mut failed = 0usize;
    for (name, result) in &results {
        match result {
            Ok(summary) => summary.print(),
            Err(e) => {
                failed += 1;
                println!("{}: FAILED ({:#})", name, e);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} translation(s) failed", failed, results.len());
    }
    Ok(())
}

fn list(inputs_dir: Option<PathBuf>) -> Result<()> {
    let mut settings = Settings::load()?;
    settings.apply_dirs(inputs_dir, None);
    let found = inputs::discover(&settings.inputs_dir)?;
    if found.is_empty() {
        println!("No translations found in {}", settings.inputs_dir.display());
        return Ok(());
    }
    for t in &found {
        let images = if t.images_dir.is_dir() { "images" } else { "no images" };
        println!("{:<12} {} ({})", t.name, t.scml.display(), images);
    }
    Ok(())
}

fn show_ref(text: &str) -> Result<()> {
    let books = BookTable::standard();
    let codec = RefCodec::new(&books);

    if let Ok(value) = text.trim().parse::<u32>() {
        let Some(verse) = VerseRef::from_int(value) else {
            bail!("{} is not a BBCCCVVV verse number", value);
        };
        let range = VerseRange::point(verse);
        println!("book:        {}", verse.book);
        println!("abbreviated: {}", codec.format_display(&range, true));
        println!("full:        {}", codec.format_display(&range, false));
        return Ok(());
    }

    let parsed = codec.parse_ref(text)?;
    let range = parsed.range;
    match codec.book_number(&parsed.book_token) {
        UNKNOWN_BOOK => println!("book:        unknown ({:?})", parsed.book_token),
        number => println!("book:        {}", number),
    }
    println!("start:       {}", range.start_int());
    match range.end_int() {
        Some(end) => println!("end:         {}", end),
        None => println!("end:         -"),
    }
    println!("abbreviated: {}", codec.render(&parsed, true));
    println!("full:        {}", codec.render(&parsed, false));
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
