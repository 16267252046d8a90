use clap::Parser;
use std::path::PathBuf;
use image_palette_wasm::{Palette, PaletteConfig, PaletteResult, Stage};
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Extract the dominant colors of GIF, JPEG and PNG images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Sample every Nth pixel on both axes (bigger is faster)
    #[arg(short, long, default_value_t = image_palette_wasm::DEFAULT_PRECISION)]
    precision: u32,

    /// How many colors to return at most
    #[arg(short = 'n', long, default_value_t = image_palette_wasm::DEFAULT_RESULT_LIMIT)]
    colors: usize,

    /// Directory holding the `datafiles/` cache
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    /// Write `<name>.json` artifacts here instead of `<base-dir>/datafiles/`
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Compute only; neither read nor write the cache
    #[arg(long)]
    no_save: bool,

    /// Print the palette as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print_palette(result: &PaletteResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }
    for (bucket, count) in result.iter() {
        println!("  #{bucket}  {count}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_palette_wasm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let args = Args::parse();

    for input in &args.inputs {
        let mut config = PaletteConfig::new()
            .source(input)
            .base_dir(&args.base_dir)
            .precision(args.precision)
            .result_limit(args.colors);

        if let Some(dir) = &args.out_dir {
            let name = input.file_name().unwrap_or_default().to_string_lossy();
            config = config.destination(dir.join(format!("{name}.json")));
        }

        let mut palette = Palette::new(config);
        let result = if args.no_save {
            palette.get_palette()
        } else {
            palette.run()
        }
        .with_context(|| format!("palette extraction failed for {}", input.display()))?;

        println!("{}", input.display());
        print_palette(result, args.json)?;

        if let Some(dest) = palette.config().destination_path() {
            match palette.stage() {
                Stage::Persisted => println!("Saved → {}", dest.display()),
                Stage::CacheHit => println!("Cached ← {}", dest.display()),
                _ => {}
            }
        }
    }

    Ok(())
}
