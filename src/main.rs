// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! `phasm-wm`: embed, extract and size text watermarks from the shell.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use phasm_watermark::{KeyPair, LengthMeta, OutputFormat, WatermarkConfig, Watermarker};

#[derive(Parser)]
#[command(name = "phasm-wm")]
#[command(author, version, about = "Blind text watermarking for raster images", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults apply to missing fields)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a text watermark
    #[command(alias = "e")]
    Embed {
        /// Location password
        #[arg(long, allow_hyphen_values = true)]
        password_img: i64,

        /// Scrambling password
        #[arg(long, allow_hyphen_values = true)]
        password_wm: i64,

        /// Watermark text
        #[arg(long)]
        text: String,

        /// Source image
        input: PathBuf,

        /// Watermarked image
        output: PathBuf,

        /// Write PNG instead of the configured format
        #[arg(long, conflicts_with = "quality")]
        png: bool,

        /// JPEG quality for the output (1-100)
        #[arg(long)]
        quality: Option<u8>,
    },

    /// Extract a text watermark
    #[command(alias = "x")]
    Extract {
        /// Location password
        #[arg(long, allow_hyphen_values = true)]
        password_img: i64,

        /// Scrambling password
        #[arg(long, allow_hyphen_values = true)]
        password_wm: i64,

        /// Watermarked image
        input: PathBuf,

        /// Text length in bytes (explicit strategy)
        #[arg(long, conflicts_with_all = ["bits", "chars"])]
        text_bytes: Option<usize>,

        /// Text length in characters (explicit strategy)
        #[arg(long, conflicts_with = "bits")]
        chars: Option<usize>,

        /// Payload bit count printed by embed (echoed strategy)
        #[arg(long)]
        bits: Option<usize>,
    },

    /// Show how much text an image can carry
    #[command(alias = "c")]
    Capacity {
        /// Image to inspect
        input: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<WatermarkConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(WatermarkConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(WatermarkConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Embed { password_img, password_wm, text, input, output, png, quality } => {
            if png {
                config.output = OutputFormat::Png;
            } else if let Some(quality) = quality {
                config.output = OutputFormat::Jpeg { quality };
            }
            let watermarker = Watermarker::new(config)?;
            let image = std::fs::read(&input)?;
            let result = watermarker.embed(&image, &text, &KeyPair::new(password_img, password_wm))?;
            std::fs::write(&output, &result.image)?;
            println!("Embedded {} bits into {}", result.bit_len, output.display());
            if result.length != LengthMeta::None {
                println!("length: {}", serde_json::to_string(&result.length)?);
            }
        }

        Commands::Extract { password_img, password_wm, input, text_bytes, chars, bits } => {
            let length = match (text_bytes, chars, bits) {
                (Some(bytes), _, _) => LengthMeta::TextBytes(bytes),
                (None, Some(chars), _) => LengthMeta::Chars(chars),
                (None, None, Some(bits)) => LengthMeta::Bits(bits),
                (None, None, None) => LengthMeta::None,
            };
            let watermarker = Watermarker::new(config)?;
            let image = std::fs::read(&input)?;
            let text = watermarker.extract(&image, &KeyPair::new(password_img, password_wm), &length)?;
            println!("{text}");
        }

        Commands::Capacity { input } => {
            let watermarker = Watermarker::new(config)?;
            let info = watermarker.capacity(&std::fs::read(&input)?)?;
            println!("{}: {}x{}", input.display(), info.width, info.height);
            println!("  slots:          {}", info.slots);
            println!("  max text bytes: {}", info.max_text_bytes);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<phasm_watermark::WatermarkError>() {
                Some(err) => eprintln!("Error ({}): {}", err.kind(), err),
                None => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
