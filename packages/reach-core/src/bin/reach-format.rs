//! Reach Format CLI - run the message formatter outside the widget.
//!
//! Useful for tuning the formatting passes against real model output and for
//! replaying captured response bodies through the stream reader.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use reach_core::{
    format_message, ApiResponse, BlockRenderer, FormattedBlock, HtmlRenderer, PlainRenderer,
    TurnReader,
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "reach-format")]
#[command(about = "Reach chat formatter - format and replay assistant messages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format raw message text read from stdin
    Format {
        /// Output style
        #[arg(short, long, value_enum, default_value = "plain")]
        output: Output,
    },
    /// Replay a captured response body through the stream reader
    Replay {
        /// File holding the raw response body
        capture: PathBuf,
        /// Bytes per simulated network chunk
        #[arg(short, long, default_value = "64")]
        chunk_size: usize,
        /// Output style
        #[arg(short, long, value_enum, default_value = "plain")]
        output: Output,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Plain,
    Html,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Format { output } => handle_format(output),
        Commands::Replay {
            capture,
            chunk_size,
            output,
        } => handle_replay(&capture, chunk_size, output),
    };

    match result {
        Ok(text) => println!("{}", text),
        Err(e) => {
            println!("{}", to_json(&ApiResponse::<()>::err(e)));
            std::process::exit(1);
        }
    }
}

fn handle_format(output: Output) -> Result<String, String> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;

    let blocks = format_message(&raw);
    Ok(match output {
        Output::Json => to_json(&ApiResponse::ok(json!({
            "blocks": blocks,
            "block_count": blocks.len(),
        }))),
        _ => render(&blocks, output),
    })
}

fn handle_replay(capture: &Path, chunk_size: usize, output: Output) -> Result<String, String> {
    let body = std::fs::read(capture)
        .map_err(|e| format!("Failed to read {}: {}", capture.display(), e))?;

    let reader = TurnReader::replay(&body, chunk_size);
    let blocks = format_message(reader.text());
    Ok(match output {
        Output::Json => to_json(&ApiResponse::ok(json!({
            "text": reader.text(),
            "finished": reader.is_finished(),
            "frames": reader.frames(),
            "blocks": blocks,
        }))),
        _ => render(&blocks, output),
    })
}

fn render(blocks: &[FormattedBlock], output: Output) -> String {
    match output {
        Output::Html => HtmlRenderer::default().render(blocks),
        _ => PlainRenderer::default().render(blocks),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{}\"}}", e))
}
