//! Reach Chat - terminal front-end for the Reach chat widget
//!
//! Reads one message per line from stdin, streams the assistant reply from the
//! configured endpoint and redraws it as it is formatted. Ctrl-C cancels a
//! reply in progress; Ctrl-C at the prompt, `/quit` or end of input exits.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use reach_core::{BlockRenderer, PlainRenderer, Role, WireMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unicode_width::UnicodeWidthStr;

use reach_chat::config::ENDPOINT_ENV;
use reach_chat::{ChatClient, ChatConfig, ChatWidget, EntryKind, TranscriptEntry};

#[derive(Parser)]
#[command(name = "reach-chat")]
#[command(about = "Chat with a Reach assistant from the terminal")]
#[command(version)]
struct Cli {
    /// Chat endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assistant display name
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let client = ChatClient::from_config(&config).context("failed to build HTTP client")?;
    tracing::info!(endpoint = %client.endpoint(), "starting Reach Chat");
    let mut widget = ChatWidget::new(&config);
    let mut stdout = std::io::stdout();

    if let Some(welcome) = widget.welcome() {
        writeln!(stdout, "{}", welcome)?;
    }
    widget.open();
    print_rows(&mut stdout, &widget, &widget.transcript())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        if line.trim() == "/quit" {
            break;
        }

        let messages = match widget.begin_send(&line) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::debug!(error = %e, "input ignored");
                continue;
            }
        };
        run_turn(&client, &mut widget, messages, &mut stdout).await?;
    }

    tracing::info!("Reach Chat exiting");
    Ok(())
}

/// Config file, then `REACH_CHAT_ENDPOINT`, then flags.
fn load_config(cli: &Cli) -> Result<ChatConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = ChatConfig::load_from_path(path)?;
            config.apply_endpoint_override(std::env::var(ENDPOINT_ENV).ok());
            config
        }
        None => ChatConfig::load()?,
    };
    config.apply_endpoint_override(cli.endpoint.clone());
    if let Some(name) = cli.name.clone().filter(|n| !n.trim().is_empty()) {
        config.name = name;
    }
    Ok(config)
}

/// Stream one reply, redrawing the in-flight message after every delta.
async fn run_turn(
    client: &ChatClient,
    widget: &mut ChatWidget,
    messages: Vec<WireMessage>,
    out: &mut impl Write,
) -> Result<()> {
    // Rows from here on belong to this turn; the last row is the streaming one
    let start = widget.transcript().len().saturating_sub(1);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let events = client.send_stream(messages, cancel);
    tokio::pin!(events);

    let mut redraw = Redraw::new(std::io::stdout().is_terminal());
    while let Some(event) = events.next().await {
        let done = event.is_terminal();
        widget.apply(event);
        if done {
            break;
        }
        if let Some(row) = widget.transcript().last() {
            redraw.show(out, &render_row(widget, row))?;
        }
    }
    watcher.abort();

    redraw.clear(out)?;
    let rows = widget.transcript();
    print_rows(out, widget, rows.get(start..).unwrap_or_default())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("cancelling reply");
        cancel.cancel();
    }
}

fn print_rows(out: &mut impl Write, widget: &ChatWidget, rows: &[TranscriptEntry]) -> Result<()> {
    for row in rows.iter().filter(|row| row.role == Role::Assistant) {
        writeln!(out, "{}\n", render_row(widget, row))?;
    }
    out.flush()?;
    Ok(())
}

fn render_row(widget: &ChatWidget, row: &TranscriptEntry) -> String {
    let body = match row.kind {
        EntryKind::Streaming if row.blocks.is_empty() => "...".to_string(),
        _ => PlainRenderer::default().render(&row.blocks),
    };
    match row.role {
        Role::User => format!("you: {}", body),
        Role::Assistant => format!("{}: {}", widget.name(), body),
    }
}

/// Rewrites the last drawn text in place on a terminal.
///
/// Off a terminal nothing is drawn until the reply is complete.
struct Redraw {
    enabled: bool,
    /// Screen rows taken by the last draw, soft-wrapped lines included
    rows: usize,
}

impl Redraw {
    fn new(enabled: bool) -> Self {
        Self { enabled, rows: 0 }
    }

    fn show(&mut self, out: &mut impl Write, text: &str) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.clear(out)?;
        writeln!(out, "{}", text)?;
        out.flush()?;
        self.rows = screen_rows(text, terminal_columns());
        Ok(())
    }

    fn clear(&mut self, out: &mut impl Write) -> std::io::Result<()> {
        if self.rows > 0 {
            // Cursor up to the first drawn row, then erase to end of screen
            write!(out, "\x1b[{}F\x1b[J", self.rows)?;
            self.rows = 0;
        }
        Ok(())
    }
}

fn terminal_columns() -> usize {
    crossterm::terminal::size()
        .map(|(columns, _)| usize::from(columns))
        .unwrap_or(80)
}

/// Rows `text` occupies on a terminal `columns` wide.
fn screen_rows(text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    text.split('\n')
        .map(|line| line.width().div_ceil(columns).max(1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_rows_counts_wrapped_lines() {
        assert_eq!(screen_rows("short", 80), 1);
        assert_eq!(screen_rows("a\n\nb", 80), 3);
        assert_eq!(screen_rows(&"x".repeat(80), 80), 1);
        assert_eq!(screen_rows(&"x".repeat(81), 80), 2);
        assert_eq!(screen_rows(&"x".repeat(200), 80), 3);
    }

    #[test]
    fn test_screen_rows_uses_display_width() {
        // Wide characters take two columns each
        assert_eq!(screen_rows(&"\u{4f60}".repeat(5), 8), 2);
    }

    #[test]
    fn test_redraw_moves_up_over_wrapped_rows() {
        let mut redraw = Redraw::new(true);
        redraw.rows = screen_rows(&"x".repeat(200), 80);

        let mut out = Vec::new();
        redraw.clear(&mut out).unwrap();
        assert_eq!(out, b"\x1b[3F\x1b[J");
        assert_eq!(redraw.rows, 0);
    }
}
