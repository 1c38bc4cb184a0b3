//! Replay binary - runs one fan-out for a staged message and prints the output records
//!
//! Usage:
//!   cargo run --bin replay -- <room_id> <message_id> [payload.json]
//!   cat payload.json | cargo run --bin replay -- lobby -NxAbc123
//!   cargo run --bin replay -- lobby -NxAbc123 payload.json --write
//!
//! Without `--write` the records are kept in memory and printed; with it they
//! are written to the configured OUTPUT_BACKEND.
//!
//! Required environment variables:
//! - GOOGLE_TRANSLATE_API_KEY (or OPENAI_API_KEY with TRANSLATION_PROVIDER=openai)

use anyhow::{bail, Context, Result};
use room_translator::config::{BackendKind, Config};
use room_translator::fanout::TranslationFanOut;
use room_translator::message::{parse_payload, StagingEvent};
use room_translator::store::{MemoryStore, OutputWriter};
use room_translator::{provider, store};
use std::io::Read;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, PartialEq)]
struct Args {
    room_id: String,
    message_id: String,
    payload_file: Option<String>,
    write: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut write = false;
    let mut positional = Vec::new();
    for arg in args {
        if arg == "--write" {
            write = true;
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let (Some(room_id), Some(message_id)) = (positional.next(), positional.next()) else {
        bail!("Usage: replay <room_id> <message_id> [payload.json] [--write]");
    };

    Ok(Args {
        room_id,
        message_id,
        payload_file: positional.next(),
        write,
    })
}

/// Read the payload from `path`, or from `stdin` when no path is given.
fn read_input(path: Option<&str>, mut stdin: impl Read) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read {}", path)),
        None => {
            let mut buf = Vec::new();
            stdin
                .read_to_end(&mut buf)
                .context("Failed to read payload from stdin")?;
            Ok(buf)
        }
    }
}

/// Run one fan-out and return what should be printed.
///
/// `None` means the payload was `null` and nothing ran.
async fn replay(args: &Args, config: &Config, bytes: &[u8]) -> Result<Option<String>> {
    let Some(payload) = parse_payload(bytes).context("Invalid message payload")? else {
        info!("Payload is null (deleted record), nothing to do");
        return Ok(None);
    };

    let client = provider::http_client(config)?;
    let translator = provider::build_provider(config, client.clone())?;

    let memory = MemoryStore::new();
    let writer: Arc<dyn OutputWriter> = if args.write {
        store::build_writer(config, client).await?
    } else {
        Arc::new(memory.clone())
    };

    let event = StagingEvent::new(args.room_id.clone(), args.message_id.clone(), payload);
    let report = TranslationFanOut::new(translator, writer)
        .run(&event)
        .await
        .context("Fan-out failed")?;

    info!(
        "Source '{}'{}, {} records",
        report.source,
        if report.source_defaulted { " (defaulted)" } else { "" },
        report.outputs.len()
    );

    if args.write {
        return Ok(Some(serde_json::to_string_pretty(&report)?));
    }

    let mut out = String::new();
    for (path, record) in memory.records().await {
        out.push_str(&format!(
            "{}\n{}\n\n",
            path,
            serde_json::to_string_pretty(&record)?
        ));
    }
    Ok(Some(out))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("room_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut config = Config::load()?;
    if !args.write {
        config.output_backend = BackendKind::Memory;
    }
    config.validate()?;

    let bytes = read_input(args.payload_file.as_deref(), std::io::stdin())?;
    if let Some(output) = replay(&args, &config, &bytes).await? {
        print!("{}", output);
    }

    Ok(())
}
