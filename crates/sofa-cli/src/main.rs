mod transcript;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use sofa_proto::{Envelope, SofaType, SOFA_PREFIX};
use sofa_thread::{
    Ingest, JsonFilePaymentStore, MemoryPaymentStore, MessageId, PaymentEvent, PaymentState,
    PaymentStore, Thread, ThreadSettings,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "SOFA envelope tool", long_about = None)]
struct Cli {
    /// JSON settings file; missing keys use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one envelope (argument or stdin) and print it in canonical form
    Decode { raw: Option<String> },
    /// Build an envelope from a type tag and a JSON body
    Encode {
        #[arg(long = "type")]
        tag: String,
        #[arg(long)]
        json: String,
    },
    /// Project a transcript file into one JSON render item per line.
    /// Each item carries the id `line-<n>` of its transcript line.
    Project {
        #[arg(long)]
        transcript: PathBuf,
        /// Payment state file shared with `transition`
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Apply a payment event to a state, or to a stored message
    Transition {
        #[arg(long)]
        event: PaymentEvent,
        #[arg(long, conflicts_with = "message")]
        state: Option<PaymentState>,
        #[arg(long, requires = "store")]
        message: Option<String>,
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => ThreadSettings::from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ThreadSettings::default(),
    };
    init_logging(&settings);

    match cli.command {
        Commands::Decode { raw } => {
            let raw = match raw {
                Some(raw) => raw,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let envelope = Envelope::decode(&raw)?;
            println!("{}", describe(&envelope));
        }
        Commands::Encode { tag, json } => {
            let sofa_type =
                SofaType::from_tag(&tag).ok_or_else(|| anyhow!("unknown SOFA type `{tag}`"))?;
            let envelope = Envelope::decode(&format!("{SOFA_PREFIX}{}:{json}", sofa_type.tag()))?;
            println!("{}", envelope.encode());
        }
        Commands::Project { transcript, store } => {
            let text = fs::read_to_string(&transcript)
                .with_context(|| format!("reading {}", transcript.display()))?;
            let store = open_store(store)?;
            let mut thread = Thread::new(transcript.display().to_string(), settings, store);
            for line in transcript::parse(&text)? {
                let ingest = thread.ingest_with_id(line.message_id(), line.raw, line.is_outgoing);
                if let Ingest::Handshake(event) = ingest {
                    debug!(?event, "handshake");
                }
            }
            info!(items = thread.len(), "projected transcript");
            for (record, item) in thread.records().iter().zip(thread.items()) {
                let mut value = serde_json::to_value(item)?;
                value["id"] = json!(record.id.as_str());
                println!("{value}");
            }
        }
        Commands::Transition {
            event,
            state,
            message,
            store,
        } => {
            let next = match message {
                Some(message) => {
                    let store = open_store(store)?;
                    let id = MessageId::new(message);
                    let current = store.load(&id)?.unwrap_or_default();
                    let next = current.transition(event)?;
                    store.save(&id, next)?;
                    next
                }
                None => {
                    let current = state.ok_or_else(|| anyhow!("pass --state or --message"))?;
                    current.transition(event)?
                }
            };
            println!("{next}");
        }
    }
    Ok(())
}

fn init_logging(settings: &ThreadSettings) {
    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn open_store(path: Option<PathBuf>) -> Result<Arc<dyn PaymentStore>> {
    Ok(match path {
        Some(path) => Arc::new(
            JsonFilePaymentStore::open(&path)
                .with_context(|| format!("opening payment store {}", path.display()))?,
        ),
        None => Arc::new(MemoryPaymentStore::new()),
    })
}

fn describe(envelope: &Envelope) -> serde_json::Value {
    json!({
        "type": envelope.sofa_type().tag(),
        "handshake": envelope.is_handshake(),
        "canonical": envelope.encode(),
    })
}
