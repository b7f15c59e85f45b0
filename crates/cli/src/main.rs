//! Interactive chat demo against in-memory collaborators.
//!
//! Runs the full assistant loop in a terminal: onboarding, cart commands,
//! order placement, and tracking, backed by a seeded demo catalog.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatcart_assistant::memory::{
    InMemoryCatalog, InMemoryInventory, InMemoryOrderStore, InMemorySessionStore, RecordingNotifier,
};
use chatcart_assistant::{Assistant, NoFallback};
use chatcart_core::config::AssistantConfig;
use chatcart_core::domain::product::{Product, ProductCode, WarehouseId};
use chatcart_core::session::SessionId;

#[derive(Debug, Parser)]
#[command(
    name = "chatcart",
    about = "Chat-driven ordering assistant (demo REPL)",
    after_help = "Examples:\n  chatcart\n  chatcart --config chatcart.toml"
)]
struct Cli {
    /// Path to a TOML config file; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AssistantConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let assistant = Assistant::new(
        demo_catalog(),
        demo_inventory(),
        InMemoryOrderStore::default(),
        RecordingNotifier::default(),
        InMemorySessionStore::default(),
        NoFallback,
        config,
    );
    let session_id = SessionId::generate();
    info!(session = %session_id.as_str(), "session started");

    println!("chatcart demo - type a message, or 'quit' to leave.\n");
    let greeting = assistant.process_message(&session_id, "hi").await?;
    println!("{}\n", greeting.response_text);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if ["quit", "q"].contains(&text.to_lowercase().as_str()) {
            break;
        }
        let outcome = assistant.process_message(&session_id, text).await?;
        println!("{}\n", outcome.response_text);
    }

    println!("Bye!");
    Ok(())
}

fn demo_catalog() -> InMemoryCatalog {
    let east = WarehouseId("WH-EAST".to_owned());
    let west = WarehouseId("WH-WEST".to_owned());
    let products = vec![
        product("QB001", "Quantum Processor", 2500, 0, "Buy 2 Get 1 Free"),
        product("QB002", "Neural Network Module", 1200, 0, "Buy 5 Get 10% Off"),
        product("QB003", "AI Memory Card", 800, 50, "Buy 3 Get 2 Free"),
        product("QB004", "Quantum Sensor", 950, 0, ""),
    ];
    InMemoryCatalog::new(vec![
        (east.clone(), "East Coast Warehouse".to_owned()),
        (west.clone(), "West Coast Warehouse".to_owned()),
    ])
    .with_products(&east, products.clone())
    .with_products(&west, products)
}

fn demo_inventory() -> InMemoryInventory {
    InMemoryInventory::with_stock(&[("QB001", 40), ("QB002", 60), ("QB003", 80), ("QB004", 25)])
}

fn product(code: &str, name: &str, price: i64, discount: i64, scheme: &str) -> Product {
    Product {
        code: ProductCode(code.to_owned()),
        name: name.to_owned(),
        base_price: Decimal::from(price),
        flat_discount: Decimal::from(discount),
        scheme_label: scheme.to_owned(),
    }
}
