use anyhow::Context;
use clap::Parser;

use quotebook::book::QuoteManager;
use quotebook::config::RuntimeConfig;
use quotebook::{console, metrics};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the runtime config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::try_init().unwrap_or_default();
    let args = Args::parse();
    let config = RuntimeConfig::from_toml(&args.config).context("runtime config unavailable")?;
    metrics::init_registry();

    let manager = QuoteManager::new();
    let seeded = seed_book(&manager, &config);
    if seeded > 0 {
        log::info!("seeded {} quotes from {}", seeded, args.config);
    }
    console::run(&manager);
    Ok(())
}

fn seed_book(manager: &QuoteManager, config: &RuntimeConfig) -> usize {
    let now = std::time::SystemTime::now();
    let mut seeded = 0;
    for seed in &config.seed {
        match seed.to_quote(now) {
            Ok(quote) => match manager.add_or_update_quote(quote) {
                Ok(_) => seeded += 1,
                Err(e) => log::warn!("skipping seed quote for {}: {}", seed.symbol, e),
            },
            Err(e) => log::warn!(
                "skipping seed quote for {}: bad price {:?}: {}",
                seed.symbol,
                seed.price,
                e
            ),
        }
    }
    seeded
}
