use log::warn;
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use serde_derive::Deserialize;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::book::entry::Quote;

static INSTANCE: OnceCell<Mutex<RuntimeConfig>> = OnceCell::new();

pub fn instance() -> &'static Mutex<RuntimeConfig> {
    INSTANCE.get_or_init(|| Mutex::new(RuntimeConfig::new()))
}

/// A quote loaded into the book at startup. The price is a string in the
/// file and parsed to a decimal, since toml has no decimal type.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedQuote {
    pub symbol: String,
    pub price: String,
    pub volume: u64,
    pub ttl_secs: u64,
}

impl SeedQuote {
    pub fn to_quote(&self, now: SystemTime) -> Result<Quote, rust_decimal::Error> {
        let price = Decimal::from_str(&self.price)?;
        Ok(Quote::new(
            self.symbol.clone(),
            price,
            self.volume,
            now + Duration::from_secs(self.ttl_secs),
        ))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub seed: Vec<SeedQuote>,
    #[serde(default)]
    pub show_metrics_on_exit: bool,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig {
            seed: Vec::new(),
            show_metrics_on_exit: false,
        }
    }

    pub fn from_toml(path: &str) -> Option<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to read the runtime config file, {:?}", e);
                return Some(RuntimeConfig::new());
            }
        };
        let config: RuntimeConfig = match toml::from_str(&contents) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to parse the runtime config file, {:?}", e);
                return Some(RuntimeConfig::new());
            }
        };
        instance().lock().unwrap().clone_from(&config);
        Some(config)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
