use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A resting price level for one symbol.
///
/// `id` is `None` until the quote has been accepted into a book; the manager
/// assigns a fresh id on insertion. Identity is by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Option<Uuid>,
    pub symbol: String,
    pub price: Decimal,
    pub available_volume: u64,
    pub expires_at: SystemTime,
}

impl Quote {
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        available_volume: u64,
        expires_at: SystemTime,
    ) -> Self {
        Self {
            id: None,
            symbol: symbol.into(),
            price,
            available_volume,
            expires_at,
        }
    }

    /// Same quote with the id set, for update requests.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }

    pub fn has_available_volume(&self) -> bool {
        self.available_volume > 0
    }

    /// Tradable: unexpired with volume remaining.
    pub fn is_live(&self, now: SystemTime) -> bool {
        self.has_available_volume() && !self.is_expired(now)
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self.id {
            Some(id) => id.to_string(),
            None => "unassigned".to_string(),
        };
        let expires_at = self
            .expires_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        write!(
            f,
            "id: {}, symbol: {}, price: {}, available volume: {}, expires at: {}s",
            id, self.symbol, self.price, self.available_volume, expires_at
        )
    }
}
