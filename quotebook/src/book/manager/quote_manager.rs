use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;
use uuid::Uuid;

use crate::book::data::SymbolBook;
use crate::book::entry::{Quote, TradeResult};
use crate::book::error::QuoteError;

/// Outcome of re-resolving an id after a lost race with a concurrent
/// update, removal, or eviction.
enum Race {
    Retry,
    Gone,
}

/// Facade over the per-symbol books.
///
/// Sole mutator of the underlying indices: callers go through the operations
/// here and never touch a `SymbolBook` directly. One instance owns all state;
/// share it by reference across threads.
///
/// Locking discipline: the `books` read guard is held for the duration of a
/// per-symbol operation, so operations on different symbols run concurrently
/// while bucket creation and empty-bucket drop (write lock, re-checked
/// precondition) stay race-free. Lock order is `books`, then bucket(s) in
/// lexicographic symbol order, then `owners` innermost. Id-keyed operations
/// resolve the owning symbol through `owners` with no other lock held, then
/// re-validate once the bucket is locked.
pub struct QuoteManager {
    books: RwLock<HashMap<String, Arc<Mutex<SymbolBook>>>>,
    owners: Mutex<HashMap<Uuid, String>>,
}

impl QuoteManager {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Add the quote (no id) or update the quote with its id in the symbol's
    /// book.
    ///
    /// A new quote gets a fresh id; an update replaces symbol, price, volume,
    /// and expiration as a unit, implemented as removal from the old symbol's
    /// book followed by re-insertion. The expiration must be strictly in the
    /// future on both paths; the book never stores an already-expired quote.
    ///
    /// # Returns
    ///
    /// The stored quote, with the id filled in. `NotFound` for an update with
    /// an unknown id; `Expired` for a stale expiration; nothing is mutated on
    /// failure.
    pub fn add_or_update_quote(&self, quote: Quote) -> Result<Quote, QuoteError> {
        Self::validate_symbol(&quote.symbol)?;
        if quote.is_expired(SystemTime::now()) {
            return Err(QuoteError::Expired);
        }
        match quote.id {
            Some(id) => self.reinsert(id, quote),
            None => self.insert_new(quote),
        }
    }

    /// Remove the quote with this id from both indices.
    ///
    /// # Returns
    ///
    /// `InvalidArgument` for the nil uuid, `NotFound` for an id not currently
    /// resting in any book.
    pub fn remove_quote(&self, id: Uuid) -> Result<(), QuoteError> {
        if id.is_nil() {
            return Err(QuoteError::InvalidArgument("id must not be the nil uuid"));
        }
        loop {
            let symbol = match self.owners.lock().unwrap().get(&id) {
                Some(symbol) => symbol.clone(),
                None => return Err(QuoteError::NotFound(id)),
            };
            let map = self.books.read().unwrap();
            let Some(bucket) = map.get(&symbol).cloned() else {
                continue;
            };
            let mut book = bucket.lock().unwrap();
            if book.remove(&id).is_none() {
                drop(book);
                drop(map);
                match self.resolve_after_race(&id, &symbol) {
                    Race::Retry => continue,
                    Race::Gone => return Err(QuoteError::NotFound(id)),
                }
            }
            self.owners.lock().unwrap().remove(&id);
            let emptied = book.is_empty();
            drop(book);
            drop(map);
            if emptied {
                self.drop_bucket_if_empty(&symbol);
            }
            log::debug!("removed quote {} for {}", id, symbol);
            return Ok(());
        }
    }

    /// Remove every quote resting on the symbol's book.
    ///
    /// A symbol with no book is a no-op, not an error: lazy eviction may have
    /// emptied and dropped the bucket already.
    pub fn remove_all_quotes(&self, symbol: &str) -> Result<(), QuoteError> {
        Self::validate_symbol(symbol)?;
        let drained = {
            let map = self.books.read().unwrap();
            let Some(bucket) = map.get(symbol).cloned() else {
                return Ok(());
            };
            let mut book = bucket.lock().unwrap();
            let drained = book.drain();
            let mut owners = self.owners.lock().unwrap();
            for (id, _) in &drained {
                owners.remove(id);
            }
            drained.len()
        };
        self.drop_bucket_if_empty(symbol);
        log::debug!("removed {} quotes for {}", drained, symbol);
        Ok(())
    }

    /// Best (lowest-price) quote for the symbol that is unexpired and has
    /// volume available, or `None` when no such quote rests.
    ///
    /// Stale entries found on the way are evicted from both indices, so this
    /// is a mutator and takes the symbol's lock exclusively. The returned
    /// quote is a snapshot; all mutation goes through manager operations.
    pub fn get_best_quote_with_available_volume(
        &self,
        symbol: &str,
    ) -> Result<Option<Quote>, QuoteError> {
        Self::validate_symbol(symbol)?;
        let now = SystemTime::now();
        let (best, emptied) = {
            let map = self.books.read().unwrap();
            let Some(bucket) = map.get(symbol).cloned() else {
                return Ok(None);
            };
            let mut book = bucket.lock().unwrap();
            let mut evicted = Vec::new();
            let best = book.best_live(now, &mut evicted).map(|(_, q)| q.clone());
            self.forget(&evicted, symbol);
            (best, book.is_empty())
        };
        if emptied {
            self.drop_bucket_if_empty(symbol);
        }
        Ok(best)
    }

    /// Execute a buy for `volume_requested` units, consuming the cheapest
    /// available quotes first.
    ///
    /// The whole fill loop runs under the symbol's lock, so concurrent
    /// operations on the same symbol cannot interleave mid-trade. Running out
    /// of quotes is not an error: the result reports a zero or partial fill,
    /// and the volume-weighted average price is exactly zero when nothing
    /// filled.
    pub fn execute_trade(
        &self,
        symbol: &str,
        volume_requested: u64,
    ) -> Result<TradeResult, QuoteError> {
        Self::validate_symbol(symbol)?;
        if volume_requested == 0 {
            return Err(QuoteError::InvalidArgument(
                "requested volume must be greater than zero",
            ));
        }
        let now = SystemTime::now();
        let mut remaining = volume_requested;
        let mut executed: u64 = 0;
        let mut notional = Decimal::ZERO;
        let mut emptied = false;
        {
            let map = self.books.read().unwrap();
            if let Some(bucket) = map.get(symbol).cloned() {
                let mut book = bucket.lock().unwrap();
                let mut evicted = Vec::new();
                while remaining > 0 {
                    let (id, price, available) = match book.best_live(now, &mut evicted) {
                        Some((id, quote)) => (id, quote.price, quote.available_volume),
                        None => break,
                    };
                    // A quote consumed to zero stays in place here; the next
                    // best-quote scan evicts it.
                    let consumed = remaining.min(available);
                    book.consume(&id, consumed);
                    notional += price * Decimal::from(consumed);
                    executed += consumed;
                    remaining -= consumed;
                }
                self.forget(&evicted, symbol);
                emptied = book.is_empty();
            }
        }
        if emptied {
            self.drop_bucket_if_empty(symbol);
        }
        let vwap = if executed > 0 {
            notional / Decimal::from(executed)
        } else {
            Decimal::ZERO
        };
        let result = TradeResult::new(
            Uuid::new_v4(),
            symbol.to_string(),
            volume_requested,
            executed,
            vwap,
        );
        log::debug!("trade executed: {}", result);
        Ok(result)
    }

    /// Price-ordered view of every non-empty book.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Quote>> {
        let map = self.books.read().unwrap();
        let mut out = BTreeMap::new();
        for (symbol, bucket) in map.iter() {
            let book = bucket.lock().unwrap();
            if !book.is_empty() {
                out.insert(symbol.clone(), book.quotes_in_price_order());
            }
        }
        out
    }

    fn insert_new(&self, quote: Quote) -> Result<Quote, QuoteError> {
        let id = Uuid::new_v4();
        let stored = quote.with_id(id);
        loop {
            self.ensure_bucket(&stored.symbol);
            let map = self.books.read().unwrap();
            let Some(bucket) = map.get(&stored.symbol).cloned() else {
                continue;
            };
            let mut book = bucket.lock().unwrap();
            book.insert(id, stored.clone());
            self.owners.lock().unwrap().insert(id, stored.symbol.clone());
            log::debug!("added quote {} for {}", id, stored.symbol);
            return Ok(stored);
        }
    }

    fn reinsert(&self, id: Uuid, incoming: Quote) -> Result<Quote, QuoteError> {
        let stored = incoming.with_id(id);
        loop {
            let old_symbol = self.owners.lock().unwrap().get(&id).cloned();
            let Some(old_symbol) = old_symbol else {
                // a retried iteration may have made a bucket for the incoming
                // symbol already; don't leave it behind empty
                self.drop_bucket_if_empty(&stored.symbol);
                return Err(QuoteError::NotFound(id));
            };
            self.ensure_bucket(&stored.symbol);
            let map = self.books.read().unwrap();
            let Some(old_bucket) = map.get(&old_symbol).cloned() else {
                continue;
            };
            if old_symbol == stored.symbol {
                let mut book = old_bucket.lock().unwrap();
                if book.remove(&id).is_none() {
                    drop(book);
                    drop(map);
                    match self.resolve_after_race(&id, &old_symbol) {
                        Race::Retry => continue,
                        Race::Gone => {
                            // don't leave behind the bucket made for the incoming quote
                            self.drop_bucket_if_empty(&stored.symbol);
                            return Err(QuoteError::NotFound(id));
                        }
                    }
                }
                book.insert(id, stored.clone());
                log::debug!("updated quote {} for {}", id, stored.symbol);
                return Ok(stored);
            }
            let Some(new_bucket) = map.get(&stored.symbol).cloned() else {
                continue;
            };
            let (mut old_book, mut new_book) = if old_symbol < stored.symbol {
                let old_guard = old_bucket.lock().unwrap();
                let new_guard = new_bucket.lock().unwrap();
                (old_guard, new_guard)
            } else {
                let new_guard = new_bucket.lock().unwrap();
                let old_guard = old_bucket.lock().unwrap();
                (old_guard, new_guard)
            };
            if old_book.remove(&id).is_none() {
                drop(old_book);
                drop(new_book);
                drop(map);
                match self.resolve_after_race(&id, &old_symbol) {
                    Race::Retry => continue,
                    Race::Gone => {
                        self.drop_bucket_if_empty(&stored.symbol);
                        return Err(QuoteError::NotFound(id));
                    }
                }
            }
            new_book.insert(id, stored.clone());
            self.owners.lock().unwrap().insert(id, stored.symbol.clone());
            let old_emptied = old_book.is_empty();
            drop(old_book);
            drop(new_book);
            drop(map);
            if old_emptied {
                self.drop_bucket_if_empty(&old_symbol);
            }
            log::debug!("moved quote {} from {} to {}", id, old_symbol, stored.symbol);
            return Ok(stored);
        }
    }

    /// Drop routing entries for evicted ids. Call with the bucket lock held.
    fn forget(&self, evicted: &[Uuid], symbol: &str) {
        if evicted.is_empty() {
            return;
        }
        let mut owners = self.owners.lock().unwrap();
        for id in evicted {
            owners.remove(id);
        }
        log::debug!("evicted {} stale quotes for {}", evicted.len(), symbol);
    }

    /// The id went missing from the bucket it was resolved to. Decide whether
    /// it moved (retry) or is gone entirely.
    fn resolve_after_race(&self, id: &Uuid, expected_symbol: &str) -> Race {
        match self.owners.lock().unwrap().get(id) {
            Some(symbol) if symbol != expected_symbol => Race::Retry,
            _ => Race::Gone,
        }
    }

    fn ensure_bucket(&self, symbol: &str) {
        let mut map = self.books.write().unwrap();
        if !map.contains_key(symbol) {
            map.insert(
                symbol.to_string(),
                Arc::new(Mutex::new(SymbolBook::new(symbol.to_string()))),
            );
        }
    }

    /// Drop the symbol's bucket if it is still empty. Takes the write lock,
    /// so the emptiness re-check cannot race a concurrent insert.
    fn drop_bucket_if_empty(&self, symbol: &str) {
        let mut map = self.books.write().unwrap();
        let empty = match map.get(symbol) {
            Some(bucket) => bucket.lock().unwrap().is_empty(),
            None => false,
        };
        if empty {
            map.remove(symbol);
            log::debug!("dropped empty book for {}", symbol);
        }
    }

    fn validate_symbol(symbol: &str) -> Result<(), QuoteError> {
        if symbol.trim().is_empty() {
            return Err(QuoteError::InvalidArgument("symbol must not be empty"));
        }
        Ok(())
    }
}

impl Default for QuoteManager {
    fn default() -> Self {
        Self::new()
    }
}
