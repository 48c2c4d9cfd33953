use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::time::SystemTime;
use uuid::Uuid;

use crate::book::entry::Quote;

/// Dual-indexed storage for one symbol's resting quotes.
///
/// The ladder orders `(price, id)` keys ascending, so the leftmost entry is
/// the best quote and arbitrary removal stays logarithmic. The id map is the
/// single home of quote state; the ladder only refers into it, which keeps a
/// volume change visible through both views without a second write.
#[derive(Debug)]
pub struct SymbolBook {
    symbol: String,
    ladder: BTreeSet<(Decimal, Uuid)>,
    quotes: HashMap<Uuid, Quote>,
}

impl SymbolBook {
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            ladder: BTreeSet::new(),
            quotes: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Quote> {
        self.quotes.get(id)
    }

    pub fn insert(&mut self, id: Uuid, mut quote: Quote) {
        quote.id = Some(id);
        let price = quote.price;
        if let Some(prev) = self.quotes.insert(id, quote) {
            self.ladder.remove(&(prev.price, id));
        }
        self.ladder.insert((price, id));
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Quote> {
        let quote = self.quotes.remove(id)?;
        self.ladder.remove(&(quote.price, *id));
        Some(quote)
    }

    /// Best quote that is unexpired with volume remaining.
    ///
    /// Stale entries encountered on the way are dropped from both indices and
    /// their ids reported through `evicted`. The scan is bounded by the ladder
    /// size at entry, so it terminates even if every entry is stale.
    pub fn best_live(
        &mut self,
        now: SystemTime,
        evicted: &mut Vec<Uuid>,
    ) -> Option<(Uuid, &Quote)> {
        let mut remaining = self.ladder.len();
        while remaining > 0 {
            let (price, id) = *self.ladder.iter().next()?;
            if self.quotes.get(&id).map_or(false, |q| q.is_live(now)) {
                return self.quotes.get(&id).map(|q| (id, q));
            }
            self.ladder.remove(&(price, id));
            self.quotes.remove(&id);
            evicted.push(id);
            remaining -= 1;
        }
        None
    }

    /// Use up volume on a resting quote. The price does not change, so the
    /// ladder key stays valid. Returns the volume left on the quote.
    pub fn consume(&mut self, id: &Uuid, amount: u64) -> u64 {
        match self.quotes.get_mut(id) {
            Some(quote) => {
                quote.available_volume = quote.available_volume.saturating_sub(amount);
                quote.available_volume
            }
            None => 0,
        }
    }

    /// Empty the book, returning every quote in price order.
    pub fn drain(&mut self) -> Vec<(Uuid, Quote)> {
        let ladder = std::mem::take(&mut self.ladder);
        ladder
            .into_iter()
            .filter_map(|(_, id)| self.quotes.remove(&id).map(|q| (id, q)))
            .collect()
    }

    pub fn quotes_in_price_order(&self) -> Vec<Quote> {
        self.ladder
            .iter()
            .filter_map(|(_, id)| self.quotes.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn future() -> SystemTime {
        SystemTime::now() + Duration::from_secs(60)
    }

    fn past() -> SystemTime {
        SystemTime::now() - Duration::from_secs(60)
    }

    fn quote(price: Decimal, volume: u64, expires_at: SystemTime) -> Quote {
        Quote::new("HIGH", price, volume, expires_at)
    }

    fn is_consistent(book: &SymbolBook) -> bool {
        book.ladder.len() == book.quotes.len()
            && book
                .ladder
                .iter()
                .all(|(price, id)| book.quotes.get(id).map_or(false, |q| q.price == *price))
    }

    #[test]
    fn test_insert_and_best() {
        let mut book = SymbolBook::new("HIGH".to_string());
        book.insert(Uuid::new_v4(), quote(dec!(2.0), 100, future()));
        let cheapest = Uuid::new_v4();
        book.insert(cheapest, quote(dec!(1.0), 100, future()));
        book.insert(Uuid::new_v4(), quote(dec!(3.0), 100, future()));

        let mut evicted = Vec::new();
        let (id, best) = book.best_live(SystemTime::now(), &mut evicted).unwrap();
        assert_eq!(id, cheapest);
        assert_eq!(best.price, dec!(1.0));
        assert!(evicted.is_empty());
        assert_eq!(book.len(), 3);
        assert!(is_consistent(&book));
    }

    #[test]
    fn test_remove_updates_both_indices() {
        let mut book = SymbolBook::new("HIGH".to_string());
        let id = Uuid::new_v4();
        book.insert(id, quote(dec!(1.0), 100, future()));
        book.insert(Uuid::new_v4(), quote(dec!(2.0), 100, future()));

        let removed = book.remove(&id).unwrap();
        assert_eq!(removed.price, dec!(1.0));
        assert_eq!(book.len(), 1);
        assert!(is_consistent(&book));
        assert!(book.remove(&id).is_none());
    }

    #[test]
    fn test_price_ties_resolve_consistently() {
        let mut book = SymbolBook::new("HIGH".to_string());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        book.insert(a, quote(dec!(1.0), 100, future()));
        book.insert(b, quote(dec!(1.0), 100, future()));

        let mut evicted = Vec::new();
        let (first, _) = book.best_live(SystemTime::now(), &mut evicted).unwrap();
        assert!(first == a || first == b);
        book.remove(&first).unwrap();
        let (second, _) = book.best_live(SystemTime::now(), &mut evicted).unwrap();
        assert_ne!(first, second);
        assert!(is_consistent(&book));
    }

    #[test]
    fn test_best_live_evicts_stale_entries() {
        let mut book = SymbolBook::new("HIGH".to_string());
        let expired = Uuid::new_v4();
        let exhausted = Uuid::new_v4();
        let live = Uuid::new_v4();
        book.insert(expired, quote(dec!(1.0), 100, past()));
        book.insert(exhausted, quote(dec!(2.0), 0, future()));
        book.insert(live, quote(dec!(3.0), 100, future()));

        let mut evicted = Vec::new();
        let (id, _) = book.best_live(SystemTime::now(), &mut evicted).unwrap();
        assert_eq!(id, live);
        assert_eq!(evicted, vec![expired, exhausted]);
        assert_eq!(book.len(), 1);
        assert!(is_consistent(&book));
    }

    #[test]
    fn test_best_live_empties_all_stale_book() {
        let mut book = SymbolBook::new("HIGH".to_string());
        book.insert(Uuid::new_v4(), quote(dec!(1.0), 100, past()));
        book.insert(Uuid::new_v4(), quote(dec!(2.0), 0, future()));

        let mut evicted = Vec::new();
        assert!(book.best_live(SystemTime::now(), &mut evicted).is_none());
        assert_eq!(evicted.len(), 2);
        assert!(book.is_empty());
        assert!(is_consistent(&book));
    }

    #[test]
    fn test_consume_keeps_price_position() {
        let mut book = SymbolBook::new("HIGH".to_string());
        let id = Uuid::new_v4();
        book.insert(id, quote(dec!(1.0), 1000, future()));

        assert_eq!(book.consume(&id, 400), 600);
        let mut evicted = Vec::new();
        let (best, q) = book.best_live(SystemTime::now(), &mut evicted).unwrap();
        assert_eq!(best, id);
        assert_eq!(q.available_volume, 600);
        assert!(is_consistent(&book));

        assert_eq!(book.consume(&id, 600), 0);
        assert!(book.best_live(SystemTime::now(), &mut evicted).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_drain_returns_price_ordered() {
        let mut book = SymbolBook::new("HIGH".to_string());
        book.insert(Uuid::new_v4(), quote(dec!(3.0), 10, future()));
        book.insert(Uuid::new_v4(), quote(dec!(1.0), 10, future()));
        book.insert(Uuid::new_v4(), quote(dec!(2.0), 10, future()));

        let drained = book.drain();
        let prices: Vec<Decimal> = drained.iter().map(|(_, q)| q.price).collect();
        assert_eq!(prices, vec![dec!(1.0), dec!(2.0), dec!(3.0)]);
        assert!(book.is_empty());
        assert!(is_consistent(&book));
    }
}
