use std::time::{Duration, SystemTime};

use quotebook::book::{Quote, QuoteError, QuoteManager};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn days(n: u64) -> SystemTime {
    SystemTime::now() + Duration::from_secs(n * 24 * 3600)
}

fn quote(symbol: &str, price: Decimal, volume: u64, expires_at: SystemTime) -> Quote {
    Quote::new(symbol, price, volume, expires_at)
}

#[test]
fn test_full_session_against_one_manager() {
    let manager = QuoteManager::new();

    // fetching and trading against an empty book are ordinary outcomes
    assert!(manager
        .get_best_quote_with_available_volume("HIGH")
        .unwrap()
        .is_none());
    let empty_trade = manager.execute_trade("A", 160).unwrap();
    assert_eq!(empty_trade.volume_executed, 0);
    assert_eq!(empty_trade.volume_weighted_average_price, Decimal::ZERO);

    // first quote for HIGH
    let added = manager
        .add_or_update_quote(quote("HIGH", dec!(177.38), 1000, days(2)))
        .unwrap();
    let best = manager
        .get_best_quote_with_available_volume("HIGH")
        .unwrap()
        .unwrap();
    assert_eq!(best, added);

    // an expired insertion is rejected and leaves the book alone
    let expired = manager
        .add_or_update_quote(quote(
            "RANDOM",
            dec!(12.90),
            500,
            SystemTime::now() - Duration::from_secs(24 * 3600),
        ))
        .unwrap_err();
    assert_eq!(expired, QuoteError::Expired);
    assert!(manager
        .get_best_quote_with_available_volume("RANDOM")
        .unwrap()
        .is_none());
    assert_eq!(
        manager
            .get_best_quote_with_available_volume("HIGH")
            .unwrap()
            .unwrap(),
        added
    );

    // trade most of the resting volume
    let trade = manager.execute_trade("HIGH", 980).unwrap();
    assert_eq!(trade.volume_requested, 980);
    assert_eq!(trade.volume_executed, 980);
    assert_eq!(trade.volume_weighted_average_price, dec!(177.38));
    let best = manager
        .get_best_quote_with_available_volume("HIGH")
        .unwrap()
        .unwrap();
    assert_eq!(best.available_volume, 20);

    // update restores the volume and reprices the quote
    let id = best.id.unwrap();
    manager
        .add_or_update_quote(quote("HIGH", dec!(187.98), 1000, days(2)).with_id(id))
        .unwrap();
    let best = manager
        .get_best_quote_with_available_volume("HIGH")
        .unwrap()
        .unwrap();
    assert_eq!(best.id, Some(id));
    assert_eq!(best.price, dec!(187.98));
    assert_eq!(best.available_volume, 1000);

    let trade = manager.execute_trade("HIGH", 480).unwrap();
    assert_eq!(trade.volume_executed, 480);
    assert_eq!(trade.volume_weighted_average_price, dec!(187.98));

    // clear the symbol; a second clear and an unknown symbol are no-ops
    manager.remove_all_quotes("HIGH").unwrap();
    assert!(manager
        .get_best_quote_with_available_volume("HIGH")
        .unwrap()
        .is_none());
    manager.remove_all_quotes("HIGH").unwrap();
    manager.remove_all_quotes("NEVER-SEEN").unwrap();

    // removal by id
    let aapl = manager
        .add_or_update_quote(quote("AAPL", dec!(225.90), 1000, days(2)))
        .unwrap();
    let aapl_id = aapl.id.unwrap();
    manager.remove_quote(aapl_id).unwrap();
    assert!(manager
        .get_best_quote_with_available_volume("AAPL")
        .unwrap()
        .is_none());
    assert_eq!(
        manager.remove_quote(aapl_id),
        Err(QuoteError::NotFound(aapl_id))
    );
    assert!(matches!(
        manager.remove_quote(Uuid::nil()),
        Err(QuoteError::InvalidArgument(_))
    ));

    // nothing rests anywhere anymore
    assert!(manager.snapshot().is_empty());
}

#[test]
fn test_snapshot_orders_by_price() {
    let manager = QuoteManager::new();
    manager
        .add_or_update_quote(quote("X", dec!(2.0), 10, days(1)))
        .unwrap();
    manager
        .add_or_update_quote(quote("X", dec!(1.0), 10, days(1)))
        .unwrap();
    manager
        .add_or_update_quote(quote("Y", dec!(5.0), 10, days(1)))
        .unwrap();

    let books = manager.snapshot();
    let prices: Vec<Decimal> = books["X"].iter().map(|q| q.price).collect();
    assert_eq!(prices, vec![dec!(1.0), dec!(2.0)]);
    assert_eq!(books["Y"].len(), 1);

    let json = serde_json::to_string(&books).unwrap();
    assert!(json.contains("available_volume"));
}
