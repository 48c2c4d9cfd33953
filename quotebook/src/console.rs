//! Interactive console client
//!
//! Thin wrapper around the quote manager: prompts for inputs, converts them
//! to the right types, and prints operation outcomes. Invalid entries are
//! re-prompted until they parse.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::book::{Quote, QuoteManager};
use crate::{config, metrics};

type Input = io::Lines<io::StdinLock<'static>>;

const MENU: &str = "\
Enter AQ to add a quote
Enter UQ to update a quote
Enter RQ to remove a single quote by id
Enter RAQ to remove all quotes for a symbol
Enter GB to get the best quote with available volume
Enter ET to execute a trade
Enter DUMP to print the book as json
Enter STATS to print operation metrics
Enter EXIT to quit";

pub fn run(manager: &QuoteManager) {
    println!("{}", MENU);
    println!();
    let mut input = io::stdin().lock().lines();
    loop {
        print!("quote manager action: ");
        let _ = io::stdout().flush();
        let line = match input.next() {
            Some(Ok(line)) => line,
            _ => break,
        };
        match line.trim().to_uppercase().as_str() {
            "AQ" => add_quote(manager, &mut input),
            "UQ" => update_quote(manager, &mut input),
            "RQ" => remove_quote(manager, &mut input),
            "RAQ" => remove_all_quotes(manager, &mut input),
            "GB" => best_quote(manager, &mut input),
            "ET" => execute_trade(manager, &mut input),
            "DUMP" => dump(manager),
            "STATS" => println!("{}", metrics::render()),
            "EXIT" => break,
            "" => {}
            other => println!("Unknown action: {}", other),
        }
    }
    if config::instance().lock().unwrap().show_metrics_on_exit {
        println!("{}", metrics::render());
    }
}

/// Reads lines until one parses as `T`. Returns `None` on end of input.
fn prompt<T: FromStr>(input: &mut Input, label: &str) -> Option<T> {
    loop {
        print!("{}", label);
        let _ = io::stdout().flush();
        let line = match input.next()? {
            Ok(line) => line,
            Err(_) => return None,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<T>() {
            Ok(value) => return Some(value),
            Err(_) => println!("Invalid input, try again."),
        }
    }
}

fn read_quote_fields(input: &mut Input) -> Option<(String, Decimal, u64, SystemTime)> {
    let symbol = prompt::<String>(input, "symbol (e.g. HIGH): ")?;
    let price = prompt::<Decimal>(input, "price (e.g. 117.38): ")?;
    let volume = prompt::<u64>(input, "available volume (e.g. 1000): ")?;
    let ttl = prompt::<u64>(input, "seconds until expiration (e.g. 3600): ")?;
    Some((
        symbol,
        price,
        volume,
        SystemTime::now() + Duration::from_secs(ttl),
    ))
}

fn add_quote(manager: &QuoteManager, input: &mut Input) {
    println!("Adding a new quote ...");
    let Some((symbol, price, volume, expires_at)) = read_quote_fields(input) else {
        return;
    };
    let quote = Quote::new(symbol, price, volume, expires_at);
    log::info!("add quote {:?}", quote);
    match metrics::observe("add_or_update_quote", || {
        manager.add_or_update_quote(quote)
    }) {
        Ok(stored) => println!("Added a new quote: {}", stored),
        Err(e) => println!("{}", e),
    }
}

fn update_quote(manager: &QuoteManager, input: &mut Input) {
    println!("Updating an existing quote ...");
    let Some(id) = prompt::<Uuid>(
        input,
        "quote id (e.g. 1436fd88-5366-4a72-893d-58d7aefe3b1e): ",
    ) else {
        return;
    };
    let Some((symbol, price, volume, expires_at)) = read_quote_fields(input) else {
        return;
    };
    let quote = Quote::new(symbol, price, volume, expires_at).with_id(id);
    log::info!("update quote {:?}", quote);
    match metrics::observe("add_or_update_quote", || {
        manager.add_or_update_quote(quote)
    }) {
        Ok(stored) => println!("Updated the quote: {}", stored),
        Err(e) => println!("{}", e),
    }
}

fn remove_quote(manager: &QuoteManager, input: &mut Input) {
    println!("Removing a quote by id ...");
    let Some(id) = prompt::<Uuid>(
        input,
        "quote id (e.g. 1436fd88-5366-4a72-893d-58d7aefe3b1e): ",
    ) else {
        return;
    };
    log::info!("remove quote {}", id);
    match metrics::observe("remove_quote", || manager.remove_quote(id)) {
        Ok(()) => println!("Removed the quote for id: {}", id),
        Err(e) => println!("{}", e),
    }
}

fn remove_all_quotes(manager: &QuoteManager, input: &mut Input) {
    println!("Removing all quotes for a symbol ...");
    let Some(symbol) = prompt::<String>(input, "symbol (e.g. HIGH): ") else {
        return;
    };
    log::info!("remove all quotes for {}", symbol);
    match metrics::observe("remove_all_quotes", || manager.remove_all_quotes(&symbol)) {
        Ok(()) => println!("Removed all quotes for symbol: {}", symbol),
        Err(e) => println!("{}", e),
    }
}

fn best_quote(manager: &QuoteManager, input: &mut Input) {
    println!("Fetching the best quote ...");
    let Some(symbol) = prompt::<String>(input, "symbol (e.g. HIGH): ") else {
        return;
    };
    match metrics::observe("get_best_quote_with_available_volume", || {
        manager.get_best_quote_with_available_volume(&symbol)
    }) {
        Ok(Some(best)) => println!("Best quote for {}: {}", symbol, best),
        Ok(None) => println!("No live quote found, try another symbol."),
        Err(e) => println!("{}", e),
    }
}

fn execute_trade(manager: &QuoteManager, input: &mut Input) {
    println!("Executing a trade ...");
    let Some(symbol) = prompt::<String>(input, "symbol (e.g. HIGH): ") else {
        return;
    };
    let Some(volume) = prompt::<u64>(input, "requested volume (e.g. 100): ") else {
        return;
    };
    log::info!("execute trade {} x {}", symbol, volume);
    match metrics::observe("execute_trade", || manager.execute_trade(&symbol, volume)) {
        Ok(result) => println!("Finished executing the trade: {}", result),
        Err(e) => println!("{}", e),
    }
}

fn dump(manager: &QuoteManager) {
    match serde_json::to_string_pretty(&manager.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("failed to render the book: {}", e),
    }
}
