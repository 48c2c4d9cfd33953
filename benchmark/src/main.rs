use clap::Parser;
use hdrhistogram::Histogram;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use quotebook::book::{Quote, QuoteManager};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of worker threads
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Number of symbols to spread quotes across
    #[arg(short, long, default_value = "8")]
    symbols: usize,

    /// Resting quotes seeded before the run
    #[arg(long, default_value = "10000")]
    seed: usize,

    /// Trades each thread executes
    #[arg(long, default_value = "20000")]
    trades: usize,

    /// Volume requested per trade
    #[arg(short, long, default_value = "100")]
    volume: u64,
}

fn symbol_name(i: usize) -> String {
    format!("SYM{:03}", i)
}

fn random_quote(rng: &mut impl Rng, symbols: usize) -> Quote {
    let symbol = symbol_name(rng.gen_range(0..symbols));
    let price = Decimal::new(rng.gen_range(100..100_000), 2);
    let volume = rng.gen_range(10..=1_000);
    Quote::new(
        symbol,
        price,
        volume,
        SystemTime::now() + Duration::from_secs(600),
    )
}

fn main() {
    env_logger::try_init().unwrap_or_default();
    let args = Args::parse();

    let manager = Arc::new(QuoteManager::new());
    let mut rng = rand::thread_rng();
    for _ in 0..args.seed {
        if let Err(e) = manager.add_or_update_quote(random_quote(&mut rng, args.symbols)) {
            eprintln!("seed failed: {}", e);
        }
    }

    let histogram = Arc::new(Mutex::new(Histogram::<u64>::new(3).unwrap()));
    let started = Instant::now();

    // Spawn worker threads
    let mut handles = vec![];
    for _ in 0..args.threads {
        let manager = Arc::clone(&manager);
        let histogram = Arc::clone(&histogram);
        let symbols = args.symbols;
        let trades = args.trades;
        let volume = args.volume;

        let handle = std::thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for i in 0..trades {
                // keep the books from draining
                if i % 4 == 0 {
                    let _ = manager.add_or_update_quote(random_quote(&mut rng, symbols));
                }

                let symbol = symbol_name(rng.gen_range(0..symbols));
                let start = Instant::now();
                match manager.execute_trade(&symbol, volume) {
                    Ok(_) => {
                        let duration = start.elapsed();
                        let mut hist = histogram.lock().unwrap();
                        hist.record(duration.as_micros() as u64).unwrap();
                    }
                    Err(e) => eprintln!("trade failed: {}", e),
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Print statistics
    let elapsed = started.elapsed().as_secs_f64();
    let hist = histogram.lock().unwrap();
    let total = hist.len();

    println!("\nBenchmark Results:");
    println!("Total Requests: {}", total);
    println!("Average TPS: {:.2}", total as f64 / elapsed);
    println!("\nLatency Distribution (microseconds):");
    println!("p50: {}", hist.value_at_percentile(50.0));
    println!("p90: {}", hist.value_at_percentile(90.0));
    println!("p95: {}", hist.value_at_percentile(95.0));
    println!("p99: {}", hist.value_at_percentile(99.0));
    println!("p99.9: {}", hist.value_at_percentile(99.9));
}
