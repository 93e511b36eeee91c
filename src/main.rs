use std::env;

use anyhow::Result;
use bookstore_finder::{Bookstore, FinderConfig, SearchError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!("  near <postal_code> [radius_km]  bookstores near a 7-digit postal code");
    eprintln!("  list [prefecture]              all bookstores, optionally in one prefecture");
    eprintln!("  prefectures                    prefectures that have bookstores");
    eprintln!("  regions                        bookstores grouped by region");
}

fn print_bookstore(store: &Bookstore) {
    println!("  {}", store.name);
    if let Some(prefecture) = &store.prefecture {
        println!("    {}", prefecture);
    }
    println!("    {}", store.address);
    if store.has_phone() {
        println!("    TEL: {}", store.phone);
    }
    println!("    MAP: {}", store.map_url());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstore_finder=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let config = FinderConfig::from_env();

    match args[1].as_str() {
        "near" => {
            let Some(postal_code) = args.get(2) else {
                eprintln!("Error: No postal code provided");
                std::process::exit(1);
            };

            let radius_km = match args.get(3) {
                Some(raw) => match raw.parse::<f64>() {
                    Ok(r) if r.is_finite() && r >= 0.0 => r,
                    _ => {
                        eprintln!(
                            "Invalid radius '{}'. Using {} km.",
                            raw, config.default_radius_km
                        );
                        config.default_radius_km
                    }
                },
                None => config.default_radius_km,
            };

            let finder = config.build_finder()?;
            match finder.search_near(postal_code, radius_km).await {
                Ok(search) => {
                    println!(
                        "Bookstores within {} km of {} ({}):",
                        search.radius_km, search.postal_code, search.origin
                    );
                    if search.results.is_empty() {
                        println!("  No bookstores found. Try a larger radius.");
                    }
                    for ranked in &search.results {
                        println!("\n  ({})", ranked.display_distance());
                        print_bookstore(ranked.bookstore);
                    }
                }
                Err(SearchError::InvalidPostalCode(e)) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
                Err(SearchError::Resolution(e)) => {
                    eprintln!("Error: {} ({})", e.user_message(), e);
                    std::process::exit(3);
                }
            }
        }
        "list" => {
            let catalog = config.load_catalog()?;
            let prefecture = args.get(2).map(|s| s.as_str());
            let stores = catalog.by_prefecture(prefecture);

            println!("{} bookstore(s):", stores.len());
            for store in &stores {
                println!();
                print_bookstore(store);
            }
            if stores.is_empty() {
                println!("  No bookstores match. Run `prefectures` to see valid values.");
            }
        }
        "prefectures" => {
            let catalog = config.load_catalog()?;
            for prefecture in catalog.prefectures() {
                println!("{}", prefecture);
            }
        }
        "regions" => {
            let catalog = config.load_catalog()?;
            for group in catalog.regions() {
                println!(
                    "{} / {} ({})",
                    group.region,
                    group.region.name_en(),
                    group.bookstore_count()
                );
                for prefecture in &group.prefectures {
                    println!("  {} ({})", prefecture.prefecture.name, prefecture.bookstores.len());
                    for store in &prefecture.bookstores {
                        println!("    {}", store.name);
                    }
                }
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }

    Ok(())
}
