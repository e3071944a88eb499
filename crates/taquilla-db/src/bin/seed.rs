//! # Seed Data Generator
//!
//! Populates the database with demo events for development.
//!
//! ## Usage
//! ```bash
//! # Generate 3 events (default)
//! cargo run -p taquilla-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p taquilla-db --bin seed -- --events 10
//!
//! # Specify database path
//! cargo run -p taquilla-db --bin seed -- --db ./data/taquilla.db
//! ```
//!
//! ## Generated Data
//! Each event gets every zone in [`ZONES`], and each zone gets:
//! - a normal tariff valid from now until the show
//! - a presale tariff valid for the first 48 hours, 20% cheaper
//!
//! A few demo clients receive a starting points balance so presale
//! confirmations can be tried right away.

use chrono::{Duration, Utc};
use std::env;
use taquilla_core::{Event, Tariff, TariffKind, Zone};
use taquilla_db::repository::generate_id;
use taquilla_db::{Database, DbConfig};

const EVENT_NAMES: &[&str] = &[
    "Noche de Rock",
    "Sinfonía de Primavera",
    "Festival Electrónico",
    "Clásico de Fútbol",
    "Stand-up en Vivo",
    "Gira Aniversario",
    "Jazz bajo las Estrellas",
    "Ópera de Verano",
];

/// (zone name, capacity, normal price in cents)
const ZONES: &[(&str, i64, i64)] = &[
    ("Campo", 500, 4_500_00),
    ("Platea Baja", 200, 8_000_00),
    ("Platea Alta", 300, 6_000_00),
    ("VIP", 50, 15_000_00),
];

/// Demo clients and their starting points balances.
const CLIENTS: &[(&str, i64)] = &[("demo-alice", 2_000), ("demo-bob", 150), ("demo-carol", 0)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 3;
    let mut db_path = String::from("./taquilla_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--events" | "-e" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Taquilla Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -e, --events <N>   Number of events to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./taquilla_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Taquilla Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Events:   {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count_events().await?;
    if existing > 0 {
        println!("⚠ Database already has {} events", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let catalog = db.catalog();

    for (n, name) in EVENT_NAMES.iter().cycle().take(count).enumerate() {
        let event = Event {
            id: format!("evt-{}", n + 1),
            name: name.to_string(),
            starts_at: now + Duration::days(30 + n as i64 * 7),
        };
        catalog.insert_event(&event).await?;

        for (zone_name, capacity, price_cents) in ZONES {
            let zone = Zone {
                id: generate_id(),
                event_id: event.id.clone(),
                name: zone_name.to_string(),
                capacity: *capacity,
                purchased_count: 0,
            };
            catalog.insert_zone(&zone).await?;

            catalog
                .insert_tariff(&Tariff {
                    id: generate_id(),
                    zone_id: zone.id.clone(),
                    kind: TariffKind::Normal,
                    price_cents: *price_cents,
                    valid_from: now,
                    valid_until: event.starts_at,
                })
                .await?;

            catalog
                .insert_tariff(&Tariff {
                    id: generate_id(),
                    zone_id: zone.id.clone(),
                    kind: TariffKind::Presale,
                    price_cents: price_cents * 80 / 100,
                    valid_from: now,
                    valid_until: now + Duration::hours(48),
                })
                .await?;
        }

        println!("  ✓ {} ({}) with {} zones", event.name, event.id, ZONES.len());
    }

    for (client, balance) in CLIENTS {
        db.points().set_balance(client, *balance, now).await?;
    }
    println!("  ✓ {} demo clients with points", CLIENTS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
