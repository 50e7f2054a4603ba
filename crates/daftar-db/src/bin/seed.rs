//! # Seed Data Generator
//!
//! Populates a namespace with demo items, customers and suppliers.
//!
//! ## Usage
//! ```bash
//! # Seed the default namespace
//! cargo run -p daftar-db --bin daftar-seed
//!
//! # Seed another shop in another file
//! cargo run -p daftar-db --bin daftar-seed -- --namespace shop-2 --db ./data/daftar.db
//!
//! # Wipe the namespace first, then seed it again
//! cargo run -p daftar-db --bin daftar-seed -- --reset
//! ```
//!
//! Items get codes `IT001..`, customers `CU001..`, suppliers `SU001..`.
//! Prices are in SAR with a cost of 60-80% of the price.

use std::env;

use daftar_core::{
    EntityType, Item, ItemInput, ItemRepository, Money, Party, PartyInput, PartyKind,
    PartyRepository, ITEM_CODE_PREFIX,
};
use daftar_db::{CollectionStore, CollectionWrite, Database, DbConfig};
use uuid::Uuid;

/// (name, price in halalas, opening stock)
const ITEMS: &[(&str, i64, i64)] = &[
    ("Basmati Rice 5kg", 4_500, 40),
    ("Sunflower Oil 1.5L", 1_875, 25),
    ("Arabic Coffee 250g", 3_200, 12),
    ("Dates Sukkari 1kg", 5_500, 8),
    ("Black Tea 100 bags", 1_450, 60),
    ("Sugar 2kg", 1_100, 0),
    ("Tomato Paste 400g", 325, 90),
    ("Laban 1L", 650, 5),
];

/// (name, phone)
const CUSTOMERS: &[(&str, &str)] = &[
    ("Abdullah Trading", "0501234567"),
    ("Noor Grocery", "966551234567"),
    ("Walk-in Customer", ""),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Al Watania Foods", "0512345678"),
    ("Gulf Wholesale", "0598765432"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut namespace = String::from("default");
    let mut db_path = String::from("./daftar_dev.db");
    let mut reset = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--namespace" | "-n" => {
                if i + 1 < args.len() {
                    namespace = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reset" => reset = true,
            "--help" | "-h" => {
                println!("Daftar Seed Data Generator");
                println!();
                println!("Usage: daftar-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --namespace <NAME>  Namespace to seed (default: default)");
                println!("  -d, --db <PATH>         Database file path (default: ./daftar_dev.db)");
                println!("      --reset             Delete the namespace's collections first");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Daftar Seed Data Generator");
    println!("=============================");
    println!("Database:  {}", db_path);
    println!("Namespace: {}", namespace);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if reset {
        let removed = db.collections().delete_namespace(&namespace).await?;
        println!("✓ Removed {} existing collections", removed);
    }

    let existing = db.collections().names(&namespace).await?;
    if !existing.is_empty() {
        println!("⚠ Namespace already has {} collections", existing.len());
        println!("  Skipping seed to avoid duplicates (use --reset to start over).");
        return Ok(());
    }

    let items = seed_items()?;
    let customers = seed_parties(PartyKind::Customer, CUSTOMERS)?;
    let suppliers = seed_parties(PartyKind::Supplier, SUPPLIERS)?;

    db.save_batch(
        &namespace,
        &[
            CollectionWrite::new("items", serde_json::to_value(&items)?),
            CollectionWrite::new("customers", serde_json::to_value(&customers)?),
            CollectionWrite::new("suppliers", serde_json::to_value(&suppliers)?),
        ],
    )
    .await?;

    println!();
    println!("✓ {} items (stock value {} SAR)", items.len(), items.stock_value());
    println!("✓ {} customers", customers.len());
    println!("✓ {} suppliers", suppliers.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn seed_items() -> Result<ItemRepository, Box<dyn std::error::Error>> {
    let mut items = ItemRepository::new();

    for (index, (name, price, stock)) in ITEMS.iter().enumerate() {
        let cost_pct = 60 + (index as i64 * 7) % 20;
        let input = ItemInput {
            name: name.to_string(),
            cost: Money::from_minor(price * cost_pct / 100),
            price: Money::from_minor(*price),
            opening_stock: *stock,
        };
        let code = items.next_code(ITEM_CODE_PREFIX);
        let item: Item = input.into_item(Uuid::new_v4().to_string(), code)?;
        items.insert(EntityType::Item, item)?;
    }

    Ok(items)
}

fn seed_parties(
    kind: PartyKind,
    rows: &[(&str, &str)],
) -> Result<PartyRepository, Box<dyn std::error::Error>> {
    let mut parties = PartyRepository::new();

    for (name, phone) in rows {
        let input = PartyInput {
            name: name.to_string(),
            phone: Some(phone.to_string()).filter(|p| !p.is_empty()),
            ..PartyInput::default()
        };
        let code = parties.next_code(kind.code_prefix());
        let party: Party = input.into_party(Uuid::new_v4().to_string(), code)?;
        parties.insert(kind.entity_type(), party)?;
    }

    Ok(parties)
}
