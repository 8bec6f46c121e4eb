//! # Seed Data Generator
//!
//! Populates the database with a development catalog, settings and
//! peak-sun-hours data for Ghana.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p helio-db --bin seed
//!
//! # Specify database path
//! cargo run -p helio-db --bin seed -- --db ./data/helio.db
//! ```
//!
//! ## Seeded Data
//! - Engine settings (efficiency, design factor, BOS/installation
//!   percentages, transport charge)
//! - Peak sun hours for major Ghanaian cities
//! - Catalog: panels (Jinko/Longi/JA), hybrid inverters (6.5-30 kW),
//!   LiFePO4 batteries (5/10/16 kWh), mounting, BOS, transport,
//!   installation
//! - One demo project ready for sizing

use chrono::Utc;
use std::env;
use uuid::Uuid;

use helio_core::{PriceType, Product, ProductType, SystemType};
use helio_db::{Database, DbConfig};

/// Settings every engine run reads. Values are strings; the typed
/// configs parse them once per run.
const SETTINGS: &[(&str, &str)] = &[
    ("system_efficiency", "0.72"),
    ("design_factor", "1.20"),
    ("max_dc_ac_ratio", "1.3"),
    ("default_peak_sun_hours", "5.2"),
    ("default_panel_brand", "Jinko"),
    ("default_panel_wattage", "580"),
    ("standard_inverter_sizes", "10,15,20,25,30"),
    ("max_parallel_inverters", "4"),
    ("use_parallel_inverters", "1"),
    ("prefer_parallel_above_kw", "30"),
    ("bos_percentage", "10"),
    ("installation_cost_percent", "10"),
    ("transport_cost_fixed", "1000"),
    ("default_tax_percent", "0"),
    ("quote_validity_days", "30"),
];

/// Peak sun hours for Ghanaian cities (city, region, hours).
const PEAK_SUN_HOURS: &[(&str, &str, f64)] = &[
    ("Accra", "Greater Accra", 5.3),
    ("Tema", "Greater Accra", 5.3),
    ("Kumasi", "Ashanti", 5.0),
    ("Tamale", "Northern", 5.8),
    ("Takoradi", "Western", 5.1),
    ("Cape Coast", "Central", 5.2),
    ("Sunyani", "Bono", 5.1),
    ("Ho", "Volta", 5.2),
    ("Bolgatanga", "Upper East", 5.9),
    ("Wa", "Upper West", 5.9),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./helio_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Helio Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./helio_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Helio Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Settings
    println!();
    println!("Seeding settings...");
    for (key, value) in SETTINGS {
        db.settings().set(key, value).await?;
    }
    println!("  {} settings", SETTINGS.len());

    // Peak sun hours
    println!("Seeding peak sun hours...");
    for (city, region, hours) in PEAK_SUN_HOURS {
        db.settings()
            .insert_peak_sun_hours(city, Some(region), "Ghana", *hours)
            .await?;
    }
    println!("  {} cities", PEAK_SUN_HOURS.len());

    // Catalog
    println!("Seeding catalog...");
    let catalog = build_catalog();
    for product in &catalog {
        if let Err(e) = db.products().insert(product).await {
            eprintln!("Failed to insert {:?}: {}", product.sku, e);
        }
    }
    println!("  {} products", catalog.len());

    // Demo project
    let project = db
        .projects()
        .create("Demo Residence, Accra", SystemType::Hybrid)
        .await?;
    println!("  Demo project {} ({})", project.reference_code, project.id);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

/// Builds the development catalog: realistic Ghana-market equipment
/// with prices in pesewas (cents of GHS).
fn build_catalog() -> Vec<Product> {
    let mut catalog = Vec::new();

    // Panels, priced per panel
    for (brand, model, wattage, price_cents) in [
        ("Jinko", "Tiger Neo 580W", 580i64, 109_900i64),
        ("Longi", "Hi-MO 6 570W", 570, 104_900),
        ("JA", "DeepBlue 4.0 560W", 560, 99_900),
    ] {
        catalog.push(Product {
            id: Uuid::new_v4().to_string(),
            product_type: ProductType::Panel,
            brand: Some(brand.to_string()),
            model: Some(model.to_string()),
            name: Some(format!("{brand} {model} Solar Panel")),
            sku: Some(format!("PNL-{}-{}", brand.to_uppercase(), wattage)),
            wattage: Some(wattage),
            capacity_kw: None,
            capacity_kwh: None,
            price_type: PriceType::PerPanel,
            base_price_cents: price_cents,
            is_active: true,
            manage_stock: true,
            stock_quantity: 200,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    // Hybrid inverters, flat price per unit
    for (capacity_kw, price_cents) in [
        (6.5f64, 950_000i64),
        (10.0, 1_500_000),
        (15.0, 2_100_000),
        (20.0, 2_700_000),
        (25.0, 3_200_000),
        (30.0, 3_700_000),
    ] {
        catalog.push(Product {
            id: Uuid::new_v4().to_string(),
            product_type: ProductType::Inverter,
            brand: Some("Deye".to_string()),
            model: Some(format!("SUN-{capacity_kw}K-SG Hybrid")),
            name: Some(format!("Deye {capacity_kw} kW Hybrid Inverter")),
            sku: Some(format!("INV-DEYE-{}", (capacity_kw * 10.0) as i64)),
            wattage: None,
            capacity_kw: Some(capacity_kw),
            capacity_kwh: None,
            price_type: PriceType::Fixed,
            base_price_cents: price_cents,
            is_active: true,
            manage_stock: true,
            stock_quantity: 25,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    // LiFePO4 batteries, flat price per unit
    for (capacity_kwh, price_cents) in [
        (5.0f64, 1_050_000i64),
        (10.0, 1_950_000),
        (16.0, 2_900_000),
    ] {
        catalog.push(Product {
            id: Uuid::new_v4().to_string(),
            product_type: ProductType::Battery,
            brand: Some("Dyness".to_string()),
            model: Some(format!("PowerBox {capacity_kwh} kWh")),
            name: Some(format!("Dyness {capacity_kwh} kWh LiFePO4 Battery")),
            sku: Some(format!("BAT-DYN-{}", (capacity_kwh * 10.0) as i64)),
            wattage: None,
            capacity_kw: None,
            capacity_kwh: Some(capacity_kwh),
            price_type: PriceType::Fixed,
            base_price_cents: price_cents,
            is_active: true,
            manage_stock: true,
            stock_quantity: 40,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    // Mounting structure, priced per kW of array
    catalog.push(Product {
        id: Uuid::new_v4().to_string(),
        product_type: ProductType::Mounting,
        brand: None,
        model: None,
        name: Some("Aluminium Roof Mounting Structure".to_string()),
        sku: Some("MNT-ALU-KW".to_string()),
        wattage: None,
        capacity_kw: None,
        capacity_kwh: None,
        price_type: PriceType::PerKw,
        base_price_cents: 20_000, // GHS 200.00 per kW
        is_active: true,
        manage_stock: false,
        stock_quantity: 0,
        in_stock: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    // BOS as a percentage of the equipment base (bps in base_price_cents)
    catalog.push(Product {
        id: Uuid::new_v4().to_string(),
        product_type: ProductType::Bos,
        brand: None,
        model: None,
        name: Some("Balance of System (cabling, protection, combiner)".to_string()),
        sku: Some("BOS-PCT".to_string()),
        wattage: None,
        capacity_kw: None,
        capacity_kwh: None,
        price_type: PriceType::Percentage,
        base_price_cents: 1000, // 10%
        is_active: true,
        manage_stock: false,
        stock_quantity: 0,
        in_stock: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    // Transport, flat
    catalog.push(Product {
        id: Uuid::new_v4().to_string(),
        product_type: ProductType::Transport,
        brand: None,
        model: None,
        name: Some("Transport & Logistics".to_string()),
        sku: Some("TRN-FLAT".to_string()),
        wattage: None,
        capacity_kw: None,
        capacity_kwh: None,
        price_type: PriceType::Fixed,
        base_price_cents: 100_000, // GHS 1,000.00
        is_active: true,
        manage_stock: false,
        stock_quantity: 0,
        in_stock: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    // Installation as a percentage of equipment incl. BOS
    catalog.push(Product {
        id: Uuid::new_v4().to_string(),
        product_type: ProductType::Installation,
        brand: None,
        model: None,
        name: Some("Installation & Commissioning".to_string()),
        sku: Some("INS-PCT".to_string()),
        wattage: None,
        capacity_kw: None,
        capacity_kwh: None,
        price_type: PriceType::Percentage,
        base_price_cents: 1000, // 10%
        is_active: true,
        manage_stock: false,
        stock_quantity: 0,
        in_stock: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    catalog
}
