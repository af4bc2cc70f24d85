//! # Seed Data Generator
//!
//! Populates a database with a demo dealership for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./moto_dev.db
//! cargo run -p moto-db --bin seed
//!
//! # Specify database path and admin password
//! cargo run -p moto-db --bin seed -- --db ./data/moto.db --password s3cret-pass
//! ```
//!
//! ## Generated Data
//! - Organization `demo` with an admin and a seller
//! - Brands and models with their colors
//! - Two branches
//! - Every catalog payment method, a few bank cards, one promotion
//! - A dozen motorcycles and a handful of clients

use std::env;

use anyhow::Context;
use chrono::{Datelike, Utc};
use moto_core::{
    BranchInput, BrandInput, ClientInput, ColorInput, ColorKind, DocumentType, ModelInput,
    MotorcycleInput, PromotionInput, Role, WeekdaySet,
};
use moto_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const ORG_SLUG: &str = "demo";

/// Brand name, logo color, models (name, displacement, base price in pesos).
const BRANDS: &[(&str, &str, &[(&str, i32, i64)])] = &[
    (
        "Honda",
        "#CC0000",
        &[("CB 190R", 184, 4_200_000), ("XR 150L", 149, 3_100_000), ("Wave 110S", 109, 1_900_000)],
    ),
    (
        "Yamaha",
        "#1F3C88",
        &[("FZ 25", 249, 5_600_000), ("XTZ 125", 124, 2_800_000)],
    ),
    (
        "Motomel",
        "#F28C00",
        &[("Skua 150", 149, 2_100_000), ("Blitz 110", 107, 1_300_000)],
    ),
];

const COLORS: &[(&str, &str, ColorKind)] = &[
    ("Negro", "#000000", ColorKind::Solid),
    ("Rojo", "#CC0000", ColorKind::Solid),
    ("Gris plata", "#A8A9AD", ColorKind::Metallic),
    ("Azul mate", "#1F3C88", ColorKind::Matte),
];

const CLIENTS: &[(&str, &str, &str)] = &[
    ("Ana", "Gómez", "30111222"),
    ("Bruno", "Pereyra", "28444555"),
    ("Carla", "Sosa", "35666777"),
    ("Diego", "Fernández", "27888999"),
    ("Elena", "Ruiz", "40123456"),
];

const CREDIT_CARD: &str = "a1000000-0000-4000-8000-000000000003";
const GALICIA: &str = "b1000000-0000-4000-8000-000000000002";
const NACION: &str = "b1000000-0000-4000-8000-000000000001";
const VISA: &str = "c1000000-0000-4000-8000-000000000001";
const MASTERCARD: &str = "c1000000-0000-4000-8000-000000000002";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./moto_dev.db");
    let mut password = String::from("demo-password-1");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Moto Dealer Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./moto_dev.db)");
                println!("  -p, --password <PASS>    Password for the demo users (default: demo-password-1)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Moto Dealer Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.organizations().get_by_slug(ORG_SLUG).await?.is_some() {
        println!("⚠ Organization '{}' already exists", ORG_SLUG);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let org = db.organizations().create("Motos Demo", ORG_SLUG).await?;
    let org_id = org.id.as_str();

    db.users()
        .create(org_id, "admin@demo.test", "Administración", Role::Admin, &password)
        .await?;
    db.users()
        .create(org_id, "ventas@demo.test", "Vendedor", Role::Seller, &password)
        .await?;
    println!("✓ Users: admin@demo.test, ventas@demo.test");

    let mut colors = Vec::new();
    for (name, hex, kind) in COLORS {
        let color = db
            .colors()
            .insert(
                org_id,
                ColorInput {
                    name: name.to_string(),
                    hex: hex.to_string(),
                    kind: *kind,
                },
            )
            .await?;
        colors.push(color.id);
    }

    let mut branches = Vec::new();
    for (name, address) in [("Casa central", "Av. San Martín 1200"), ("Sucursal norte", "Ruta 9 km 4")] {
        let branch = db
            .branches()
            .insert(
                org_id,
                BranchInput {
                    name: name.to_string(),
                    address: Some(address.to_string()),
                    phone: None,
                    is_active: true,
                },
            )
            .await?;
        branches.push(branch.id);
    }
    println!("✓ {} colors, {} branches", colors.len(), branches.len());

    for method in db.payments().list_catalog().await? {
        db.payments().associate(org_id, &method.id).await?;
    }
    for (bank, card) in [(GALICIA, VISA), (GALICIA, MASTERCARD), (NACION, VISA)] {
        db.payments().add_bank_card(org_id, bank, card).await?;
    }
    db.promotions()
        .insert(
            org_id,
            PromotionInput {
                name: "Galicia 6 cuotas sin interés".to_string(),
                description: Some("Martes y jueves con tarjetas Galicia".to_string()),
                payment_method_id: CREDIT_CARD.to_string(),
                bank_id: Some(GALICIA.to_string()),
                card_type_id: None,
                discount_bps: 500,
                surcharge_bps: 0,
                interest_free_installments: 6,
                weekdays: WeekdaySet::from_days(&[chrono::Weekday::Tue, chrono::Weekday::Thu]),
                starts_on: None,
                ends_on: None,
                is_enabled: true,
            },
        )
        .await?;
    println!("✓ Payment methods, bank cards and promotion");

    let year = Utc::now().year();
    let mut units = 0;
    for (brand_name, logo_color, models) in BRANDS {
        let brand = db
            .catalog()
            .create_brand(
                org_id,
                BrandInput {
                    name: brand_name.to_string(),
                    logo_url: None,
                    color: Some(logo_color.to_string()),
                },
            )
            .await?;

        for (model_name, displacement, price) in models.iter() {
            let model = db
                .catalog()
                .create_model(
                    org_id,
                    &brand.brand_id,
                    ModelInput {
                        name: model_name.to_string(),
                        year: Some(year),
                        displacement_cc: Some(*displacement),
                    },
                )
                .await?;

            for copy in 0..2 {
                units += 1;
                let input = MotorcycleInput {
                    brand_id: brand.brand_id.clone(),
                    model_id: model.model_id.clone(),
                    color_id: Some(colors[units % colors.len()].clone()),
                    branch_id: Some(branches[copy % branches.len()].clone()),
                    year,
                    chassis_number: format!("9C2KD{:04}{:08}", year, units),
                    engine_number: Some(format!("MT{:06}", units * 37)),
                    retail_price_cents: price * 100,
                    cost_price_cents: Some(price * 80),
                    ..Default::default()
                };
                if let Err(e) = db.motorcycles().insert(org_id, input).await {
                    eprintln!("Failed to insert {} {}: {}", brand_name, model_name, e);
                }
            }
        }
    }
    println!("✓ {} motorcycles", units);

    for (first_name, last_name, dni) in CLIENTS {
        db.clients()
            .insert(
                org_id,
                ClientInput {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: Some(format!("{}@example.com", first_name.to_lowercase())),
                    document_type: DocumentType::Dni,
                    document_number: Some(dni.to_string()),
                    city: Some("Córdoba".to_string()),
                    ..Default::default()
                },
            )
            .await?;
    }
    println!("✓ {} clients", CLIENTS.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}
