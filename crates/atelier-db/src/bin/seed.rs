//! # Seed Data Generator
//!
//! Populates a database with demo catalog and transaction data for
//! development, exercising the public operation surface end to end.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p atelier-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p atelier-db --bin seed -- --db ./data/atelier.db --tenant studio-demo
//! ```

use std::env;

use atelier_core::{
    Classification, GoodsLineInput, IntakeLines, IntakeNoteInput, IntakeNoteType, LineKind,
    NewProduct, NewServiceItem, PaymentMethod, SaleLineInput,
};
use atelier_db::{Database, DbConfig};

/// Demo products: (code, name, unit, quantity, unit_cost_cents, sale_price_cents)
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("SHMP-300", "Shampoo Hidratante 300ml", "un", 24, 1450, 2890),
    ("COND-300", "Condicionador Hidratante 300ml", "un", 18, 1520, 2990),
    ("MASC-250", "Máscara Capilar 250g", "un", 12, 2200, 4590),
    ("OLEO-060", "Óleo Reparador 60ml", "un", 9, 1800, 3790),
    ("ESM-VM", "Esmalte Vermelho", "un", 30, 350, 990),
    ("ESM-NU", "Esmalte Nude", "un", 27, 350, 990),
];

/// Demo services: (name, price_cents, duration_minutes)
const SERVICES: &[(&str, i64, i64)] = &[
    ("Corte Feminino", 8000, 50),
    ("Escova", 5000, 40),
    ("Manicure", 3500, 45),
    ("Coloração", 18000, 120),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./atelier.db".to_string());
    let tenant = arg_value(&args, "--tenant").unwrap_or_else(|| "studio-demo".to_string());

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database at {db_path}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = seed(&db, &tenant).await {
        eprintln!("Seeding failed: {e}");
        std::process::exit(1);
    }
}

async fn seed(db: &Database, tenant: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Catalog.
    let mut product_ids = Vec::new();
    for (code, name, unit, quantity, cost, price) in PRODUCTS {
        let product = db
            .catalog()
            .register(
                tenant,
                NewProduct {
                    code: Some((*code).to_string()),
                    name: (*name).to_string(),
                    unit: Some((*unit).to_string()),
                    quantity: *quantity,
                    unit_cost_cents: *cost,
                    sale_price_cents: *price,
                },
            )
            .await?;
        product_ids.push(product.id);
    }

    let mut service_ids = Vec::new();
    for (name, price, minutes) in SERVICES {
        let service = db
            .catalog()
            .register_service(
                tenant,
                NewServiceItem {
                    name: (*name).to_string(),
                    price_cents: *price,
                    duration_minutes: Some(*minutes),
                },
            )
            .await?;
        service_ids.push(service.id);
    }

    // A goods intake note replenishing two resale items.
    let intake = db
        .intake_processor()
        .create_intake(
            tenant,
            IntakeNoteInput {
                note_type: IntakeNoteType::Goods,
                note_number: "NF-40012".to_string(),
                supplier_name: "Distribuidora Bela Cosméticos".to_string(),
                supplier_tax_id: Some("12.345.678/0001-99".to_string()),
                supplier_address: Some("Rua das Flores, 100 - Centro".to_string()),
                supplier_phone: Some("(11) 4002-8922".to_string()),
                access_key: None,
                description: None,
                issued_on: None,
            },
            IntakeLines::Goods(vec![
                GoodsLineInput {
                    product_code: Some("SHMP-300".to_string()),
                    product_name: "Shampoo Hidratante 300ml".to_string(),
                    classification: Classification::Resale,
                    quantity: 12,
                    unit_cost_cents: 1400,
                    resale_price_cents: Some(2990),
                },
                GoodsLineInput {
                    product_code: Some("LUVAS-P".to_string()),
                    product_name: "Luvas descartáveis P".to_string(),
                    classification: Classification::Consumable,
                    quantity: 100,
                    unit_cost_cents: 45,
                    resale_price_cents: None,
                },
            ]),
        )
        .await?;

    // A product + service sale.
    let receipt = db
        .sale_processor()
        .create_sale(
            tenant,
            "Maria Souza",
            &[
                SaleLineInput {
                    kind: LineKind::Product,
                    item_id: product_ids[0].clone(),
                    quantity: 1,
                    unit_price_cents: 2990,
                },
                SaleLineInput {
                    kind: LineKind::Service,
                    item_id: service_ids[0].clone(),
                    quantity: 1,
                    unit_price_cents: 8000,
                },
            ],
            PaymentMethod::Pix,
            Some("appointment:1"),
        )
        .await?;

    let products = db.products().list(tenant).await?;

    println!(
        "{}",
        serde_json::json!({
            "tenant": tenant,
            "products": products.len(),
            "services": service_ids.len(),
            "intake": { "id": intake.intake_id, "total_cents": intake.total_cents },
            "sale": { "id": receipt.sale_id, "total_cents": receipt.total_cents },
        })
    );

    Ok(())
}

/// Returns the value following `flag` in the argument list, if any.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
