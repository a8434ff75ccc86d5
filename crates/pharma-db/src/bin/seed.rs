//! # Seed Data Generator
//!
//! Populates a database with a small demo tenant set for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p pharma-db --bin seed
//! cargo run -p pharma-db --bin seed -- --db ./data/pharmacy.db --password secret123
//! ```
//!
//! ## Generated Data
//! - An admin, two pharmacies, an owner and a pharmacist (first pharmacy)
//! - Medicines with one or two variants each, per pharmacy
//! - A hospital order routed to the first pharmacy
//!
//! Phone numbers are fixed so the printed credentials work for login.

use chrono::{Duration, Utc};
use std::env;

use pharma_core::{
    Hospital, Medicine, MedicineVariant, Order, OrderItem, Patient, Pharmacy, Role, User,
};
use pharma_db::password::hash_password;
use pharma_db::repository::new_id;
use pharma_db::{Database, DbConfig};

const ADMIN_PHONE: &str = "+251900000001";
const OWNER_PHONE: &str = "+251900000002";
const PHARMACIST_PHONE: &str = "+251900000003";

/// (medicine, description, [(brand, unit, price_cents, stock)])
const CATALOG: &[(&str, &str, &[(&str, &str, i64, i64)])] = &[
    (
        "Paracetamol",
        "Analgesic and antipyretic",
        &[("Panadol", "tablet", 250, 200), ("Tylenol", "tablet", 300, 120)],
    ),
    (
        "Amoxicillin",
        "Penicillin-class antibiotic",
        &[("Amoxil", "capsule", 450, 80)],
    ),
    (
        "Ibuprofen",
        "Non-steroidal anti-inflammatory",
        &[("Advil", "tablet", 350, 150), ("Brufen", "tablet", 320, 60)],
    ),
    (
        "Oral Rehydration Salts",
        "Electrolyte replacement",
        &[("ORS", "sachet", 150, 300)],
    ),
    (
        "Cough Syrup",
        "Dextromethorphan syrup",
        &[("Benylin", "bottle", 1850, 40)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pharmacy.db");
    let mut password = String::from("password123");

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
                println!("Pharmacy Backend Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>         Database file path (default: ./pharmacy.db)");
                println!("  -p, --password <PASS>   Password for every seeded user (default: password123)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Pharmacy Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().phone_exists(ADMIN_PHONE).await? {
        println!("⚠ Database is already seeded");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let password_hash = hash_password(&password)?;

    // Pharmacies
    let mut pharmacies = Vec::new();
    for (name, address) in [
        ("Central Pharmacy", "Churchill Ave, Addis Ababa"),
        ("Riverside Pharmacy", "Bole Road, Addis Ababa"),
    ] {
        let pharmacy = Pharmacy {
            id: new_id(),
            name: name.to_string(),
            address: address.to_string(),
            created_at: now,
            updated_at: now,
        };
        db.pharmacies().insert(&pharmacy).await?;
        pharmacies.push(pharmacy);
    }
    println!("✓ Created {} pharmacies", pharmacies.len());

    // Users
    let home = &pharmacies[0].id;
    for (phone, name, role, pharmacy_id) in [
        (ADMIN_PHONE, "System Admin", Role::Admin, None),
        (OWNER_PHONE, "Hana Owner", Role::Owner, Some(home.clone())),
        (PHARMACIST_PHONE, "Dawit Pharmacist", Role::Pharmacist, Some(home.clone())),
    ] {
        let user = User {
            id: new_id(),
            phone_number: phone.to_string(),
            password_hash: password_hash.clone(),
            full_name: name.to_string(),
            role,
            pharmacy_id,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await?;
    }
    println!("✓ Created admin, owner and pharmacist");

    // Catalog
    let mut variants = 0;
    let mut first_variants = Vec::new();
    for (p_idx, pharmacy) in pharmacies.iter().enumerate() {
        for (m_idx, (name, description, brands)) in CATALOG.iter().enumerate() {
            let medicine = Medicine {
                id: new_id(),
                pharmacy_id: pharmacy.id.clone(),
                name: name.to_string(),
                description: Some(description.to_string()),
                image_url: None,
                created_at: now,
                updated_at: now,
            };
            db.medicines().insert(&medicine).await?;

            for (v_idx, (brand, unit, price, stock)) in brands.iter().enumerate() {
                let variant = MedicineVariant {
                    id: new_id(),
                    medicine_id: medicine.id.clone(),
                    brand: brand.to_string(),
                    barcode: format!("620{}{:03}{:02}", p_idx + 1, m_idx, v_idx),
                    unit: unit.to_string(),
                    price_per_unit_cents: *price,
                    expiry_date: now + Duration::days(365 + 30 * m_idx as i64),
                    stock: *stock,
                    created_at: now,
                    updated_at: now,
                };
                db.variants().insert(&variant).await?;
                if p_idx == 0 {
                    first_variants.push(variant);
                }
                variants += 1;
            }
        }
    }
    println!(
        "✓ Created {} medicines with {} variants",
        CATALOG.len() * pharmacies.len(),
        variants
    );

    // Hospital order
    let hospital = Hospital {
        id: new_id(),
        name: "Black Lion Specialized Hospital".to_string(),
    };
    let patient = Patient {
        id: new_id(),
        full_name: "Almaz Tesfaye".to_string(),
        phone_number: "+251911223344".to_string(),
        emergency_phone_number: Some("+251911556677".to_string()),
    };
    db.orders().insert_hospital(&hospital).await?;
    db.orders().insert_patient(&patient).await?;

    let order = Order {
        id: new_id(),
        hospital_id: hospital.id.clone(),
        patient_id: patient.id.clone(),
        pharmacy_id: home.clone(),
        order_date: now,
    };
    let items: Vec<OrderItem> = first_variants
        .iter()
        .take(2)
        .map(|v| OrderItem {
            id: new_id(),
            order_id: order.id.clone(),
            medicine_variant_id: v.id.clone(),
            quantity: 2,
            price_per_unit_cents: v.price_per_unit_cents,
        })
        .collect();
    db.orders().insert_order(&order, &items).await?;
    println!("✓ Created hospital order with {} items", items.len());

    println!();
    println!("Logins (password: {}):", password);
    println!("  admin       {}", ADMIN_PHONE);
    println!("  owner       {}", OWNER_PHONE);
    println!("  pharmacist  {}", PHARMACIST_PHONE);

    db.close().await;
    println!();
    println!("✓ Seed complete");

    Ok(())
}
