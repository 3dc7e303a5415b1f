//! Database seeder for Fakturo development and testing.
//!
//! Seeds a demo user (demo@fakturo.dev / demo-password-123) with
//! customers, catalog items, a quote, and invoices in various states.
//!
//! Usage: cargo run --bin seeder

#![allow(clippy::print_stdout)]

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use fakturo_core::auth::hash_password;
use fakturo_db::entities::{sea_orm_active_enums::InvoiceStatus, users};
use fakturo_db::repositories::customer::UpsertCustomerInput;
use fakturo_db::repositories::invoice::{CreateInvoiceInput, DocumentLineInput};
use fakturo_db::repositories::item::UpsertItemInput;
use fakturo_db::repositories::quote::CreateQuoteInput;
use fakturo_db::repositories::settings::UpdateSettingsInput;
use fakturo_db::{
    CustomerRepository, InvoiceRepository, ItemRepository, QuoteRepository, SettingsRepository,
};

/// Demo user ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = fakturo_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if users::Entity::find_by_id(demo_user_id())
        .one(&db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("Demo user already exists, skipping seed.");
        return;
    }

    println!("Seeding demo user...");
    seed_demo_user(&db).await;

    println!("Seeding settings...");
    seed_settings(&db).await;

    println!("Seeding customers and items...");
    let customer_ids = seed_customers(&db).await;
    seed_items(&db).await;

    println!("Seeding documents...");
    seed_documents(&db, &customer_ids).await;

    println!("Seeding complete! Log in as demo@fakturo.dev / demo-password-123");
}

fn demo_user_id() -> Uuid {
    Uuid::parse_str(DEMO_USER_ID).unwrap()
}

/// Seeds the demo user with a real password hash.
async fn seed_demo_user(db: &DatabaseConnection) {
    let now = Utc::now().into();
    let user = users::ActiveModel {
        id: Set(demo_user_id()),
        email: Set("demo@fakturo.dev".to_string()),
        password_hash: Set(hash_password("demo-password-123").expect("Failed to hash password")),
        full_name: Set("Demo User".to_string()),
        is_active: Set(true),
        totp_secret: Set(None),
        totp_enabled_at: Set(None),
        email_verified_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user.insert(db).await.expect("Failed to insert demo user");
}

/// Seeds company settings for document headers.
async fn seed_settings(db: &DatabaseConnection) {
    let repo = SettingsRepository::new(db.clone());
    repo.update(
        demo_user_id(),
        UpdateSettingsInput {
            company_name: Some("Fakturo Demo GmbH".to_string()),
            company_address_line1: Some(Some("Musterstr. 1".to_string())),
            company_city: Some(Some("Berlin".to_string())),
            company_postal_code: Some(Some("10115".to_string())),
            company_country: Some(Some("Germany".to_string())),
            tax_id: Some(Some("DE123456789".to_string())),
            default_currency: Some("EUR".to_string()),
            default_tax_rate: Some(dec!(19)),
            default_payment_terms_days: Some(14),
            pdf_template: Some("modern".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to seed settings");
}

/// Seeds a handful of customers; returns their IDs.
async fn seed_customers(db: &DatabaseConnection) -> Vec<Uuid> {
    let repo = CustomerRepository::new(db.clone());
    let mut ids = Vec::new();

    let customers = [
        ("Acme Corp", "billing@acme.test", "New York"),
        ("Globex GmbH", "accounts@globex.test", "Hamburg"),
        ("Initech Ltd", "finance@initech.test", "London"),
    ];

    for (name, email, city) in customers {
        let customer = repo
            .create(
                demo_user_id(),
                UpsertCustomerInput {
                    name: name.to_string(),
                    email: Some(email.to_string()),
                    city: Some(city.to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to seed customer");
        ids.push(customer.id);
    }

    ids
}

/// Seeds catalog items.
async fn seed_items(db: &DatabaseConnection) {
    let repo = ItemRepository::new(db.clone());

    let items = [
        ("Consulting", "hour", dec!(120.00), Some("CONS-1")),
        ("Design work", "hour", dec!(85.00), Some("DSGN-1")),
        ("Hosting (monthly)", "piece", dec!(25.00), Some("HOST-M")),
    ];

    for (name, unit, price, sku) in items {
        repo.create(
            demo_user_id(),
            UpsertItemInput {
                name: name.to_string(),
                description: None,
                unit: Some(unit.to_string()),
                unit_price: price,
                currency: "EUR".to_string(),
                sku: sku.map(String::from),
            },
        )
        .await
        .expect("Failed to seed item");
    }
}

/// Seeds a quote plus invoices in draft, sent, and paid states.
async fn seed_documents(db: &DatabaseConnection, customer_ids: &[Uuid]) {
    let quotes = QuoteRepository::new(db.clone());
    let invoices = InvoiceRepository::new(db.clone());
    let user_id = demo_user_id();
    let today = Utc::now().date_naive();

    quotes
        .create(
            user_id,
            CreateQuoteInput {
                customer_id: customer_ids[0],
                issue_date: Some(today),
                valid_until: Some(today + Duration::days(30)),
                currency: None,
                discount_amount: dec!(0),
                tax_rate: None,
                notes: Some("Scope as discussed in the kickoff call.".to_string()),
                lines: vec![
                    DocumentLineInput {
                        item_id: None,
                        description: "Consulting".to_string(),
                        quantity: dec!(16),
                        unit_price: dec!(120.00),
                    },
                    DocumentLineInput {
                        item_id: None,
                        description: "Design work".to_string(),
                        quantity: dec!(8),
                        unit_price: dec!(85.00),
                    },
                ],
            },
        )
        .await
        .expect("Failed to seed quote");

    let draft = invoices
        .create(
            user_id,
            CreateInvoiceInput {
                customer_id: customer_ids[1],
                issue_date: Some(today),
                due_date: None,
                currency: None,
                discount_amount: dec!(50.00),
                tax_rate: None,
                notes: None,
                lines: vec![DocumentLineInput {
                    item_id: None,
                    description: "Hosting (monthly)".to_string(),
                    quantity: dec!(12),
                    unit_price: dec!(25.00),
                }],
            },
        )
        .await
        .expect("Failed to seed invoice");

    let paid = invoices
        .create(
            user_id,
            CreateInvoiceInput {
                customer_id: customer_ids[2],
                issue_date: Some(today - Duration::days(45)),
                due_date: Some(today - Duration::days(31)),
                currency: None,
                discount_amount: dec!(0),
                tax_rate: None,
                notes: None,
                lines: vec![DocumentLineInput {
                    item_id: None,
                    description: "Consulting".to_string(),
                    quantity: dec!(24),
                    unit_price: dec!(120.00),
                }],
            },
        )
        .await
        .expect("Failed to seed invoice");

    invoices
        .set_status(user_id, draft.invoice.id, InvoiceStatus::Sent, None, None)
        .await
        .expect("Failed to mark invoice sent");

    invoices
        .set_status(user_id, paid.invoice.id, InvoiceStatus::Sent, None, None)
        .await
        .expect("Failed to mark invoice sent");
    invoices
        .set_status(
            user_id,
            paid.invoice.id,
            InvoiceStatus::Paid,
            Some(today - Duration::days(28)),
            None,
        )
        .await
        .expect("Failed to mark invoice paid");
}
