//! `SeaORM` entity definitions.

pub mod audit_logs;
pub mod customers;
pub mod invoice_items;
pub mod invoice_status_history;
pub mod invoices;
pub mod items;
pub mod notifications;
pub mod quote_items;
pub mod quotes;
pub mod recovery_codes;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod user_settings;
pub mod users;
