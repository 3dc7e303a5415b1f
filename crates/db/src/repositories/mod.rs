//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every business query is scoped by `user_id`; a row
//! belonging to another user behaves exactly like a missing row.

pub mod audit;
pub mod customer;
pub mod invoice;
pub mod item;
pub mod notification;
pub mod quote;
pub mod report;
pub mod session;
pub mod settings;
pub mod user;

pub use audit::AuditRepository;
pub use customer::{CustomerError, CustomerFilter, CustomerRepository, UpsertCustomerInput};
pub use invoice::{
    CreateInvoiceInput, DocumentLineInput, InvoiceError, InvoiceFilter, InvoiceRepository,
    InvoiceWithItems, UpdateInvoiceInput,
};
pub use item::{ItemError, ItemFilter, ItemRepository, UpsertItemInput};
pub use notification::NotificationRepository;
pub use quote::{
    CreateQuoteInput, QuoteError, QuoteFilter, QuoteRepository, QuoteWithItems, UpdateQuoteInput,
};
pub use report::ReportRepository;
pub use session::SessionRepository;
pub use settings::{SettingsError, SettingsRepository, UpdateSettingsInput};
pub use user::UserRepository;
