//! `SeaORM` Entity for the user_settings table.
//!
//! One row per user; holds company info for document headers, defaults
//! for new documents, the PDF template choice, and the per-year document
//! number counters.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub company_name: String,
    pub company_address_line1: Option<String>,
    pub company_address_line2: Option<String>,
    pub company_city: Option<String>,
    pub company_postal_code: Option<String>,
    pub company_country: Option<String>,
    pub company_email: Option<String>,
    pub tax_id: Option<String>,
    pub logo_url: Option<String>,
    pub default_currency: String,
    pub default_tax_rate: Decimal,
    pub default_payment_terms_days: i32,
    pub pdf_template: String,
    pub quote_counter: i32,
    pub invoice_counter: i32,
    pub counter_year: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
