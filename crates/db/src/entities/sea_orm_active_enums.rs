//! Database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a quote.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "quote_status")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Not yet sent to the customer.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Emailed to the customer.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Opened by the customer.
    #[sea_orm(string_value = "seen")]
    Seen,
    /// Converted into an invoice.
    #[sea_orm(string_value = "converted")]
    Converted,
}

/// Lifecycle of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Not yet sent.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Sent and awaiting payment.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Paid in full.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Past its due date without payment.
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Cancelled; excluded from revenue.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl QuoteStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Seen => "seen",
            Self::Converted => "converted",
        }
    }
}

impl InvoiceStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}
