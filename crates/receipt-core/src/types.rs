//! # Domain Types
//!
//! Tables, rows and the small documents exchanged with the web front end.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Receipt Schema                                  │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                │
//! │  │  categories  │   │    stores    │   │     tags     │                │
//! │  │ id           │   │ id           │   │ id           │                │
//! │  │ categoryName │   │ storeName    │   │ tagName      │                │
//! │  └──────▲───────┘   └──────▲───────┘   └──────▲───────┘                │
//! │         │                  │ storeId          │ tagId                  │
//! │  ┌──────┴───────┐   ┌──────┴──────────────────┴───────┐                │
//! │  │    items     │   │            receipts              │                │
//! │  │ id, itemName │   │ id, date, total, purchaseId      │                │
//! │  │ itemTotal    │   └──────────────┬───────────────────┘                │
//! │  │ categoryId   │                  │ purchaseId                         │
//! │  └──────▲───────┘   ┌──────────────▼───────┐                            │
//! │         └───────────│  purchasesArticles   │                            │
//! │              itemid │  id, itemid          │                            │
//! │                     └──────────────────────┘                            │
//! │                                                                         │
//! │  purchaseData (view) = receipts ⋈ stores ⋈ purchasesArticles            │
//! │                        ⋈ items ⋈ categories                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows use `i64` ids even though the columns are `int`; SQL Server hands
//! back `i32` and the database layer widens.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::settings::Settings;

// =============================================================================
// Table
// =============================================================================

/// The six tables of the receipt schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tags,
    Stores,
    Categories,
    Items,
    PurchasesArticles,
    Receipts,
}

impl Table {
    /// All tables in creation order (referenced tables first).
    pub const ALL: [Table; 6] = [
        Table::Tags,
        Table::Stores,
        Table::Categories,
        Table::Items,
        Table::PurchasesArticles,
        Table::Receipts,
    ];

    /// SQL name of the table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Table::Tags => "tags",
            Table::Stores => "stores",
            Table::Categories => "categories",
            Table::Items => "items",
            Table::PurchasesArticles => "purchasesArticles",
            Table::Receipts => "receipts",
        }
    }

    /// The name column used by the generic upsert/list helpers.
    ///
    /// Only categories and stores take part in those helpers; every other
    /// table returns `None`.
    pub const fn name_column(&self) -> Option<&'static str> {
        match self {
            Table::Categories => Some("categoryName"),
            Table::Stores => Some("storeName"),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = CoreError;

    /// Parses the exact SQL table name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTable(s.to_string()))
    }
}

// =============================================================================
// Entity Rows
// =============================================================================

/// A spending category. Unique by name in practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub category_name: String,
}

/// A store. Created on first reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub store_name: String,
}

/// A free-form receipt tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub tag_name: String,
}

/// A purchased line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub item_name: String,
    /// `decimal(15,2)`
    pub item_total: Decimal,
    pub category_id: i64,
}

/// Joins a purchase event to one of its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseArticle {
    pub id: i64,
    #[serde(rename = "itemid")]
    pub item_id: i64,
}

/// A receipt header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: i64,
    pub store_id: i64,
    pub date: NaiveDate,
    pub total: Decimal,
    pub tag_id: Option<i64>,
    /// Matches `purchasesArticles.id` of every line on this receipt.
    pub purchase_id: i64,
}

/// One row of the `purchaseData` reporting view.
///
/// Field names follow the view's column aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseData {
    pub article_name: String,
    /// Always `1`; the view has no quantity column.
    pub amount: i64,
    #[ts(type = "string")]
    pub total: Decimal,
    pub category: String,
    /// The store name.
    pub location: String,
    #[ts(type = "string")]
    pub timestamp: NaiveDate,
    /// Receipt id rendered as text by the view.
    pub id: String,
}

// =============================================================================
// List Envelope
// =============================================================================

/// `{name, id}` pair returned by the list helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NamedEntry {
    pub name: String,
    pub id: i64,
}

/// `{values: [...]}` envelope around an ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NamedList {
    pub values: Vec<NamedEntry>,
}

impl NamedList {
    /// Names in list order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|entry| entry.name.as_str())
    }
}

impl From<Vec<NamedEntry>> for NamedList {
    fn from(values: Vec<NamedEntry>) -> Self {
        NamedList { values }
    }
}

// =============================================================================
// Front-end Settings
// =============================================================================

/// The settings document the web UI fetches at startup.
///
/// ## Example
/// ```json
/// {"useSSL":true,"backendIP":"192.168.1.20","backendPort":"5558",
///  "backendToken":"1a2b3c4d","language":"de"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FrontendSettings {
    #[serde(rename = "useSSL")]
    pub use_ssl: bool,

    #[serde(rename = "backendIP")]
    pub backend_ip: String,

    #[serde(rename = "backendPort")]
    pub backend_port: String,

    #[serde(rename = "backendToken")]
    pub backend_token: String,

    pub language: String,
}

impl FrontendSettings {
    /// Builds the document from the loaded settings and the API token.
    pub fn new(settings: &Settings, token: &str) -> Self {
        FrontendSettings {
            use_ssl: settings.use_ssl,
            backend_ip: settings.backend_ip.clone(),
            backend_port: settings.backend_port.clone(),
            backend_token: token.to_string(),
            language: settings.backend_language.clone(),
        }
    }
}
