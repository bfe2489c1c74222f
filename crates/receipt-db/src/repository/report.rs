//! Reads the denormalized `purchaseData` view.
//!
//! Every purchased article becomes one row with `amount` fixed at 1, joined
//! to its receipt, store and category.

use std::sync::Arc;

use receipt_core::PurchaseData;
use tracing::debug;

use super::finish;
use crate::backend::{Backend, ColumnKind, Row};
use crate::error::DbResult;

const PURCHASE_DATA_SQL: &str = "SELECT article_name, amount, total, category, location, timestamp, id \
                                 FROM purchaseData ORDER BY timestamp, id";

const PURCHASE_DATA_COLUMNS: [ColumnKind; 7] = [
    ColumnKind::Text,
    ColumnKind::Int,
    ColumnKind::Decimal,
    ColumnKind::Text,
    ColumnKind::Text,
    ColumnKind::Date,
    ColumnKind::Text,
];

#[derive(Debug, Clone)]
pub struct PurchaseReportRepository {
    backend: Arc<dyn Backend>,
}

impl PurchaseReportRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        PurchaseReportRepository { backend }
    }

    /// All purchase rows, oldest receipt first.
    pub async fn purchase_data(&self) -> DbResult<Vec<PurchaseData>> {
        let mut session = self.backend.open().await?;
        let result = session
            .fetch(PURCHASE_DATA_SQL, &[], &PURCHASE_DATA_COLUMNS)
            .await;
        let rows = finish(session, result).await?;

        debug!(count = rows.len(), "Loaded purchase data");
        rows.iter().map(purchase_from_row).collect()
    }
}

fn purchase_from_row(row: &Row) -> DbResult<PurchaseData> {
    Ok(PurchaseData {
        article_name: row.text(0)?,
        amount: row.int(1)?,
        total: row.decimal(2)?,
        category: row.text(3)?,
        location: row.text(4)?,
        timestamp: row.date(5)?,
        id: row.text(6)?,
    })
}
