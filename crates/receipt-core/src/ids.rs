//! Row id synthesis.
//!
//! The schema declares `id int` primary keys without autoincrement, so new
//! rows get an id picked by the application. Ids are drawn uniformly from
//! `1..=i32::MAX` using the random bits of a UUID v4; the database layer
//! retries on a primary-key collision.

use uuid::Uuid;

/// Largest id that fits the `int` primary key columns.
pub const MAX_ROW_ID: i64 = i32::MAX as i64;

/// Returns a fresh random row id in `1..=MAX_ROW_ID`.
pub fn new_row_id() -> i64 {
    let bits = Uuid::new_v4().as_u128();
    (bits % MAX_ROW_ID as u128) as i64 + 1
}
