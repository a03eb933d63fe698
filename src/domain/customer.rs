//! Customer history ledger row: one record per distinct customer email.

use crate::domain::{EmailAddress, Money, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cross-partner order history for one customer email.
///
/// Existence of a row means the email is NOT a new customer on subsequent
/// orders, regardless of which partner referred them. The first-order fields
/// never change after creation; the running totals grow with every recorded
/// conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub id: i64,
    pub customer_email: EmailAddress,
    pub first_order_date: DateTime<Utc>,
    pub first_order_id: OrderId,
    pub first_partner_id: i64,
    pub total_orders: i64,
    pub total_spent: Money,
    pub last_order_date: DateTime<Utc>,
}
