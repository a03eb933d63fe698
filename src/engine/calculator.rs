//! Commission amount calculation.

use crate::domain::{CommissionKind, Money};

/// Compute the commission owed for an order.
///
/// Percentage partners earn `order_value * rate / 100`; fixed partners earn
/// the rate as a flat amount regardless of order value. The order value is
/// the gross amount before any coupon discount.
pub fn commission_amount(order_value: Money, rate: Money, kind: CommissionKind) -> Money {
    match kind {
        CommissionKind::Percentage => order_value * rate / Money::hundred(),
        CommissionKind::Fixed => rate,
    }
}
