//! Commission record types and the payability vocabulary.

use crate::domain::{CouponCode, EmailAddress, Money, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::partner::ParseEnumError;

/// Commission lifecycle status.
///
/// `pending` is the creation state; the webhook layer moves payable
/// commissions to `approved`, payouts move them to `paid`, refund handling
/// to `refunded`, and the rule chain to `blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Refunded,
    Blocked,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Refunded => "refunded",
            CommissionStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for CommissionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommissionStatus::Pending),
            "approved" => Ok(CommissionStatus::Approved),
            "paid" => Ok(CommissionStatus::Paid),
            "refunded" => Ok(CommissionStatus::Refunded),
            "blocked" => Ok(CommissionStatus::Blocked),
            other => Err(ParseEnumError {
                kind: "commission status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a commission is currently blocked. Exactly one reason is surfaced
/// even when several rules would fail; the canonical strings below are what
/// operators see and what is persisted on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockReason {
    NewCustomersOnly,
    CouponValueNotUsed,
    OutsideCommissionPeriod,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::NewCustomersOnly => "new customers only",
            BlockReason::CouponValueNotUsed => "coupon value not fully used",
            BlockReason::OutsideCommissionPeriod => "outside commission period",
        }
    }
}

/// Error parsing a stored block reason.
#[derive(Debug, Error)]
#[error("unknown block reason: {0}")]
pub struct ParseBlockReasonError(String);

impl FromStr for BlockReason {
    type Err = ParseBlockReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new customers only" => Ok(BlockReason::NewCustomersOnly),
            "coupon value not fully used" => Ok(BlockReason::CouponValueNotUsed),
            "outside commission period" => Ok(BlockReason::OutsideCommissionPeriod),
            other => Err(ParseBlockReasonError(other.to_string())),
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One commission record per conversion event.
///
/// `rate`, `is_new_customer`, and `customer_first_order_date` are snapshots
/// taken at creation; later partner edits never alter them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: i64,
    pub partner_id: i64,
    pub order_id: OrderId,
    pub customer_email: EmailAddress,
    pub order_value: Money,
    pub amount: Money,
    pub rate: Money,
    pub coupon_code: Option<CouponCode>,
    pub coupon_discount: Money,
    pub status: CommissionStatus,
    pub block_reason: Option<BlockReason>,
    pub is_new_customer: bool,
    pub customer_first_order_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub coupon_value_used: Money,
    pub coupon_value_required: Money,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a commission. Status always starts `pending`; the id
/// is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewCommission {
    pub partner_id: i64,
    pub order_id: OrderId,
    pub customer_email: EmailAddress,
    pub order_value: Money,
    pub amount: Money,
    pub rate: Money,
    pub coupon_code: Option<CouponCode>,
    pub coupon_discount: Money,
    pub is_new_customer: bool,
    pub customer_first_order_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub coupon_value_used: Money,
    pub coupon_value_required: Money,
    pub created_at: DateTime<Utc>,
}
