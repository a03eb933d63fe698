//! Partner-scoped coupon codes and discount computation.

use crate::domain::{CouponCode, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::partner::ParseEnumError;

/// How a coupon discounts an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Value is a percentage of the order value.
    Percentage,
    /// Value is a flat amount.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            other => Err(ParseEnumError {
                kind: "discount kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Coupon availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Inactive,
    Expired,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "active",
            CouponStatus::Inactive => "inactive",
            CouponStatus::Expired => "expired",
        }
    }
}

impl FromStr for CouponStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CouponStatus::Active),
            "inactive" => Ok(CouponStatus::Inactive),
            "expired" => Ok(CouponStatus::Expired),
            other => Err(ParseEnumError {
                kind: "coupon status",
                value: other.to_string(),
            }),
        }
    }
}

/// A discount code owned by a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    pub partner_id: i64,
    pub code: CouponCode,
    pub discount_kind: DiscountKind,
    pub discount_value: Money,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub status: CouponStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// The discount this coupon grants on an order of the given value.
    pub fn discount_for(&self, order_value: Money) -> Money {
        match self.discount_kind {
            DiscountKind::Percentage => order_value * self.discount_value / Money::hundred(),
            DiscountKind::Fixed => self.discount_value,
        }
    }

    /// Whether the coupon can still be redeemed at the given instant:
    /// active status, not past its expiry, and under its usage limit.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        if self.status != CouponStatus::Active {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return false;
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return false;
            }
        }
        true
    }
}

/// Fields for inserting a coupon; usage count starts at zero.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub partner_id: i64,
    pub code: CouponCode,
    pub discount_kind: DiscountKind,
    pub discount_value: Money,
    pub usage_limit: Option<i64>,
    pub status: CouponStatus,
    pub expires_at: Option<DateTime<Utc>>,
}
