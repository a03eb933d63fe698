//! Partner value types: status, commission configuration, payout policy.

use crate::domain::{Money, ReferralCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a stored enum token.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Partner lifecycle status. Only `active` partners earn trackable
/// commissions; `pending` partners await admin approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Active,
    Pending,
    Inactive,
}

impl PartnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Active => "active",
            PartnerStatus::Pending => "pending",
            PartnerStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for PartnerStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PartnerStatus::Active),
            "pending" => Ok(PartnerStatus::Pending),
            "inactive" => Ok(PartnerStatus::Inactive),
            other => Err(ParseEnumError {
                kind: "partner status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a partner's commission is computed from an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionKind {
    /// Rate is a percentage of the order value.
    Percentage,
    /// Rate is a flat amount per conversion, order value ignored.
    Fixed,
}

impl CommissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionKind::Percentage => "percentage",
            CommissionKind::Fixed => "fixed",
        }
    }
}

impl FromStr for CommissionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(CommissionKind::Percentage),
            "fixed" => Ok(CommissionKind::Fixed),
            other => Err(ParseEnumError {
                kind: "commission kind",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CommissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The policy values that parameterize the payout rule chain.
///
/// Immutable once loaded; the evaluator reads it by reference and never
/// writes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPolicy {
    /// Commission is only paid for a customer's first-ever recorded order.
    pub new_customers_only: bool,
    /// Months after creation during which the commission stays payable.
    pub commission_period_months: u32,
    /// Commission stays blocked until the coupon discount is fully redeemed.
    pub require_coupon_usage: bool,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        PayoutPolicy {
            new_customers_only: false,
            commission_period_months: 12,
            require_coupon_usage: false,
        }
    }
}

/// A referring partner with its commission configuration and running
/// aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub referral_code: ReferralCode,
    pub status: PartnerStatus,
    pub commission_rate: Money,
    pub commission_kind: CommissionKind,
    pub policy: PayoutPolicy,
    pub click_count: i64,
    pub conversion_count: i64,
    pub total_revenue: Money,
    pub total_commissions: Money,
    pub created_at: DateTime<Utc>,
}

impl Partner {
    /// Only active partners may accumulate commissions.
    pub fn is_active(&self) -> bool {
        self.status == PartnerStatus::Active
    }
}

/// Fields required to create a partner row; aggregates start at zero and the
/// id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewPartner {
    pub name: String,
    pub email: String,
    pub referral_code: ReferralCode,
    pub status: PartnerStatus,
    pub commission_rate: Money,
    pub commission_kind: CommissionKind,
    pub policy: PayoutPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_status_round_trip() {
        for status in [
            PartnerStatus::Active,
            PartnerStatus::Pending,
            PartnerStatus::Inactive,
        ] {
            let parsed = PartnerStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_commission_kind_rejects_unknown() {
        let err = CommissionKind::from_str("tiered").unwrap_err();
        assert!(err.to_string().contains("tiered"));
    }

    #[test]
    fn test_commission_kind_round_trip() {
        assert_eq!(
            CommissionKind::from_str("percentage").unwrap(),
            CommissionKind::Percentage
        );
        assert_eq!(CommissionKind::from_str("fixed").unwrap(), CommissionKind::Fixed);
    }

    #[test]
    fn test_policy_default_period_is_twelve_months() {
        let policy = PayoutPolicy::default();
        assert_eq!(policy.commission_period_months, 12);
        assert!(!policy.new_customers_only);
        assert!(!policy.require_coupon_usage);
    }

    #[test]
    fn test_partner_status_serializes_lowercase() {
        let json = serde_json::to_string(&PartnerStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }
}
