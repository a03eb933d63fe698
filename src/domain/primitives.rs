//! Domain primitives: EmailAddress, ReferralCode, CouponCode, OrderId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Customer email, normalized to lowercase with surrounding whitespace
/// removed. Customer history is keyed on this, so "Ana@X.com" and
/// "ana@x.com" must resolve to the same ledger row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

/// Error parsing an email address.
#[derive(Debug, Error)]
#[error("invalid email address: {0}")]
pub struct EmailParseError(String);

impl EmailAddress {
    /// Get the normalized email as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a value read back from storage. Rows are written through
    /// [`EmailAddress::from_str`], so stored values are already normalized.
    pub(crate) fn from_stored(value: String) -> Self {
        EmailAddress(value)
    }
}

impl FromStr for EmailAddress {
    type Err = EmailParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        // Minimal shape check; full RFC validation belongs upstream.
        match normalized.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(EmailAddress(normalized))
            }
            _ => Err(EmailParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique token identifying a partner in tracking links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferralCode(pub String);

impl ReferralCode {
    /// Create a ReferralCode from a string.
    pub fn new(code: String) -> Self {
        ReferralCode(code)
    }

    /// Get the code as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partner-scoped discount code carried on a conversion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CouponCode(pub String);

impl CouponCode {
    /// Create a CouponCode from a string.
    pub fn new(code: String) -> Self {
        CouponCode(code)
    }

    /// Get the code as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External order identifier, unique per conversion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    /// Create an OrderId from a string.
    pub fn new(id: String) -> Self {
        OrderId(id)
    }

    /// Get the order id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
