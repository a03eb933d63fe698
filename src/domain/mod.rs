//! Domain types for the affiliate commission engine.
//!
//! This module provides:
//! - Lossless monetary amounts via the Money wrapper
//! - Domain primitives: EmailAddress, ReferralCode, CouponCode, OrderId
//! - Partner, Commission, Coupon, CustomerHistory, Click value types
//! - Status and block-reason vocabularies with canonical string forms

pub mod click;
pub mod commission;
pub mod coupon;
pub mod customer;
pub mod money;
pub mod partner;
pub mod primitives;

pub use click::Click;
pub use commission::{BlockReason, Commission, CommissionStatus, NewCommission};
pub use coupon::{Coupon, CouponStatus, DiscountKind, NewCoupon};
pub use customer::CustomerHistory;
pub use money::Money;
pub use partner::{
    CommissionKind, NewPartner, ParseEnumError, Partner, PartnerStatus, PayoutPolicy,
};
pub use primitives::{CouponCode, EmailAddress, EmailParseError, OrderId, ReferralCode};
