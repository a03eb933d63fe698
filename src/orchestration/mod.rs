//! Orchestration: multi-step write paths over the store.
//!
//! This module provides:
//! - Conversion processing (commission creation and rule evaluation)
//! - Coupon usage tracking (redemption reports and re-evaluation)

pub mod processor;
pub mod redemption;

pub use processor::{
    CommissionProcessor, ConversionEvent, ConversionOutcome, ProcessError, ProcessedConversion,
};
pub use redemption::{CouponUsageTracker, RedemptionError, RedemptionResult};
