//! Storage module: the persistence interface and its SQLite implementation.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The `Store` trait the engine and handlers program against
//! - The `Repository` implementation over sqlx/SQLite

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;

use crate::domain::{
    BlockReason, Click, Commission, CommissionStatus, Coupon, CouponCode, CustomerHistory,
    EmailAddress, Money, NewCommission, NewCoupon, NewPartner, OrderId, Partner, ReferralCode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence interface consumed by the commission engine and the webhook
/// handlers.
///
/// One implementation exists (`Repository` over SQLite); the trait keeps the
/// decision logic independent of the backend and spells out exactly which
/// storage operations the core is allowed to perform.
#[async_trait]
pub trait Store: Send + Sync {
    // Partners

    /// Insert a partner with zeroed aggregates; returns the stored row.
    async fn create_partner(&self, partner: &NewPartner) -> Result<Partner, sqlx::Error>;

    /// Fetch a partner by id.
    async fn get_partner(&self, id: i64) -> Result<Option<Partner>, sqlx::Error>;

    /// Fetch a partner by its unique referral code.
    async fn get_partner_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Partner>, sqlx::Error>;

    /// Change a partner's commission rate. Existing commissions keep their
    /// snapshotted rate.
    async fn update_partner_rate(&self, id: i64, rate: Money) -> Result<(), sqlx::Error>;

    /// Apply one conversion to the partner aggregates: `conversion_count`
    /// increments SQL-side, the money totals grow by the given amounts.
    async fn record_conversion_stats(
        &self,
        partner_id: i64,
        order_value: Money,
        commission: Money,
    ) -> Result<(), sqlx::Error>;

    /// Record a referral-link click and bump `click_count`.
    async fn record_click(
        &self,
        partner_id: i64,
        ip_address: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Click, sqlx::Error>;

    /// Clicks for a partner, newest first.
    async fn list_clicks(&self, partner_id: i64) -> Result<Vec<Click>, sqlx::Error>;

    /// Delete a partner and cascade to its commissions, coupons, and clicks
    /// in one transaction. Returns false if the partner did not exist.
    async fn delete_partner(&self, id: i64) -> Result<bool, sqlx::Error>;

    // Customer history

    /// Side-effect-free lookup by normalized email.
    async fn find_customer_history(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<CustomerHistory>, sqlx::Error>;

    /// Record one order against the email's history: creates the row on the
    /// first-ever order, otherwise increments the running totals. Serialized
    /// per email via the UNIQUE constraint plus a transaction.
    async fn record_customer_order(
        &self,
        email: &EmailAddress,
        order_id: &OrderId,
        partner_id: i64,
        order_value: Money,
        at: DateTime<Utc>,
    ) -> Result<CustomerHistory, sqlx::Error>;

    // Commissions

    /// Insert a commission with status `pending`; returns the stored row.
    async fn insert_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Commission, sqlx::Error>;

    /// Fetch a commission by id.
    async fn get_commission(&self, id: i64) -> Result<Option<Commission>, sqlx::Error>;

    /// Most recently created commission for an order id, if any.
    async fn latest_commission_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Commission>, sqlx::Error>;

    /// Set status and persisted block reason (cleared when `None`).
    async fn update_commission_status(
        &self,
        id: i64,
        status: CommissionStatus,
        reason: Option<BlockReason>,
    ) -> Result<(), sqlx::Error>;

    /// Add a redemption amount to `coupon_value_used`; returns the updated
    /// row.
    async fn add_coupon_value_used(
        &self,
        id: i64,
        amount: Money,
    ) -> Result<Commission, sqlx::Error>;

    // Coupons

    /// Insert a coupon with zero usage; returns the stored row.
    async fn create_coupon(&self, coupon: &NewCoupon) -> Result<Coupon, sqlx::Error>;

    /// Fetch a coupon by its unique code.
    async fn get_coupon_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, sqlx::Error>;

    /// SQL-side `usage_count` increment for one tracked redemption.
    async fn increment_coupon_usage(&self, id: i64) -> Result<(), sqlx::Error>;
}
