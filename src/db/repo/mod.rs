//! Repository layer for database operations.
//!
//! `Repository` implements the `Store` trait over a SQLite pool. Methods are
//! organized across submodules by domain:
//! - `partners.rs` - partner rows, aggregates, clicks, cascade delete
//! - `customers.rs` - customer history ledger
//! - `commissions.rs` - commission rows and status transitions
//! - `coupons.rs` - coupon rows and usage counting

mod commissions;
mod coupons;
mod customers;
mod partners;

use crate::db::Store;
use crate::domain::{
    BlockReason, Click, Commission, CommissionStatus, Coupon, CouponCode, CustomerHistory,
    EmailAddress, Money, NewCommission, NewCoupon, NewPartner, OrderId, Partner, ReferralCode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// SQLite-backed implementation of the persistence interface.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Parse a stored money column, warning and defaulting to zero on corrupt
/// data rather than failing the whole query.
pub(crate) fn parse_money_col(value: &str, column: &'static str, key: &str) -> Money {
    Money::from_str(value).unwrap_or_else(|e| {
        warn!(column, key = %key, value = %value, error = %e, "Failed to parse money column, using default");
        Money::default()
    })
}

/// Stored epoch milliseconds back to a UTC timestamp.
pub(crate) fn datetime_from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

#[async_trait]
impl Store for Repository {
    async fn create_partner(&self, partner: &NewPartner) -> Result<Partner, sqlx::Error> {
        Repository::create_partner(self, partner).await
    }

    async fn get_partner(&self, id: i64) -> Result<Option<Partner>, sqlx::Error> {
        Repository::get_partner(self, id).await
    }

    async fn get_partner_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Partner>, sqlx::Error> {
        Repository::get_partner_by_referral_code(self, code).await
    }

    async fn update_partner_rate(&self, id: i64, rate: Money) -> Result<(), sqlx::Error> {
        Repository::update_partner_rate(self, id, rate).await
    }

    async fn record_conversion_stats(
        &self,
        partner_id: i64,
        order_value: Money,
        commission: Money,
    ) -> Result<(), sqlx::Error> {
        Repository::record_conversion_stats(self, partner_id, order_value, commission).await
    }

    async fn record_click(
        &self,
        partner_id: i64,
        ip_address: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Click, sqlx::Error> {
        Repository::record_click(self, partner_id, ip_address, user_agent, referrer, at).await
    }

    async fn list_clicks(&self, partner_id: i64) -> Result<Vec<Click>, sqlx::Error> {
        Repository::list_clicks(self, partner_id).await
    }

    async fn delete_partner(&self, id: i64) -> Result<bool, sqlx::Error> {
        Repository::delete_partner(self, id).await
    }

    async fn find_customer_history(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<CustomerHistory>, sqlx::Error> {
        Repository::find_customer_history(self, email).await
    }

    async fn record_customer_order(
        &self,
        email: &EmailAddress,
        order_id: &OrderId,
        partner_id: i64,
        order_value: Money,
        at: DateTime<Utc>,
    ) -> Result<CustomerHistory, sqlx::Error> {
        Repository::record_customer_order(self, email, order_id, partner_id, order_value, at).await
    }

    async fn insert_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Commission, sqlx::Error> {
        Repository::insert_commission(self, commission).await
    }

    async fn get_commission(&self, id: i64) -> Result<Option<Commission>, sqlx::Error> {
        Repository::get_commission(self, id).await
    }

    async fn latest_commission_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Commission>, sqlx::Error> {
        Repository::latest_commission_for_order(self, order_id).await
    }

    async fn update_commission_status(
        &self,
        id: i64,
        status: CommissionStatus,
        reason: Option<BlockReason>,
    ) -> Result<(), sqlx::Error> {
        Repository::update_commission_status(self, id, status, reason).await
    }

    async fn add_coupon_value_used(
        &self,
        id: i64,
        amount: Money,
    ) -> Result<Commission, sqlx::Error> {
        Repository::add_coupon_value_used(self, id, amount).await
    }

    async fn create_coupon(&self, coupon: &NewCoupon) -> Result<Coupon, sqlx::Error> {
        Repository::create_coupon(self, coupon).await
    }

    async fn get_coupon_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, sqlx::Error> {
        Repository::get_coupon_by_code(self, code).await
    }

    async fn increment_coupon_usage(&self, id: i64) -> Result<(), sqlx::Error> {
        Repository::increment_coupon_usage(self, id).await
    }
}
