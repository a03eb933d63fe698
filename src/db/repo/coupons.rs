//! Coupon rows and usage counting.

use super::{datetime_from_millis, parse_money_col, Repository};
use crate::domain::{Coupon, CouponCode, CouponStatus, DiscountKind, NewCoupon};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

fn map_coupon_row(row: &SqliteRow) -> Coupon {
    let code: String = row.get("code");

    let kind_str: String = row.get("discount_kind");
    let discount_kind = DiscountKind::from_str(&kind_str).unwrap_or_else(|e| {
        warn!(code = %code, error = %e, "Unknown discount kind in database, treating as fixed");
        DiscountKind::Fixed
    });

    let status_str: String = row.get("status");
    let status = CouponStatus::from_str(&status_str).unwrap_or_else(|e| {
        warn!(code = %code, error = %e, "Unknown coupon status in database, treating as inactive");
        CouponStatus::Inactive
    });

    let value_str: String = row.get("discount_value");

    Coupon {
        id: row.get("id"),
        partner_id: row.get("partner_id"),
        discount_kind,
        discount_value: parse_money_col(&value_str, "discount_value", &code),
        usage_limit: row.get("usage_limit"),
        usage_count: row.get("usage_count"),
        status,
        expires_at: row
            .get::<Option<i64>, _>("expires_at")
            .map(datetime_from_millis),
        created_at: datetime_from_millis(row.get("created_at")),
        code: CouponCode::new(code),
    }
}

impl Repository {
    /// Insert a coupon and return the stored row.
    pub async fn create_coupon(&self, coupon: &NewCoupon) -> Result<Coupon, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO coupons
                (partner_id, code, discount_kind, discount_value, usage_limit,
                 status, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(coupon.partner_id)
        .bind(coupon.code.as_str())
        .bind(coupon.discount_kind.as_str())
        .bind(coupon.discount_value.to_canonical_string())
        .bind(coupon.usage_limit)
        .bind(coupon.status.as_str())
        .bind(coupon.expires_at.map(|t| t.timestamp_millis()))
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        self.get_coupon_by_code(&coupon.code)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Fetch a coupon by its unique code.
    pub async fn get_coupon_by_code(
        &self,
        code: &CouponCode,
    ) -> Result<Option<Coupon>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM coupons WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_coupon_row))
    }

    /// Count one redemption against a coupon.
    pub async fn increment_coupon_usage(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE coupons SET usage_count = usage_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
